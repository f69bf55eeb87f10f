use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::capture::domain::camera::{Camera, CameraConstraints};
use crate::capture::domain::video_source::VideoSource;
use crate::session::detection_loop::DetectionLoop;
use crate::session::session_store::{SessionState, SessionStore};
use crate::shared::constants::{
    ERROR_CAMERA_DENIED, STATUS_CAMERA_ACTIVE, STATUS_CAMERA_DENIED, STATUS_REQUESTING_CAMERA,
    STATUS_STOPPED,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ties the camera's lifecycle to the detection loop.
///
/// Turning on acquires the camera and then starts the loop; turning off
/// stops the loop and then releases the camera. The store is reset whenever
/// the camera goes away, so a restarted session never shows results from
/// the previous one.
pub struct SessionController {
    camera: Arc<dyn Camera>,
    constraints: CameraConstraints,
    store: Arc<SessionStore>,
    detection_loop: DetectionLoop,
    source: Mutex<Option<Arc<dyn VideoSource>>>,
}

impl SessionController {
    /// `detection_loop` must write to the same `store`.
    pub fn new(
        camera: Arc<dyn Camera>,
        store: Arc<SessionStore>,
        detection_loop: DetectionLoop,
    ) -> Self {
        Self {
            camera,
            constraints: CameraConstraints::default(),
            store,
            detection_loop,
            source: Mutex::new(None),
        }
    }

    pub fn with_constraints(mut self, constraints: CameraConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn snapshot(&self) -> SessionState {
        self.store.snapshot()
    }

    pub fn is_camera_on(&self) -> bool {
        self.store.snapshot().camera_on
    }

    pub fn is_detecting_scheduled(&self) -> bool {
        self.detection_loop.is_running()
    }

    /// The granted video source while the camera is on.
    pub fn video_source(&self) -> Option<Arc<dyn VideoSource>> {
        lock(&self.source).clone()
    }

    /// Start/stop button. Returns whether the camera is on afterwards.
    pub async fn toggle(&self) -> bool {
        if self.is_camera_on() {
            self.detection_loop.stop();
            self.stop_camera();
            self.store.set_status(STATUS_STOPPED);
            return false;
        }

        match self.start_camera().await {
            Some(source) => {
                self.detection_loop.start(source);
                true
            }
            None => false,
        }
    }

    /// Best-effort shutdown: stop the loop, then release the camera. Each
    /// step runs even if the one before it panicked.
    pub fn teardown(&self) {
        if let Err(e) = panic::catch_unwind(AssertUnwindSafe(|| self.detection_loop.stop())) {
            log::warn!("Stopping detection loop failed during teardown: {e:?}");
        }
        if let Err(e) = panic::catch_unwind(AssertUnwindSafe(|| self.stop_camera())) {
            log::warn!("Releasing camera failed during teardown: {e:?}");
        }
    }

    async fn start_camera(&self) -> Option<Arc<dyn VideoSource>> {
        self.store.set_error(None);
        self.store.set_status(STATUS_REQUESTING_CAMERA);

        match self.camera.request_access(&self.constraints).await {
            Ok(source) => {
                *lock(&self.source) = Some(source.clone());
                self.store.set_camera_on(true);
                self.store.set_status(STATUS_CAMERA_ACTIVE);
                log::info!("Camera activated");
                Some(source)
            }
            Err(e) => {
                log::error!("Error accessing camera: {e}");
                self.store.set_error(Some(ERROR_CAMERA_DENIED));
                self.store.set_status(STATUS_CAMERA_DENIED);
                self.store.set_camera_on(false);
                None
            }
        }
    }

    /// Releases the stream and resets the session. The reset happens even
    /// if stopping the stream panics.
    fn stop_camera(&self) {
        let source = lock(&self.source).take();
        if let Some(source) = source {
            match panic::catch_unwind(AssertUnwindSafe(|| source.stop())) {
                Ok(()) => log::info!("Camera released"),
                Err(e) => log::warn!("Stopping camera stream failed: {e:?}"),
            }
        }
        self.store.reset();
    }
}
