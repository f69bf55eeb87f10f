use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::RgbImage;

use crate::capture::domain::camera::{Camera, CameraConstraints, CameraError};
use crate::capture::domain::video_source::{ReadyState, VideoSource};
use crate::shared::frame::Frame;

/// Where a [`StillImageCamera`] gets its picture from.
enum StillImage {
    File(PathBuf),
    Memory(Arc<RgbImage>),
}

/// Serves a single image as an endlessly repeating live stream.
///
/// Stands in for a webcam on machines without one and in tests. The file is
/// decoded on each access request, so a missing or unreadable file behaves
/// like an unavailable camera.
pub struct StillImageCamera {
    image: StillImage,
    displayed_size: Option<(u32, u32)>,
}

impl StillImageCamera {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            image: StillImage::File(path.into()),
            displayed_size: None,
        }
    }

    pub fn from_image(image: RgbImage) -> Self {
        Self {
            image: StillImage::Memory(Arc::new(image)),
            displayed_size: None,
        }
    }

    /// On-screen size reported by granted sources. Defaults to native size.
    pub fn with_displayed_size(mut self, width: u32, height: u32) -> Self {
        self.displayed_size = Some((width, height));
        self
    }

    fn load(&self) -> Result<Arc<RgbImage>, CameraError> {
        match &self.image {
            StillImage::Memory(image) => Ok(image.clone()),
            StillImage::File(path) => load_file(path).map(Arc::new),
        }
    }
}

fn load_file(path: &Path) -> Result<RgbImage, CameraError> {
    if !path.exists() {
        return Err(CameraError::NotFound(path.display().to_string()));
    }
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| CameraError::Unavailable(format!("{}: {e}", path.display())))
}

#[async_trait]
impl Camera for StillImageCamera {
    async fn request_access(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Arc<dyn VideoSource>, CameraError> {
        let image = self.load()?;
        if image.width() == 0 || image.height() == 0 {
            return Err(CameraError::Unavailable("image has no pixels".into()));
        }
        log::debug!(
            "Serving {}x{} still image (requested {}x{} {:?})",
            image.width(),
            image.height(),
            constraints.width,
            constraints.height,
            constraints.facing
        );
        let displayed = self.displayed_size.unwrap_or(image.dimensions());
        Ok(Arc::new(StillImageSource::new(image, displayed)))
    }
}

/// Live source produced by [`StillImageCamera`].
pub struct StillImageSource {
    image: Arc<RgbImage>,
    displayed_size: Mutex<(u32, u32)>,
    live: AtomicBool,
    next_index: AtomicUsize,
}

impl StillImageSource {
    pub fn new(image: Arc<RgbImage>, displayed_size: (u32, u32)) -> Self {
        Self {
            image,
            displayed_size: Mutex::new(displayed_size),
            live: AtomicBool::new(true),
            next_index: AtomicUsize::new(0),
        }
    }

    /// Simulates a layout change of the element showing the video.
    pub fn set_displayed_size(&self, width: u32, height: u32) {
        if let Ok(mut size) = self.displayed_size.lock() {
            *size = (width, height);
        }
    }
}

impl VideoSource for StillImageSource {
    fn ready_state(&self) -> ReadyState {
        if self.is_live() {
            ReadyState::HaveEnoughData
        } else {
            ReadyState::HaveNothing
        }
    }

    fn native_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn displayed_size(&self) -> (u32, u32) {
        if !self.is_live() {
            return (0, 0);
        }
        self.displayed_size.lock().map(|s| *s).unwrap_or((0, 0))
    }

    fn current_frame(&self) -> Option<Frame> {
        if !self.is_live() {
            return None;
        }
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        Some(Frame::from_rgb_image((*self.image).clone(), index))
    }

    fn stop(&self) {
        self.live.store(false, Ordering::Release);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb([40, 80, 120]))
    }

    #[tokio::test]
    async fn test_memory_image_is_served_at_native_size() {
        let camera = StillImageCamera::from_image(image(32, 16));
        let source = camera
            .request_access(&CameraConstraints::default())
            .await
            .unwrap();

        assert_eq!(source.native_size(), (32, 16));
        assert_eq!(source.displayed_size(), (32, 16));
        assert!(source.ready_state().is_sampleable());
        let frame = source.current_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 16));
    }

    #[tokio::test]
    async fn test_displayed_size_is_independent_of_native() {
        let camera = StillImageCamera::from_image(image(32, 16)).with_displayed_size(640, 320);
        let source = camera
            .request_access(&CameraConstraints::default())
            .await
            .unwrap();

        assert_eq!(source.native_size(), (32, 16));
        assert_eq!(source.displayed_size(), (640, 320));
    }

    #[tokio::test]
    async fn test_frame_indices_advance() {
        let camera = StillImageCamera::from_image(image(4, 4));
        let source = camera
            .request_access(&CameraConstraints::default())
            .await
            .unwrap();

        assert_eq!(source.current_frame().unwrap().index(), 0);
        assert_eq!(source.current_frame().unwrap().index(), 1);
    }

    #[tokio::test]
    async fn test_stopped_source_yields_nothing() {
        let camera = StillImageCamera::from_image(image(4, 4));
        let source = camera
            .request_access(&CameraConstraints::default())
            .await
            .unwrap();

        source.stop();
        source.stop();

        assert!(!source.is_live());
        assert_eq!(source.ready_state(), ReadyState::HaveNothing);
        assert!(source.current_frame().is_none());
        assert_eq!(source.displayed_size(), (0, 0));
    }

    #[tokio::test]
    async fn test_loads_image_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("face.png");
        image(10, 6).save(&path).unwrap();

        let camera = StillImageCamera::from_path(&path);
        let source = camera
            .request_access(&CameraConstraints::default())
            .await
            .unwrap();

        assert_eq!(source.native_size(), (10, 6));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let camera = StillImageCamera::from_path("/definitely/not/here.png");
        let result = camera.request_access(&CameraConstraints::default()).await;
        assert!(matches!(result, Err(CameraError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let camera = StillImageCamera::from_path(&path);
        let result = camera.request_access(&CameraConstraints::default()).await;
        assert!(matches!(result, Err(CameraError::Unavailable(_))));
    }

    #[test]
    fn test_resize_is_visible_to_pollers() {
        let source = StillImageSource::new(Arc::new(image(4, 4)), (100, 50));
        source.set_displayed_size(200, 100);
        assert_eq!(source.displayed_size(), (200, 100));
    }
}
