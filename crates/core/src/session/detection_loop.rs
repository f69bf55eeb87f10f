use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::capture::domain::frame_sampler::{CaptureError, FrameSampler};
use crate::capture::domain::video_source::VideoSource;
use crate::detection::domain::detection_client::DetectionClient;
use crate::session::session_store::{CycleOutcome, SessionStore};
use crate::shared::constants::{DETECTION_INTERVAL, MIN_INTERVAL};
use crate::shared::face_detection::DetectionResultSet;

/// Periodically samples the video source and runs detection on it.
///
/// `start` runs one cycle right away and then one every `interval`, counted
/// from cycle start. Each cycle is its own task: a slow remote call never
/// delays the schedule, so cycles can overlap. `stop` cancels the schedule
/// only; cycles already in flight run to completion, and the store drops
/// whatever they produce.
pub struct DetectionLoop {
    store: Arc<SessionStore>,
    sampler: Arc<dyn FrameSampler>,
    client: Arc<dyn DetectionClient>,
    interval: Duration,
    schedule: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
struct CycleContext {
    store: Arc<SessionStore>,
    sampler: Arc<dyn FrameSampler>,
    client: Arc<dyn DetectionClient>,
    source: Arc<dyn VideoSource>,
    generation: u64,
}

impl DetectionLoop {
    pub fn new(
        store: Arc<SessionStore>,
        sampler: Arc<dyn FrameSampler>,
        client: Arc<dyn DetectionClient>,
    ) -> Self {
        Self {
            store,
            sampler,
            client,
            interval: DETECTION_INTERVAL,
            schedule: Mutex::new(None),
        }
    }

    /// Sets the cycle period, raised to [`MIN_INTERVAL`] if shorter.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.schedule
            .lock()
            .map(|s| s.is_some())
            .unwrap_or(false)
    }

    /// Starts the schedule. Returns `false` (and does nothing) if it is
    /// already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, source: Arc<dyn VideoSource>) -> bool {
        let mut schedule = match self.schedule.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if schedule.is_some() {
            return false;
        }

        let ctx = CycleContext {
            store: self.store.clone(),
            sampler: self.sampler.clone(),
            client: self.client.clone(),
            source,
            generation: self.store.begin_generation(),
        };
        let interval = self.interval;
        log::info!("Detection loop started (every {} ms)", interval.as_millis());

        spawn_cycle(ctx.clone());
        *schedule = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                spawn_cycle(ctx.clone());
            }
        }));
        true
    }

    /// Cancels future cycles and clears the `detecting` flag. The last
    /// result set stays visible.
    pub fn stop(&self) {
        let handle = match self.schedule.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
            log::info!("Detection loop stopped");
        }
        self.store.end_generation();
        self.store.set_detecting(false);
    }
}

impl Drop for DetectionLoop {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.schedule.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

fn spawn_cycle(ctx: CycleContext) {
    tokio::spawn(run_cycle(ctx));
}

async fn run_cycle(ctx: CycleContext) {
    if !ctx.source.ready_state().is_sampleable() {
        log::debug!("Video not ready, skipping detection cycle");
        return;
    }
    let Some(ticket) = ctx.store.begin_cycle(ctx.generation) else {
        return;
    };

    // Nested task: a panic in the chain comes back as a JoinError.
    let chain = tokio::spawn(sample_and_detect(
        ctx.sampler.clone(),
        ctx.client.clone(),
        ctx.source.clone(),
    ));

    let outcome = match chain.await {
        Ok(Ok(Some(detections))) => CycleOutcome::Completed(detections),
        Ok(Ok(None)) => CycleOutcome::NoFrame,
        Ok(Err(e)) => {
            log::warn!("Frame capture failed: {e}");
            CycleOutcome::CaptureFailed
        }
        Err(e) => {
            log::error!("Detection cycle #{} failed: {e}", ticket.sequence);
            CycleOutcome::Failed
        }
    };

    ctx.store.complete_cycle(ticket, outcome);
}

async fn sample_and_detect(
    sampler: Arc<dyn FrameSampler>,
    client: Arc<dyn DetectionClient>,
    source: Arc<dyn VideoSource>,
) -> Result<Option<DetectionResultSet>, CaptureError> {
    let Some(frame) = sampler.capture(source.as_ref())? else {
        return Ok(None);
    };
    Ok(Some(client.detect(&frame).await))
}
