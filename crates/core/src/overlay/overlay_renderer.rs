use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::capture::domain::video_source::VideoSource;
use crate::overlay::domain::drawing_surface::DrawingSurface;
use crate::overlay::domain::overlay_style::OverlayStyle;
use crate::session::session_store::SessionStore;
use crate::shared::bounding_box::PixelRect;
use crate::shared::constants::MIN_INTERVAL;
use crate::shared::face_detection::FaceDetection;

/// Paints the latest detection results over the displayed video.
///
/// Repaints run at display cadence, independent of how often detection
/// results arrive. The renderer never writes to the store.
#[derive(Clone)]
pub struct OverlayRenderer {
    store: Arc<SessionStore>,
    style: OverlayStyle,
}

fn lock<S>(surface: &Mutex<S>) -> MutexGuard<'_, S> {
    surface.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl OverlayRenderer {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            style: OverlayStyle::default(),
        }
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    /// One repaint. Returns the number of boxes drawn.
    pub fn paint(&self, surface: &mut dyn DrawingSurface, source: &dyn VideoSource) -> usize {
        let (width, height) = source.displayed_size();
        surface.resize(width, height);
        surface.clear();

        let detections = self.store.detections();
        let mut drawn = 0;
        for detection in detections.iter() {
            if self.paint_detection(surface, detection, (width, height)) {
                drawn += 1;
            }
        }
        drawn
    }

    fn paint_detection(
        &self,
        surface: &mut dyn DrawingSurface,
        detection: &FaceDetection,
        (width, height): (u32, u32),
    ) -> bool {
        let rect = detection.bbox.to_pixels(width, height);
        if rect.is_empty() {
            return false;
        }
        let color = self.style.color_for(detection.status);
        surface.stroke_rect(rect, color, self.style.line_width);

        let label = detection.label();
        let (text_w, text_h) = surface.measure_text(&label);
        let pad = self.style.label_padding;
        let background = label_rect(rect, text_w + 2 * pad, text_h + 2 * pad, width);

        surface.fill_rect(background, color);
        surface.fill_text(
            &label,
            background.x + pad as i32,
            background.y + pad as i32,
            self.style.label_text_color,
        );
        true
    }

    /// Starts a repaint loop that runs until the returned handle is
    /// cancelled or dropped. `frame_interval` is raised to [`MIN_INTERVAL`]
    /// if shorter.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(
        &self,
        surface: Arc<Mutex<S>>,
        source: Arc<dyn VideoSource>,
        frame_interval: Duration,
    ) -> RenderHandle
    where
        S: DrawingSurface + 'static,
    {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let renderer = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame_interval.max(MIN_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut frames = 0u64;
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => break,
                    _ = ticker.tick() => {
                        renderer.paint(&mut *lock(&surface), source.as_ref());
                        frames += 1;
                    }
                }
            }
            lock(&surface).clear();
            log::debug!("Overlay render loop stopped after {frames} frames");
        });

        RenderHandle {
            cancel: Some(cancel_tx),
            task,
        }
    }
}

/// Label background above the box, moved inside it when there is no room
/// above, and shifted left to stay on the surface.
fn label_rect(rect: PixelRect, label_w: u32, label_h: u32, surface_w: u32) -> PixelRect {
    let above = rect.y - label_h as i32;
    let y = if above < 0 { rect.y } else { above };
    let max_x = surface_w as i32 - label_w as i32;
    let x = rect.x.min(max_x).max(0);
    PixelRect {
        x,
        y,
        width: label_w,
        height: label_h,
    }
}

/// Controls a running render loop.
pub struct RenderHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RenderHandle {
    /// Stops the loop and waits for its final clear.
    pub async fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Err(e) = (&mut self.task).await {
            log::warn!("Overlay render loop ended abnormally: {e}");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
