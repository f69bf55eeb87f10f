use thiserror::Error;

use crate::capture::domain::video_source::VideoSource;
use crate::shared::encoded_frame::EncodedStillFrame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("frame buffer does not match {width}x{height}")]
    InvalidFrame { width: u32, height: u32 },
    #[error("failed to encode frame: {0}")]
    Encode(#[source] image::ImageError),
}

/// Extracts a still image from a live source.
///
/// `Ok(None)` means no meaningful frame is available yet; callers skip the
/// cycle instead of sending a blank image.
pub trait FrameSampler: Send + Sync {
    fn capture(&self, source: &dyn VideoSource)
        -> Result<Option<EncodedStillFrame>, CaptureError>;
}
