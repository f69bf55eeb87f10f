use image::codecs::jpeg::JpegEncoder;

use crate::capture::domain::frame_sampler::{CaptureError, FrameSampler};
use crate::capture::domain::video_source::VideoSource;
use crate::shared::constants::JPEG_QUALITY;
use crate::shared::encoded_frame::EncodedStillFrame;

/// Samples the presented frame at native resolution and encodes it as JPEG.
pub struct JpegFrameSampler {
    quality: u8,
}

impl JpegFrameSampler {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegFrameSampler {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}

impl FrameSampler for JpegFrameSampler {
    fn capture(
        &self,
        source: &dyn VideoSource,
    ) -> Result<Option<EncodedStillFrame>, CaptureError> {
        if !source.ready_state().is_sampleable() {
            return Ok(None);
        }
        let Some(frame) = source.current_frame() else {
            return Ok(None);
        };

        let image = frame.to_rgb_image().ok_or(CaptureError::InvalidFrame {
            width: frame.width(),
            height: frame.height(),
        })?;

        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, self.quality);
        image
            .write_with_encoder(encoder)
            .map_err(CaptureError::Encode)?;

        Ok(Some(EncodedStillFrame::jpeg(bytes)))
    }
}
