use async_trait::async_trait;

use crate::shared::encoded_frame::EncodedStillFrame;
use crate::shared::face_detection::DetectionResultSet;

/// Domain interface for mask detection on a single still image.
///
/// Never fails: implementations absorb their own errors and return an empty
/// set, so callers can rely on a result without re-checking.
#[async_trait]
pub trait DetectionClient: Send + Sync {
    async fn detect(&self, image: &EncodedStillFrame) -> DetectionResultSet;
}
