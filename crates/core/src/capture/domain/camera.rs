use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::capture::domain::video_source::VideoSource;
use crate::shared::constants::{CAMERA_IDEAL_HEIGHT, CAMERA_IDEAL_WIDTH};

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera available: {0}")]
    NotFound(String),
    #[error("camera could not be started: {0}")]
    Unavailable(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

/// Hints passed along with an access request; a camera may ignore them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraConstraints {
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            width: CAMERA_IDEAL_WIDTH,
            height: CAMERA_IDEAL_HEIGHT,
            facing: FacingMode::User,
        }
    }
}

/// Domain interface for acquiring a live video stream.
///
/// Access may suspend while the user answers a permission prompt.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn request_access(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Arc<dyn VideoSource>, CameraError>;
}
