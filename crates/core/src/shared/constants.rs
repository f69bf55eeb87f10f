use std::time::Duration;

/// Time between detection cycle invocations, measured start to start.
pub const DETECTION_INTERVAL: Duration = Duration::from_millis(2500);

/// Overlay repaint cadence (~60 Hz display refresh).
pub const RENDER_INTERVAL: Duration = Duration::from_millis(16);
/// Floor for any periodic schedule; tokio rejects a zero period.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub const CAMERA_IDEAL_WIDTH: u32 = 1280;
pub const CAMERA_IDEAL_HEIGHT: u32 = 720;

/// Browser `toDataURL("image/jpeg")` default quality.
pub const JPEG_QUALITY: u8 = 92;

pub const GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables checked, in order, for the inference API key.
pub const API_KEY_ENV_VARS: &[&str] = &["MASKWATCH_API_KEY", "GEMINI_API_KEY", "API_KEY"];
pub const MODEL_ENV_VAR: &str = "MASKWATCH_MODEL";
pub const BASE_URL_ENV_VAR: &str = "MASKWATCH_BASE_URL";

pub const STATUS_IDLE: &str = "Click \"Start Detection\" to begin";
pub const STATUS_REQUESTING_CAMERA: &str = "Requesting camera access...";
pub const STATUS_CAMERA_ACTIVE: &str = "Camera activated. Starting detection...";
pub const STATUS_CAMERA_DENIED: &str = "Camera access denied.";
pub const STATUS_ANALYZING: &str = "Analyzing frame...";
pub const STATUS_DETECTION_FAILED: &str = "Detection failed.";
pub const STATUS_STOPPED: &str = "Detection stopped. Click \"Start Detection\" to begin.";

pub const ERROR_CAMERA_DENIED: &str =
    "Camera access denied. Please allow camera permissions in your browser settings.";
pub const ERROR_CAPTURE_FAILED: &str = "Could not capture frame.";
pub const ERROR_DETECTION_FAILED: &str = "An error occurred during detection. Please try again.";
