use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    API_KEY_ENV_VARS, BASE_URL_ENV_VAR, DETECTION_INTERVAL, GEMINI_BASE_URL, GEMINI_MODEL,
    JPEG_QUALITY, MODEL_ENV_VAR, RENDER_INTERVAL,
};

/// Runtime configuration for a detection session.
///
/// There is no settings file; values come from defaults, the environment
/// and whatever the front end overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub detection_interval_ms: u64,
    pub render_interval_ms: u64,
    pub jpeg_quality: u8,
    /// Unset means the inference call may take as long as the service does.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GEMINI_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            detection_interval_ms: DETECTION_INTERVAL.as_millis() as u64,
            render_interval_ms: RENDER_INTERVAL.as_millis() as u64,
            jpeg_quality: JPEG_QUALITY,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup; empty values are
    /// treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            api_key: API_KEY_ENV_VARS.iter().find_map(|key| get(key)),
            model: get(MODEL_ENV_VAR).unwrap_or(defaults.model),
            base_url: get(BASE_URL_ENV_VAR).unwrap_or(defaults.base_url),
            ..defaults
        }
    }

    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms.max(1))
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
