use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("inference API key is not configured")]
    MissingApiKey,
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("inference request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("inference service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("inference response could not be parsed: {0}")]
    MalformedResponse(#[source] serde_json::Error),
    #[error("inference blocked by the service: {0}")]
    Blocked(String),
}

/// One inference call: a single image plus a fixed instruction and the JSON
/// schema the answer must follow.
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceRequest {
    pub instruction: String,
    pub mime_type: String,
    /// Base64 payload without any data-URI prefix.
    pub image_base64: String,
    pub response_schema: serde_json::Value,
}

/// External vision-language capability. One attempt per call, no retries.
///
/// Returns the raw response text, which may be empty.
#[async_trait]
pub trait InferenceCapability: Send + Sync {
    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError>;
}
