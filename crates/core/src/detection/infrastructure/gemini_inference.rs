use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::detection::domain::inference::{InferenceCapability, InferenceError, InferenceRequest};
use crate::shared::settings::Settings;

/// Google Gemini `generateContent` adapter with structured JSON output.
pub struct GeminiInference {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiInference {
    pub fn new(settings: &Settings) -> Result<Self, InferenceError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(InferenceError::MissingApiKey)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(InferenceError::Client)?;

        Ok(Self {
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

fn build_request_body(request: &InferenceRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text {
                    text: request.instruction.clone(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: request.mime_type.clone(),
                        data: request.image_base64.clone(),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: request.response_schema.clone(),
        },
    }
}

/// Pulls the answer text out of a successful response body.
///
/// A response without candidates or text parts is an empty answer, not an
/// error; a safety block is reported as [`InferenceError::Blocked`].
fn extract_text(body: &str) -> Result<String, InferenceError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(InferenceError::MalformedResponse)?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(InferenceError::Blocked(reason));
    }

    let text = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .concat()
        })
        .unwrap_or_default();

    Ok(text)
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl InferenceCapability for GeminiInference {
    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        let body = build_request_body(request);
        log::debug!(
            "Sending {} byte image to {}",
            request.image_base64.len(),
            self.model
        );

        // Key travels as a header, never in the URL.
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(InferenceError::Transport)?;

        let status = response.status();
        let text = response.text().await.map_err(InferenceError::Transport)?;

        if !status.is_success() {
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        extract_text(&text)
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content<Part>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content<P> {
    parts: Vec<P>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings_with_key(key: Option<&str>) -> Settings {
        Settings {
            api_key: key.map(str::to_string),
            ..Settings::default()
        }
    }

    fn request() -> InferenceRequest {
        InferenceRequest {
            instruction: "find faces".into(),
            mime_type: "image/jpeg".into(),
            image_base64: "/9j/4AAQ".into(),
            response_schema: json!({"type": "ARRAY"}),
        }
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            GeminiInference::new(&settings_with_key(None)),
            Err(InferenceError::MissingApiKey)
        ));
        assert!(matches!(
            GeminiInference::new(&settings_with_key(Some("   "))),
            Err(InferenceError::MissingApiKey)
        ));
    }

    #[test]
    fn test_endpoint_uses_model_and_trims_slash() {
        let settings = Settings {
            base_url: "http://localhost:9000/v1beta/".into(),
            ..settings_with_key(Some("k"))
        };
        let inference = GeminiInference::new(&settings).unwrap();
        assert_eq!(
            inference.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(build_request_body(&request())).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "parts": [
                        {"text": "find faces"},
                        {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4AAQ"}}
                    ]
                }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {"type": "ARRAY"}
                }
            })
        );
    }

    #[test]
    fn test_extracts_first_candidate_text() {
        let body = json!({
            "candidates": [
                {"content": {"parts": [{"text": "[{\"a\":"}, {"text": "1}]"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        })
        .to_string();
        assert_eq!(extract_text(&body).unwrap(), "[{\"a\":1}]");
    }

    #[test]
    fn test_missing_candidates_is_empty_text() {
        assert_eq!(extract_text("{}").unwrap(), "");
        assert_eq!(extract_text(r#"{"candidates": []}"#).unwrap(), "");
        assert_eq!(extract_text(r#"{"candidates": [{}]}"#).unwrap(), "");
    }

    #[test]
    fn test_blocked_prompt_is_an_error() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert!(matches!(
            extract_text(body),
            Err(InferenceError::Blocked(reason)) if reason == "SAFETY"
        ));
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        assert!(matches!(
            extract_text("<html>"),
            Err(InferenceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_api_error_message_prefers_structured_error() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "API key not valid");
        assert_eq!(api_error_message("bad gateway"), "bad gateway");
    }
}
