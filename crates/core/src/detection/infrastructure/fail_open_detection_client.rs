use async_trait::async_trait;

use crate::detection::domain::detection_client::DetectionClient;
use crate::detection::domain::detection_prompt::{response_schema, DETECTION_INSTRUCTION};
use crate::detection::domain::inference::{InferenceCapability, InferenceRequest};
use crate::shared::encoded_frame::{strip_data_uri_prefix, EncodedStillFrame};
use crate::shared::face_detection::DetectionResultSet;

/// Turns an [`InferenceCapability`] into a [`DetectionClient`] that never
/// fails.
///
/// Every error is logged and reported as "no faces". Values are trusted as
/// far as the response schema constrains them; numeric ranges are not
/// re-checked here.
pub struct FailOpenDetectionClient<I> {
    inference: I,
}

impl<I: InferenceCapability> FailOpenDetectionClient<I> {
    pub fn new(inference: I) -> Self {
        Self { inference }
    }

    fn build_request(image: &EncodedStillFrame) -> InferenceRequest {
        let data_uri = image.to_data_uri();
        InferenceRequest {
            instruction: DETECTION_INSTRUCTION.to_string(),
            mime_type: image.mime_type().to_string(),
            image_base64: strip_data_uri_prefix(&data_uri).to_string(),
            response_schema: response_schema(),
        }
    }
}

/// Parses the service's JSON answer. Blank text means no faces.
pub fn parse_detections(text: &str) -> Result<DetectionResultSet, serde_json::Error> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
}

#[async_trait]
impl<I: InferenceCapability> DetectionClient for FailOpenDetectionClient<I> {
    async fn detect(&self, image: &EncodedStillFrame) -> DetectionResultSet {
        let request = Self::build_request(image);

        let text = match self.inference.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Inference call failed: {e}");
                return Vec::new();
            }
        };

        match parse_detections(&text) {
            Ok(detections) => detections,
            Err(e) => {
                log::error!("Could not parse detection response: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::inference::InferenceError;
    use crate::shared::face_detection::DetectionStatus;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    struct ScriptedInference {
        reply: Box<dyn Fn() -> Result<String, InferenceError> + Send + Sync>,
        requests: Arc<Mutex<Vec<InferenceRequest>>>,
    }

    impl ScriptedInference {
        fn replying(reply: impl Fn() -> Result<String, InferenceError> + Send + Sync + 'static) -> Self {
            Self {
                reply: Box::new(reply),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn text(text: &'static str) -> Self {
            Self::replying(move || Ok(text.to_string()))
        }
    }

    #[async_trait]
    impl InferenceCapability for ScriptedInference {
        async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
            self.requests.lock().unwrap().push(request.clone());
            (self.reply)()
        }
    }

    fn jpeg() -> EncodedStillFrame {
        EncodedStillFrame::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    #[tokio::test]
    async fn test_returns_parsed_detections() {
        let client = FailOpenDetectionClient::new(ScriptedInference::text(
            r#"[
                {"box": {"x": 0.1, "y": 0.1, "width": 0.2, "height": 0.2}, "status": "Mask", "confidence": 0.91},
                {"box": {"x": 0.6, "y": 0.2, "width": 0.2, "height": 0.3}, "status": "No Mask", "confidence": 0.66}
            ]"#,
        ));

        let result = client.detect(&jpeg()).await;

        assert_eq!(result.len(), 2);
        for d in &result {
            assert!(DetectionStatus::ALL.contains(&d.status));
            assert!((0.0..=1.0).contains(&d.confidence));
        }
        assert_eq!(result[1].status, DetectionStatus::NoMask);
        assert_relative_eq!(result[0].confidence, 0.91);
        assert_relative_eq!(result[1].bbox.height, 0.3);
    }

    #[tokio::test]
    async fn test_sends_fixed_instruction_schema_and_bare_payload() {
        let inference = ScriptedInference::text("[]");
        let requests = inference.requests.clone();
        let client = FailOpenDetectionClient::new(inference);

        client.detect(&jpeg()).await;

        let sent = requests.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].instruction, DETECTION_INSTRUCTION);
        assert_eq!(sent[0].mime_type, "image/jpeg");
        assert_eq!(sent[0].image_base64, jpeg().to_base64());
        assert!(!sent[0].image_base64.starts_with("data:"));
        assert_eq!(sent[0].response_schema, response_schema());
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("  \n\t ")]
    #[case::empty_array("[]")]
    #[case::not_json("I see two faces")]
    #[case::truncated(r#"[{"box": {"x": 0.1"#)]
    #[case::wrong_shape(r#"{"faces": []}"#)]
    #[case::unknown_status(r#"[{"box": {"x": 0, "y": 0, "width": 1, "height": 1}, "status": "Unsure", "confidence": 0.5}]"#)]
    #[case::missing_field(r#"[{"box": {"x": 0, "y": 0, "width": 1, "height": 1}, "status": "Mask"}]"#)]
    #[tokio::test]
    async fn test_malformed_or_empty_text_yields_empty_set(#[case] text: &'static str) {
        let client = FailOpenDetectionClient::new(ScriptedInference::text(text));
        assert!(client.detect(&jpeg()).await.is_empty());
    }

    #[rstest]
    #[case::missing_key(InferenceError::MissingApiKey)]
    #[case::api(InferenceError::Api { status: 503, message: "overloaded".into() })]
    #[case::blocked(InferenceError::Blocked("SAFETY".into()))]
    #[tokio::test]
    async fn test_inference_errors_are_absorbed(#[case] error: InferenceError) {
        let error = Mutex::new(Some(error));
        let client = FailOpenDetectionClient::new(ScriptedInference::replying(move || {
            Err(error.lock().unwrap().take().unwrap_or(InferenceError::MissingApiKey))
        }));
        assert!(client.detect(&jpeg()).await.is_empty());
    }

    #[test]
    fn test_parse_trims_surrounding_whitespace() {
        let parsed = parse_detections(
            "\n [{\"box\": {\"x\": 0.2, \"y\": 0.3, \"width\": 0.1, \"height\": 0.1}, \"status\": \"Mask\", \"confidence\": 0.5}] \n",
        )
        .unwrap();
        assert_eq!(parsed.len(), 1);
    }
}
