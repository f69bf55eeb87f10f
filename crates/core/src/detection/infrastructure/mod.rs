pub mod fail_open_detection_client;
pub mod gemini_inference;
