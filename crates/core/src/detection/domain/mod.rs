pub mod detection_client;
pub mod detection_prompt;
pub mod inference;
