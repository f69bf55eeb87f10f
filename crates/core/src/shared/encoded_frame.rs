use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// A still image in a lossy raster encoding, ready to send for inference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedStillFrame {
    mime_type: String,
    bytes: Vec<u8>,
}

impl EncodedStillFrame {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(JPEG_MIME_TYPE, bytes)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Returns the payload of a data URI, or the input unchanged when it has no
/// `data:` prefix.
///
/// Everything up to and including the first comma is dropped.
pub fn strip_data_uri_prefix(encoded: &str) -> &str {
    if !encoded.starts_with("data:") {
        return encoded;
    }
    match encoded.split_once(',') {
        Some((_, payload)) => payload,
        None => "",
    }
}
