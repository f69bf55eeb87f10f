use serde_json::{json, Value};

use crate::shared::face_detection::DetectionStatus;

pub const DETECTION_INSTRUCTION: &str = "\
Analyze the provided image to detect all human faces.
For each face found, determine if a protective face mask is being worn correctly.
Return the results as a JSON array. Each object in the array should represent one detected face and strictly follow this structure:
- \"box\": An object with \"x\", \"y\", \"width\", and \"height\" for the bounding box. These values must be normalized percentages (0.0 to 1.0) of the image dimensions, with the origin at the top-left corner.
- \"status\": A string, which must be either \"Mask\" or \"No Mask\".
- \"confidence\": A number between 0.0 and 1.0 representing the confidence of the mask status detection.
If no faces are detected, return an empty array.";

/// Structured-output schema in the service's OpenAPI subset.
pub fn response_schema() -> Value {
    let statuses: Vec<&str> = DetectionStatus::ALL.iter().map(|s| s.as_str()).collect();
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "box": {
                    "type": "OBJECT",
                    "properties": {
                        "x": { "type": "NUMBER" },
                        "y": { "type": "NUMBER" },
                        "width": { "type": "NUMBER" },
                        "height": { "type": "NUMBER" }
                    },
                    "required": ["x", "y", "width", "height"]
                },
                "status": {
                    "type": "STRING",
                    "enum": statuses
                },
                "confidence": { "type": "NUMBER" }
            },
            "required": ["box", "status", "confidence"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_restricts_status_to_both_enum_values() {
        let schema = response_schema();
        assert_eq!(
            schema["items"]["properties"]["status"]["enum"],
            json!(["Mask", "No Mask"])
        );
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = response_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(
            schema["items"]["required"],
            json!(["box", "status", "confidence"])
        );
        assert_eq!(
            schema["items"]["properties"]["box"]["required"],
            json!(["x", "y", "width", "height"])
        );
    }

    #[test]
    fn test_instruction_names_wire_statuses() {
        assert!(DETECTION_INSTRUCTION.contains("\"Mask\""));
        assert!(DETECTION_INSTRUCTION.contains("\"No Mask\""));
        assert!(DETECTION_INSTRUCTION.ends_with("return an empty array."));
    }
}
