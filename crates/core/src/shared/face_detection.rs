use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;

/// Whether a detected face is wearing a mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionStatus {
    #[serde(rename = "Mask")]
    Mask,
    #[serde(rename = "No Mask")]
    NoMask,
}

impl DetectionStatus {
    pub const ALL: &[DetectionStatus] = &[DetectionStatus::Mask, DetectionStatus::NoMask];

    /// The wire name, which is also the label shown on the overlay.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStatus::Mask => "Mask",
            DetectionStatus::NoMask => "No Mask",
        }
    }
}

impl fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One face found in one detection cycle.
///
/// There is no identity across cycles: every cycle produces new values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub status: DetectionStatus,
    pub confidence: f64,
}

impl FaceDetection {
    pub fn new(bbox: BoundingBox, status: DetectionStatus, confidence: f64) -> Self {
        Self {
            bbox,
            status,
            confidence,
        }
    }

    /// Overlay label, e.g. `"No Mask (87%)"`.
    pub fn label(&self) -> String {
        format!("{} ({}%)", self.status, (self.confidence * 100.0).round() as i64)
    }
}

/// All faces produced by a single cycle, in service order.
///
/// A new set always replaces the previous one wholesale.
pub type DetectionResultSet = Vec<FaceDetection>;

/// Mask / no-mask counts for the status line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    pub masks: usize,
    pub no_masks: usize,
}

impl DetectionSummary {
    pub fn of(detections: &[FaceDetection]) -> Self {
        detections
            .iter()
            .fold(Self::default(), |mut acc, d| {
                match d.status {
                    DetectionStatus::Mask => acc.masks += 1,
                    DetectionStatus::NoMask => acc.no_masks += 1,
                }
                acc
            })
    }

    pub fn status_message(&self) -> String {
        format!(
            "Detection complete. Masks: {}, No Masks: {}.",
            self.masks, self.no_masks
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn detection(status: DetectionStatus, confidence: f64) -> FaceDetection {
        FaceDetection::new(BoundingBox::new(0.1, 0.1, 0.2, 0.2), status, confidence)
    }

    #[rstest]
    #[case::mask(DetectionStatus::Mask, 0.934, "Mask (93%)")]
    #[case::no_mask(DetectionStatus::NoMask, 0.875, "No Mask (88%)")]
    #[case::certain(DetectionStatus::Mask, 1.0, "Mask (100%)")]
    #[case::zero(DetectionStatus::NoMask, 0.0, "No Mask (0%)")]
    fn test_label_rounds_confidence(
        #[case] status: DetectionStatus,
        #[case] confidence: f64,
        #[case] expected: &str,
    ) {
        assert_eq!(detection(status, confidence).label(), expected);
    }

    #[test]
    fn test_status_uses_service_wire_names() {
        assert_eq!(
            serde_json::to_string(&DetectionStatus::NoMask).unwrap(),
            r#""No Mask""#
        );
        let status: DetectionStatus = serde_json::from_str(r#""Mask""#).unwrap();
        assert_eq!(status, DetectionStatus::Mask);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(serde_json::from_str::<DetectionStatus>(r#""Maybe""#).is_err());
    }

    #[test]
    fn test_parses_service_array() {
        let json = r#"[
            {"box": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4}, "status": "No Mask", "confidence": 0.9},
            {"box": {"x": 0.5, "y": 0.5, "width": 0.1, "height": 0.1}, "status": "Mask", "confidence": 0.75}
        ]"#;
        let set: DetectionResultSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].status, DetectionStatus::NoMask);
        assert_eq!(set[0].bbox, BoundingBox::new(0.1, 0.2, 0.3, 0.4));
        assert_eq!(set[1].status, DetectionStatus::Mask);
        assert_relative_eq!(set[1].confidence, 0.75);
    }

    #[test]
    fn test_summary_counts_each_status() {
        let set = vec![
            detection(DetectionStatus::Mask, 0.9),
            detection(DetectionStatus::NoMask, 0.8),
            detection(DetectionStatus::Mask, 0.7),
        ];
        let summary = DetectionSummary::of(&set);
        assert_eq!(summary, DetectionSummary { masks: 2, no_masks: 1 });
        assert_eq!(
            summary.status_message(),
            "Detection complete. Masks: 2, No Masks: 1."
        );
    }

    #[test]
    fn test_summary_of_empty_set() {
        assert_eq!(
            DetectionSummary::of(&[]).status_message(),
            "Detection complete. Masks: 0, No Masks: 0."
        );
    }
}
