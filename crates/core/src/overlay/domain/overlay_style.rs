use crate::overlay::domain::drawing_surface::Color;
use crate::shared::face_detection::DetectionStatus;

pub const MASK_COLOR: Color = Color::rgb(0x22, 0xC5, 0x5E);
pub const NO_MASK_COLOR: Color = Color::rgb(0xEF, 0x44, 0x44);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    pub mask_color: Color,
    pub no_mask_color: Color,
    pub label_text_color: Color,
    pub line_width: u32,
    pub label_padding: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            mask_color: MASK_COLOR,
            no_mask_color: NO_MASK_COLOR,
            label_text_color: Color::WHITE,
            line_width: 4,
            label_padding: 4,
        }
    }
}

impl OverlayStyle {
    pub fn color_for(&self, status: DetectionStatus) -> Color {
        match status {
            DetectionStatus::Mask => self.mask_color,
            DetectionStatus::NoMask => self.no_mask_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses_get_distinct_colors() {
        let style = OverlayStyle::default();
        assert_eq!(style.color_for(DetectionStatus::Mask), MASK_COLOR);
        assert_eq!(style.color_for(DetectionStatus::NoMask), NO_MASK_COLOR);
        assert_ne!(MASK_COLOR, NO_MASK_COLOR);
    }

    #[test]
    fn test_label_text_contrasts_with_both_box_colors() {
        let style = OverlayStyle::default();
        assert_ne!(style.label_text_color, style.mask_color);
        assert_ne!(style.label_text_color, style.no_mask_color);
    }
}
