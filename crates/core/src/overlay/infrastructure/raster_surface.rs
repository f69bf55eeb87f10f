use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::overlay::domain::drawing_surface::{Color, DrawingSurface};
use crate::overlay::infrastructure::bitmap_font;
use crate::shared::bounding_box::PixelRect;

pub const DEFAULT_TEXT_SCALE: u32 = 2;

/// In-memory RGBA overlay layer.
pub struct RasterSurface {
    image: RgbaImage,
    text_scale: u32,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            text_scale: DEFAULT_TEXT_SCALE,
        }
    }

    pub fn with_text_scale(mut self, scale: u32) -> Self {
        self.text_scale = scale.max(1);
        self
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    fn to_rect(&self, rect: PixelRect) -> Option<Rect> {
        // imageproc builds a canvas-sized Rect internally, which must not be empty.
        if rect.is_empty() || self.image.width() == 0 || self.image.height() == 0 {
            None
        } else {
            Some(Rect::at(rect.x, rect.y).of_size(rect.width, rect.height))
        }
    }
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.to_array())
}

impl DrawingSurface for RasterSurface {
    fn resize(&mut self, width: u32, height: u32) {
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::new(width, height);
        }
    }

    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn stroke_rect(&mut self, rect: PixelRect, color: Color, line_width: u32) {
        let color = rgba(color);
        for inset in 0..line_width.max(1) {
            let inner = PixelRect {
                x: rect.x + inset as i32,
                y: rect.y + inset as i32,
                width: rect.width.saturating_sub(2 * inset),
                height: rect.height.saturating_sub(2 * inset),
            };
            match self.to_rect(inner) {
                Some(r) => draw_hollow_rect_mut(&mut self.image, r, color),
                None => break,
            }
        }
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        if let Some(r) = self.to_rect(rect) {
            draw_filled_rect_mut(&mut self.image, r, rgba(color));
        }
    }

    fn measure_text(&self, text: &str) -> (u32, u32) {
        bitmap_font::text_size(text, self.text_scale)
    }

    fn fill_text(&mut self, text: &str, x: i32, y: i32, color: Color) {
        bitmap_font::draw_text(&mut self.image, text, x, y, self.text_scale, rgba(color));
    }
}
