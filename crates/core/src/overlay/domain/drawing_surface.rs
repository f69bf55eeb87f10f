use crate::shared::bounding_box::PixelRect;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A transparent 2D layer stacked on top of the video.
///
/// Coordinates are surface pixels, origin top-left. Drawing outside the
/// surface is clipped, never an error.
pub trait DrawingSurface: Send {
    /// Sets the pixel size. Changing the size discards the current paint.
    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    /// Makes every pixel transparent.
    fn clear(&mut self);

    /// Outlines `rect` with a stroke `line_width` pixels wide, drawn inside
    /// the rectangle's bounds.
    fn stroke_rect(&mut self, rect: PixelRect, color: Color, line_width: u32);

    fn fill_rect(&mut self, rect: PixelRect, color: Color);

    /// Pixel size `text` would occupy when drawn with [`fill_text`](Self::fill_text).
    fn measure_text(&self, text: &str) -> (u32, u32);

    /// Draws `text` with its top-left corner at `(x, y)`.
    fn fill_text(&mut self, text: &str, x: i32, y: i32, color: Color);
}
