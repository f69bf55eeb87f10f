use serde::{Deserialize, Serialize};

/// A face box in normalized image coordinates, origin top-left.
///
/// Each field is a fraction of the source image's width or height. The
/// service is asked for `x + width <= 1.0` and `y + height <= 1.0` but does
/// not guarantee it, so conversions to pixels clamp instead of trusting it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A rectangle in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Scales the box onto a `surface_w` x `surface_h` pixel grid.
    ///
    /// Edges are rounded independently and then clamped to the surface, so
    /// a box that overflows the right or bottom edge is cut at the edge
    /// rather than wrapping or growing the surface.
    pub fn to_pixels(&self, surface_w: u32, surface_h: u32) -> PixelRect {
        let sw = surface_w as f64;
        let sh = surface_h as f64;

        let left = (self.x * sw).round().clamp(0.0, sw);
        let top = (self.y * sh).round().clamp(0.0, sh);
        let right = ((self.x + self.width) * sw).round().clamp(left, sw);
        let bottom = ((self.y + self.height) * sh).round().clamp(top, sh);

        PixelRect {
            x: left as i32,
            y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }
}
