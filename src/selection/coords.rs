//! Coordinate conversion utilities.
//!
//! Converts overlay display coordinates (on-screen points relative to the
//! overlay's top-left corner) to pixel coordinates in the rendered page.

use anyhow::{anyhow, Result};

/// A point in overlay display space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayPoint {
    pub x: f32,
    pub y: f32,
}

impl DisplayPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A normalized rectangle in overlay display space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    /// Builds a rectangle from two corners given in any order.
    pub fn from_corners(a: DisplayPoint, b: DisplayPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Corner points in drawing order (clockwise, closed).
    pub fn outline(&self) -> [DisplayPoint; 5] {
        let (l, t) = (self.x, self.y);
        let (r, b) = (self.x + self.width, self.y + self.height);
        [
            DisplayPoint::new(l, t),
            DisplayPoint::new(r, t),
            DisplayPoint::new(r, b),
            DisplayPoint::new(l, b),
            DisplayPoint::new(l, t),
        ]
    }
}

/// A rectangle in rendered-page pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps a display rectangle onto the page raster.
///
/// `display_size` is the overlay's on-screen bounding box and `canvas_size`
/// the raster's pixel size; each axis is scaled by their ratio. The result is
/// clamped to the raster bounds.
pub fn display_to_canvas(
    rect: &DisplayRect,
    display_size: (f32, f32),
    canvas_size: (u32, u32),
) -> Result<PixelRect> {
    let (display_w, display_h) = display_size;
    let (canvas_w, canvas_h) = canvas_size;

    if display_w <= 0.0 || display_h <= 0.0 {
        return Err(anyhow!(
            "Overlay has no on-screen size ({}x{})",
            display_w,
            display_h
        ));
    }

    let scale_x = canvas_w as f32 / display_w;
    let scale_y = canvas_h as f32 / display_h;

    let x0 = ((rect.x * scale_x).round().max(0.0) as u32).min(canvas_w);
    let y0 = ((rect.y * scale_y).round().max(0.0) as u32).min(canvas_h);
    let x1 = (((rect.x + rect.width) * scale_x).round().max(0.0) as u32).min(canvas_w);
    let y1 = (((rect.y + rect.height) * scale_y).round().max(0.0) as u32).min(canvas_h);

    Ok(PixelRect {
        x: x0,
        y: y0,
        width: x1.saturating_sub(x0),
        height: y1.saturating_sub(y0),
    })
}
