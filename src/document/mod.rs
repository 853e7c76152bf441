//! PDF document state and rendering.
//!
//! This module provides:
//! - The `Rasterizer` capability and its pdfium backend
//! - Render/display scale computation
//! - Page navigation (explicit and wheel-driven)

pub mod navigation;
pub mod rasterizer;

pub use navigation::{PageStep, WheelAccumulator};
pub use rasterizer::{PdfiumRasterizer, Rasterizer};

use anyhow::Result;
use image::RgbaImage;

/// Computes the raster scale for OCR-friendly resolution:
/// `min(device_pixel_ratio * oversample, max_scale)`.
pub fn compute_render_scale(device_pixel_ratio: f32, oversample: f32, max_scale: f32) -> f32 {
    let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    (dpr * oversample).min(max_scale)
}

/// A rendered page raster.
#[derive(Debug)]
pub struct RenderedPage {
    /// 1-based page number
    pub number: usize,
    pub image: RgbaImage,
    /// Bumped on every render so viewers can refresh cached textures.
    pub revision: u64,
}

impl RenderedPage {
    /// Scale that makes the raster fill `container_width` horizontally.
    pub fn display_scale(&self, container_width: f32) -> f32 {
        if self.image.width() == 0 {
            return 1.0;
        }
        container_width / self.image.width() as f32
    }

    /// On-screen size of the raster when fitted to `container_width`.
    pub fn display_size(&self, container_width: f32) -> (f32, f32) {
        let scale = self.display_scale(container_width);
        (container_width, self.image.height() as f32 * scale)
    }
}

/// A loaded document: page bookkeeping plus the current page raster.
#[derive(Debug)]
pub struct Document {
    pub name: String,
    page_count: usize,
    current_page: usize,
    render_scale: f32,
    rendered: Option<RenderedPage>,
    revision: u64,
}

impl Document {
    pub fn new(name: impl Into<String>, page_count: usize, render_scale: f32) -> Self {
        Self {
            name: name.into(),
            page_count,
            current_page: 1,
            render_scale,
            rendered: None,
            revision: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// 1-based current page number.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn has_multiple_pages(&self) -> bool {
        self.page_count > 1
    }

    pub fn rendered(&self) -> Option<&RenderedPage> {
        self.rendered.as_ref()
    }

    /// Moves the page cursor. Returns false when already at the boundary.
    pub fn step(&mut self, step: PageStep) -> bool {
        match step {
            PageStep::Next if self.current_page < self.page_count => {
                self.current_page += 1;
                true
            }
            PageStep::Previous if self.current_page > 1 => {
                self.current_page -= 1;
                true
            }
            _ => false,
        }
    }

    /// Rasterizes the current page.
    pub fn render_current<R: Rasterizer + ?Sized>(&mut self, rasterizer: &mut R) -> Result<()> {
        let image = rasterizer.render_page(self.current_page - 1, self.render_scale)?;
        self.revision += 1;
        crate::log(&format!(
            "Rendered page {}/{} at scale {:.2} ({}x{})",
            self.current_page,
            self.page_count,
            self.render_scale,
            image.width(),
            image.height()
        ));
        self.rendered = Some(RenderedPage {
            number: self.current_page,
            image,
            revision: self.revision,
        });
        Ok(())
    }
}
