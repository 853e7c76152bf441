//! Page rasterization backends.
//!
//! The `Rasterizer` trait is the only place the workflow touches a PDF
//! library, so the controller can be driven by a headless renderer in tests.

use anyhow::{anyhow, Result};
use image::{ImageBuffer, RgbaImage};
use pdfium_render::prelude::*;

use crate::ocr::preprocess::{compress_for_ocr, crop_region, CompressionLimits};
use crate::selection::PixelRect;

/// Rasterization capability: render pages, crop regions, compress crops.
pub trait Rasterizer {
    /// Parses a document from raw bytes. Returns the page count.
    fn load(&mut self, bytes: Vec<u8>) -> Result<usize>;

    /// Renders a zero-based page at `scale` raster pixels per PDF point.
    fn render_page(&mut self, page_index: usize, scale: f32) -> Result<RgbaImage>;

    /// Releases the loaded document.
    fn unload(&mut self);

    /// Copies `rect` out of a rendered page into a new image of exactly that size.
    fn crop_region(&self, page: &RgbaImage, rect: &PixelRect) -> Result<RgbaImage> {
        crop_region(page, rect)
    }

    /// Downsamples (if needed) and JPEG-encodes a cropped region.
    fn compress(&self, region: &RgbaImage, limits: &CompressionLimits) -> Result<Vec<u8>> {
        compress_for_ocr(region, limits)
    }
}

/// Rasterizer backed by the pdfium library.
///
/// pdfium documents borrow the library binding, so only the source bytes are
/// kept and the document is reopened for each render.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    bytes: Option<Vec<u8>>,
}

impl PdfiumRasterizer {
    /// Binds pdfium from `<exe_dir>/lib/`, falling back to the system library.
    pub fn new() -> Result<Self> {
        let lib_dir = crate::paths::get_pdfium_dir();
        let lib_name = Pdfium::pdfium_platform_library_name_at_path(&lib_dir);
        crate::log(&format!("Trying pdfium library at: {}", lib_name.display()));

        let binding = match Pdfium::bind_to_library(&lib_name) {
            Ok(binding) => binding,
            Err(local_err) => {
                crate::log(&format!(
                    "Bundled pdfium unavailable ({}), trying system library",
                    local_err
                ));
                Pdfium::bind_to_system_library().map_err(|e| {
                    anyhow!(
                        "Failed to bind pdfium. Place the pdfium library in {} or install it system-wide. Last error: {}",
                        lib_dir.display(),
                        e
                    )
                })?
            }
        };

        Ok(Self {
            pdfium: Pdfium::new(binding),
            bytes: None,
        })
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn load(&mut self, bytes: Vec<u8>) -> Result<usize> {
        let page_count = {
            let document = self.pdfium.load_pdf_from_byte_slice(&bytes, None)?;
            document.pages().len() as usize
        };
        if page_count == 0 {
            return Err(anyhow!("Document has no pages"));
        }
        self.bytes = Some(bytes);
        Ok(page_count)
    }

    fn render_page(&mut self, page_index: usize, scale: f32) -> Result<RgbaImage> {
        let bytes = self.bytes.as_ref().ok_or_else(|| anyhow!("No PDF loaded"))?;
        let document = self.pdfium.load_pdf_from_byte_slice(bytes, None)?;
        let page = document.pages().get(page_index as u16)?;

        let target_width = (page.width().value * scale).round().max(1.0) as i32;
        let target_height = (page.height().value * scale).round().max(1.0) as i32;

        let bitmap = page.render_with_config(
            &PdfRenderConfig::new()
                .set_target_width(target_width)
                .set_maximum_height(target_height),
        )?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let rgba = bitmap.as_rgba_bytes();

        let image: RgbaImage = ImageBuffer::from_raw(width, height, rgba)
            .ok_or_else(|| anyhow!("Failed to create image buffer from page bitmap"))?;
        Ok(image)
    }

    fn unload(&mut self) {
        self.bytes = None;
    }
}
