use anyhow::{anyhow, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;

use crate::config::AppConfig;
use crate::selection::PixelRect;

/// Upload limits for cropped regions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressionLimits {
    /// Largest allowed width or height before downsampling
    pub max_dimension: u32,
    /// Largest allowed pixel count before downsampling
    pub max_pixels: u64,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for CompressionLimits {
    fn default() -> Self {
        Self {
            max_dimension: 2000,
            max_pixels: 4_000_000,
            jpeg_quality: 85,
        }
    }
}

impl CompressionLimits {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_dimension: config.max_crop_dimension,
            max_pixels: config.max_crop_pixels,
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }

    /// Returns the downsampled size for `(width, height)`, or `None` if the
    /// image is within limits. Aspect ratio is preserved.
    pub fn target_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let pixels = width as u64 * height as u64;
        if width <= self.max_dimension && height <= self.max_dimension && pixels <= self.max_pixels {
            return None;
        }

        let by_dimension = self.max_dimension as f64 / width.max(height) as f64;
        let by_area = (self.max_pixels as f64 / pixels as f64).sqrt();
        let ratio = by_dimension.min(by_area).min(1.0);

        let new_w = ((width as f64 * ratio).floor() as u32).max(1);
        let new_h = ((height as f64 * ratio).floor() as u32).max(1);
        Some((new_w, new_h))
    }
}

/// Copies a pixel rectangle out of the page raster into a new image of
/// exactly that size.
///
/// The rectangle must lie inside the raster and be non-empty.
pub fn crop_region(page: &RgbaImage, rect: &PixelRect) -> Result<RgbaImage> {
    let (w, h) = page.dimensions();

    if rect.width == 0 || rect.height == 0 {
        return Err(anyhow!(
            "Empty crop region {}x{}",
            rect.width,
            rect.height
        ));
    }
    if rect.x + rect.width > w || rect.y + rect.height > h {
        return Err(anyhow!(
            "Crop region {}x{}+{}+{} exceeds page raster {}x{}",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            w,
            h
        ));
    }

    Ok(image::imageops::crop_imm(page, rect.x, rect.y, rect.width, rect.height).to_image())
}

/// Prepares a cropped region for upload.
///
/// Oversized crops are downsampled with a Lanczos filter; the result is
/// always JPEG-encoded at the configured quality.
pub fn compress_for_ocr(region: &RgbaImage, limits: &CompressionLimits) -> Result<Vec<u8>> {
    let (width, height) = region.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow!("Cannot encode an empty region"));
    }

    let rgb = match limits.target_size(width, height) {
        Some((new_w, new_h)) => {
            crate::log(&format!(
                "Downsampling crop {}x{} -> {}x{}",
                width, height, new_w, new_h
            ));
            let resized = image::imageops::resize(region, new_w, new_h, FilterType::Lanczos3);
            DynamicImage::ImageRgba8(resized).to_rgb8()
        }
        None => DynamicImage::ImageRgba8(region.clone()).to_rgb8(),
    };

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, limits.jpeg_quality).encode_image(&rgb)?;
    let bytes = buffer.into_inner();

    crate::log(&format!(
        "Encoded crop {}x{} as JPEG ({} bytes)",
        rgb.width(),
        rgb.height(),
        bytes.len()
    ));
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn test_crop_region() {
        // 100x200 image
        let img: RgbaImage = ImageBuffer::from_fn(100, 200, |x, y| Rgba([x as u8, y as u8, 0, 255]));

        let rect = PixelRect { x: 10, y: 50, width: 50, height: 20 };
        let cropped = crop_region(&img, &rect).unwrap();

        assert_eq!(cropped.dimensions(), (50, 20));
        // Top-left pixel should be (10, 50) from original
        assert_eq!(cropped.get_pixel(0, 0)[0], 10);
        assert_eq!(cropped.get_pixel(0, 0)[1], 50);
    }

    #[test]
    fn test_crop_region_out_of_bounds() {
        let img = RgbaImage::new(100, 100);
        let rect = PixelRect { x: 90, y: 90, width: 20, height: 20 };
        assert!(crop_region(&img, &rect).is_err());
    }

    #[test]
    fn test_crop_region_empty() {
        let img = RgbaImage::new(100, 100);
        let rect = PixelRect { x: 10, y: 10, width: 0, height: 20 };
        assert!(crop_region(&img, &rect).is_err());
    }

    #[test]
    fn test_target_size_within_limits() {
        let limits = CompressionLimits::default();
        assert_eq!(limits.target_size(2000, 2000), None);
        assert_eq!(limits.target_size(800, 300), None);
    }

    #[test]
    fn test_target_size_by_dimension() {
        let limits = CompressionLimits::default();
        // 4000x1000: dimension ratio 0.5, area ratio sqrt(1.0) = 1.0
        assert_eq!(limits.target_size(4000, 1000), Some((2000, 500)));
    }

    #[test]
    fn test_target_size_by_area() {
        let limits = CompressionLimits {
            max_dimension: 5000,
            max_pixels: 1_000_000,
            jpeg_quality: 85,
        };
        // 2000x2000 = 4M px, area ratio 0.5
        assert_eq!(limits.target_size(2000, 2000), Some((1000, 1000)));
    }

    #[test]
    fn test_compress_produces_jpeg() {
        let img: RgbaImage = ImageBuffer::from_fn(64, 32, |x, _| Rgba([x as u8 * 4, 0, 0, 255]));
        let bytes = compress_for_ocr(&img, &CompressionLimits::default()).unwrap();
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }

    #[test]
    fn test_compress_downsamples_large_crop() {
        let img = RgbaImage::from_pixel(300, 100, Rgba([255, 255, 255, 255]));
        let limits = CompressionLimits {
            max_dimension: 150,
            max_pixels: 4_000_000,
            jpeg_quality: 85,
        };
        let bytes = compress_for_ocr(&img, &limits).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (150, 50));
    }
}
