//! Encoding rendered canvases to PNG and JPEG.

use std::str::FromStr;

use image::{ImageEncoder, RgbaImage};
use retailor_core::Rgb;

use crate::error::{RenderError, RenderResult};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// PNG image, alpha preserved.
    #[default]
    Png,
    /// JPEG image, flattened onto the configured background.
    Jpeg,
}

impl ExportFormat {
    /// MIME type recorded in the blob store.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(RenderError::InvalidArgument(format!(
                "unsupported export format '{other}'"
            ))),
        }
    }
}

/// Configuration for export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Background JPEG output is flattened onto.
    pub background: Rgb,
    /// JPEG quality 1-100 (default: 85).
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            background: Rgb::WHITE,
            jpeg_quality: 85,
        }
    }
}

/// Encode a canvas in the requested format.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if encoding fails.
pub fn encode(img: &RgbaImage, format: ExportFormat, config: &ExportConfig) -> RenderResult<Vec<u8>> {
    match format {
        ExportFormat::Png => encode_png(img),
        ExportFormat::Jpeg => encode_jpeg(img, config),
    }
}

/// Encode a canvas as PNG.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if encoding fails.
pub fn encode_png(img: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;
    Ok(buf)
}

/// Encode a canvas as JPEG, flattening alpha onto `config.background`.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if encoding fails.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_jpeg(img: &RgbaImage, config: &ExportConfig) -> RenderResult<Vec<u8>> {
    let bg = config.background.to_array();
    let mut rgb_data = Vec::with_capacity(img.as_raw().len() / 4 * 3);
    for pixel in img.pixels() {
        let alpha = u32::from(pixel[3]);
        let inv = 255 - alpha;
        for i in 0..3 {
            let c = u32::from(pixel[i]) * alpha + u32::from(bg[i]) * inv;
            rgb_data.push(((c + 127) / 255) as u8);
        }
    }

    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, config.jpeg_quality)
        .write_image(
            &rgb_data,
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn sample() -> RgbaImage {
        RgbaImage::from_pixel(16, 16, Rgba([20, 40, 60, 255]))
    }

    #[test]
    fn test_png_export_produces_valid_bytes() {
        let png = encode_png(&sample()).expect("png export");
        assert!(png.len() > 8);
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
        let back = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_jpeg_export_produces_valid_bytes() {
        let jpeg = encode_jpeg(&sample(), &ExportConfig::default()).expect("jpeg export");
        assert!(jpeg.len() > 2);
        assert_eq!(jpeg[0], 0xFF);
        assert_eq!(jpeg[1], 0xD8);
    }

    #[test]
    fn test_export_dispatch() {
        let config = ExportConfig::default();
        let png = encode(&sample(), ExportFormat::Png, &config).expect("png");
        let jpeg = encode(&sample(), ExportFormat::Jpeg, &config).expect("jpeg");
        assert_eq!(png[0], 137);
        assert_eq!(jpeg[0], 0xFF);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PNG".parse::<ExportFormat>().expect("png"), ExportFormat::Png);
        assert_eq!("jpg".parse::<ExportFormat>().expect("jpg"), ExportFormat::Jpeg);
        assert!("gif".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Jpeg.mime(), "image/jpeg");
    }
}
