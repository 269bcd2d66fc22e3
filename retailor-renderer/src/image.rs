//! Asset decoding and data-URI import/export.

use base64::Engine;
use image::RgbaImage;

use crate::error::{RenderError, RenderResult};

/// Raster formats recognised from asset bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Self::Png
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Self::WebP
        } else {
            Self::Unknown
        }
    }

    /// MIME type to record for this format.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// Decode asset bytes into straight-alpha RGBA.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the bytes are not a supported image.
pub fn decode(data: &[u8]) -> RenderResult<RgbaImage> {
    let img = image::load_from_memory(data).map_err(|e| RenderError::Decode(e.to_string()))?;
    Ok(img.to_rgba8())
}

/// Split a base64 data URI into its bytes and content type.
///
/// Accepts `data:image/png;base64,iVBORw0KGgo...`.
///
/// # Errors
///
/// Returns [`RenderError::InvalidArgument`] if the URI is malformed or not base64.
pub fn parse_data_uri(uri: &str) -> RenderResult<(Vec<u8>, String)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::InvalidArgument("not a data URI".to_string()))?;
    let (metadata, encoded) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::InvalidArgument("invalid data URI: missing comma".to_string()))?;
    let content_type = metadata
        .strip_suffix(";base64")
        .ok_or_else(|| RenderError::InvalidArgument("only base64 data URIs are supported".to_string()))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| RenderError::InvalidArgument(format!("invalid base64: {e}")))?;

    let content_type = if content_type.is_empty() {
        ImageFormat::from_magic_bytes(&bytes).mime().to_string()
    } else {
        content_type.to_string()
    };
    Ok((bytes, content_type))
}

/// Encode bytes as a base64 data URI.
#[must_use]
pub fn to_data_uri(bytes: &[u8], content_type: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{content_type};base64,{encoded}")
}
