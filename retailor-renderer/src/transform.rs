//! Single-shot asset transforms: crop, enhance and channel resize.
//!
//! Transforms compose through [`apply_ops`], each step consuming the
//! previous step's output.

use std::fmt;
use std::str::FromStr;

use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::raster::overlay;

/// How to crop an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CropMode {
    /// Centre crop to the shorter side.
    Square,
    /// Centre crop to 4:5 at full height.
    Portrait,
    /// Centre crop to 16:9 at full width.
    Landscape,
    /// Stretch to an explicit size.
    Custom {
        /// Output width.
        width: u32,
        /// Output height.
        height: u32,
    },
}

impl CropMode {
    /// Parse a mode name, taking the size for `custom` from `width`/`height`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidArgument`] for unknown modes, or for
    /// `custom` without a positive width and height.
    pub fn parse(mode: &str, width: Option<u32>, height: Option<u32>) -> RenderResult<Self> {
        if mode.eq_ignore_ascii_case("custom") {
            return match (width, height) {
                (Some(width), Some(height)) if width > 0 && height > 0 => {
                    Ok(Self::Custom { width, height })
                }
                _ => Err(RenderError::InvalidArgument(
                    "custom crop requires width and height".to_string(),
                )),
            };
        }
        mode.parse()
    }

    /// Output size for a `width × height` source.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn target_size(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::Square => {
                let side = width.min(height);
                (side, side)
            }
            Self::Portrait => (((u64::from(height) * 4) / 5).max(1) as u32, height),
            Self::Landscape => (width, ((u64::from(width) * 9) / 16).max(1) as u32),
            Self::Custom { width, height } => (width, height),
        }
    }
}

impl FromStr for CropMode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "square" => Ok(Self::Square),
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            "custom" => Err(RenderError::InvalidArgument(
                "custom crop requires width and height".to_string(),
            )),
            other => Err(RenderError::InvalidArgument(format!(
                "invalid crop mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for CropMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Square => f.write_str("square"),
            Self::Portrait => f.write_str("portrait"),
            Self::Landscape => f.write_str("landscape"),
            Self::Custom { width, height } => write!(f, "custom {width}x{height}"),
        }
    }
}

/// Crop an image.
#[must_use]
pub fn crop(img: &RgbaImage, mode: CropMode) -> RgbaImage {
    let (w, h) = img.dimensions();
    let (tw, th) = mode.target_size(w, h);
    match mode {
        CropMode::Custom { .. } => resize(img, tw, th),
        _ => fit(img, tw, th),
    }
}

/// Centre-crop to the target aspect ratio, then scale to the target size.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn fit(img: &RgbaImage, tw: u32, th: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let target = f64::from(tw) / f64::from(th);
    let (cw, ch) = if f64::from(w) / f64::from(h) > target {
        ((f64::from(h) * target).round() as u32, h)
    } else {
        (w, (f64::from(w) / target).round() as u32)
    };
    let (cw, ch) = (cw.clamp(1, w), ch.clamp(1, h));
    let cropped = imageops::crop_imm(img, (w - cw) / 2, (h - ch) / 2, cw, ch).to_image();
    if (cw, ch) == (tw, th) {
        cropped
    } else {
        imageops::resize(&cropped, tw, th, imageops::FilterType::Lanczos3)
    }
}

fn resize(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    imageops::resize(img, width, height, imageops::FilterType::CatmullRom)
}

/// Enhancement factors; `1.0` leaves a channel untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceParams {
    /// Edge sharpening; below 1 blurs.
    pub sharpness: f32,
    /// Distance from the mean grey level.
    pub contrast: f32,
    /// Multiplier on every colour channel.
    pub brightness: f32,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            sharpness: 1.2,
            contrast: 1.15,
            brightness: 1.1,
        }
    }
}

impl EnhanceParams {
    /// Reject negative or non-finite factors.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidArgument`] naming the bad factor.
    pub fn validate(&self) -> RenderResult<()> {
        for (name, value) in [
            ("sharpness", self.sharpness),
            ("contrast", self.contrast),
            ("brightness", self.brightness),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RenderError::InvalidArgument(format!(
                    "{name} factor {value} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// Interpolate each colour channel away from `degenerate` by `factor`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_from(img: &mut RgbaImage, degenerate: &RgbaImage, factor: f32) {
    for (pixel, base) in img.pixels_mut().zip(degenerate.pixels()) {
        for i in 0..3 {
            let d = f32::from(base[i]);
            let v = d + factor * (f32::from(pixel[i]) - d);
            pixel[i] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// 3×3 smoothing with a heavy centre weight; border pixels are kept.
#[allow(clippy::cast_possible_truncation)]
fn smooth(img: &RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    let mut out = img.clone();
    if w < 3 || h < 3 {
        return out;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = [0u32; 3];
            for dy in 0..3 {
                for dx in 0..3 {
                    let weight = if dx == 1 && dy == 1 { 5 } else { 1 };
                    let p = img.get_pixel(x + dx - 1, y + dy - 1);
                    for (a, c) in acc.iter_mut().zip(p.0) {
                        *a += u32::from(c) * weight;
                    }
                }
            }
            let target = out.get_pixel_mut(x, y);
            for i in 0..3 {
                target[i] = ((acc[i] + 6) / 13) as u8;
            }
        }
    }
    out
}

/// Apply sharpness, then contrast, then brightness.
///
/// # Errors
///
/// Returns [`RenderError::InvalidArgument`] for invalid factors.
#[allow(clippy::cast_possible_truncation)]
pub fn enhance(img: &RgbaImage, params: &EnhanceParams) -> RenderResult<RgbaImage> {
    params.validate()?;
    let mut out = img.clone();

    let smoothed = smooth(&out);
    blend_from(&mut out, &smoothed, params.sharpness);

    let pixels = u64::from(out.width()) * u64::from(out.height());
    if pixels > 0 {
        let luma_sum: u64 = out
            .pixels()
            .map(|p| {
                (u64::from(p[0]) * 299 + u64::from(p[1]) * 587 + u64::from(p[2]) * 114 + 500) / 1000
            })
            .sum();
        let mean = ((luma_sum + pixels / 2) / pixels) as u8;
        let grey = RgbaImage::from_pixel(out.width(), out.height(), Rgba([mean, mean, mean, 255]));
        blend_from(&mut out, &grey, params.contrast);
    }

    let black = RgbaImage::from_pixel(out.width(), out.height(), Rgba([0, 0, 0, 255]));
    blend_from(&mut out, &black, params.brightness);
    Ok(out)
}

/// Named output size for a sales channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPreset {
    /// Channel name, e.g. `instagram_square`.
    pub name: String,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Scale the product to 85% and centre it on white instead of stretching.
    #[serde(default)]
    pub pad_on_white: bool,
}

impl ChannelPreset {
    fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            pad_on_white: false,
        }
    }
}

/// Product share of the frame for padded channels.
const PADDED_COVERAGE: f64 = 0.85;

/// The built-in channel presets, plus a `custom` one when a size is given.
#[must_use]
pub fn channel_presets(custom: Option<(u32, u32)>) -> Vec<ChannelPreset> {
    let mut presets = vec![
        ChannelPreset::new("instagram_square", 1080, 1080),
        ChannelPreset::new("instagram_portrait", 1080, 1350),
        ChannelPreset {
            pad_on_white: true,
            ..ChannelPreset::new("amazon", 2000, 2000)
        },
        ChannelPreset::new("thumbnail", 300, 300),
        ChannelPreset::new("website_banner", 1920, 1080),
        ChannelPreset::new("flipkart", 1600, 2000),
    ];
    if let Some((width, height)) = custom.filter(|&(w, h)| w > 0 && h > 0) {
        presets.push(ChannelPreset::new("custom", width, height));
    }
    presets
}

/// Produce the output for one channel.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn resize_for_channel(img: &RgbaImage, preset: &ChannelPreset) -> RgbaImage {
    if !preset.pad_on_white {
        return resize(img, preset.width, preset.height);
    }
    let inner_w = ((f64::from(preset.width) * PADDED_COVERAGE) as u32).max(1);
    let inner_h = ((f64::from(preset.height) * PADDED_COVERAGE) as u32).max(1);
    let product = resize(img, inner_w, inner_h);
    let mut frame = RgbaImage::from_pixel(preset.width, preset.height, Rgba([255, 255, 255, 255]));
    overlay(
        &mut frame,
        &product,
        i64::from((preset.width - inner_w) / 2),
        i64::from((preset.height - inner_h) / 2),
    );
    frame
}

/// One step in a transform pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ImageOp {
    /// Crop by mode.
    Crop(CropMode),
    /// Stretch to an explicit size.
    Resize {
        /// Output width.
        width: u32,
        /// Output height.
        height: u32,
    },
    /// Sharpness/contrast/brightness.
    Enhance(EnhanceParams),
    /// Fit to a sales channel.
    Channel(ChannelPreset),
}

impl ImageOp {
    /// Apply this step.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidArgument`] for zero sizes or invalid
    /// enhancement factors.
    pub fn apply(&self, img: &RgbaImage) -> RenderResult<RgbaImage> {
        match self {
            Self::Crop(mode) => {
                if let CropMode::Custom { width: 0, .. } | CropMode::Custom { height: 0, .. } = mode {
                    return Err(RenderError::InvalidArgument(
                        "custom crop requires width and height".to_string(),
                    ));
                }
                Ok(crop(img, *mode))
            }
            Self::Resize { width, height } => {
                if *width == 0 || *height == 0 {
                    return Err(RenderError::InvalidArgument(format!(
                        "resize to {width}x{height} must be positive"
                    )));
                }
                Ok(resize(img, *width, *height))
            }
            Self::Enhance(params) => enhance(img, params),
            Self::Channel(preset) => {
                if preset.width == 0 || preset.height == 0 {
                    return Err(RenderError::InvalidArgument(format!(
                        "channel {} has an empty size",
                        preset.name
                    )));
                }
                Ok(resize_for_channel(img, preset))
            }
        }
    }
}

/// Run `ops` in order.
///
/// # Errors
///
/// Stops at the first failing step and returns its error.
pub fn apply_ops(img: RgbaImage, ops: &[ImageOp]) -> RenderResult<RgbaImage> {
    ops.iter().try_fold(img, |current, op| {
        tracing::debug!("Applying {op:?} to {}x{}", current.width(), current.height());
        op.apply(&current)
    })
}
