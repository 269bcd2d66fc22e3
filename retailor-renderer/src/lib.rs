//! # Retailor Renderer
//!
//! Deterministic CPU compositing of Retailor projects.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Compositor                  │
//! ├──────────────┬──────────────┬───────────────┤
//! │ BlobStore    │ decode +     │ FontRasterizer│
//! │ (assets)     │ raster ops   │ (text)        │
//! └──────────────┴──────────────┴───────────────┘
//!                       │
//!              RgbaImage / RgbImage ──► export (PNG, JPEG)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod composite;
pub mod error;
pub mod export;
pub mod font;
pub mod image;
pub mod raster;
pub mod transform;

pub use composite::Compositor;
pub use error::{LayerRenderError, RenderError, RenderResult};
pub use export::{encode, encode_jpeg, encode_png, ExportConfig, ExportFormat};
pub use font::{BuiltinFont, FontRasterizer};
#[cfg(feature = "system-fonts")]
pub use font::SystemFontRasterizer;
pub use transform::{
    apply_ops, channel_presets, crop, enhance, resize_for_channel, ChannelPreset, CropMode,
    EnhanceParams, ImageOp,
};

/// Raster types produced by the compositor.
pub use ::image::{RgbImage, RgbaImage};
