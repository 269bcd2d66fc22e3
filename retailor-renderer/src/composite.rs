//! Project compositing.
//!
//! ```text
//! background ──► layer[0] ──► layer[1] ──► … ──► RgbaImage
//!                   │
//!                   ├─ image: fetch ► decode ► stretch ► rotate ► opacity ► paint
//!                   └─ text:  measure ► paint (scratch layer when translucent)
//! ```
//!
//! A layer that fails is logged and skipped; the rest of the canvas still
//! renders.

use std::sync::Arc;

use image::{DynamicImage, Rgba, RgbImage, RgbaImage};
use retailor_core::{AssetId, BlobStore, Layer, LayerKind, Project, Rgb};
use tracing::{debug, warn};

use crate::error::{LayerRenderError, RenderError, RenderResult};
use crate::font::{BuiltinFont, FontRasterizer};
use crate::raster::{overlay, rotate_expand, scale_alpha, stretch};

/// Renders projects against a blob store and a font rasterizer.
#[derive(Debug, Clone)]
pub struct Compositor {
    blobs: Arc<dyn BlobStore>,
    fonts: Arc<dyn FontRasterizer>,
}

impl Compositor {
    /// Create a compositor.
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStore>, fonts: Arc<dyn FontRasterizer>) -> Self {
        Self { blobs, fonts }
    }

    /// Create a compositor using the [`BuiltinFont`].
    #[must_use]
    pub fn with_builtin_font(blobs: Arc<dyn BlobStore>) -> Self {
        Self::new(blobs, Arc::new(BuiltinFont::new()))
    }

    /// The font rasterizer used for text layers.
    #[must_use]
    pub fn fonts(&self) -> &dyn FontRasterizer {
        self.fonts.as_ref()
    }

    /// Render a project to RGBA.
    ///
    /// Never fails as a whole: layers that cannot be painted are skipped.
    #[must_use]
    pub fn render(&self, project: &Project) -> RgbaImage {
        let mut canvas = Self::background(project);
        for layer in &project.layers {
            if let Err(e) = self.render_layer(&mut canvas, layer) {
                warn!(project_id = %project.id, "{e}");
            }
        }
        canvas
    }

    /// An opaque canvas filled with the project's background colour.
    #[must_use]
    pub fn background(project: &Project) -> RgbaImage {
        RgbaImage::from_pixel(
            project.width,
            project.height,
            Rgba(project.background_color.with_alpha(255)),
        )
    }

    /// Render a project flattened to RGB.
    #[must_use]
    pub fn render_rgb(&self, project: &Project) -> RgbImage {
        DynamicImage::ImageRgba8(self.render(project)).to_rgb8()
    }

    /// Paint one layer onto `canvas`.
    ///
    /// # Errors
    ///
    /// Returns a [`LayerRenderError`] naming the layer if its asset is
    /// missing or undecodable, or if its text cannot be rasterized.
    pub fn render_layer(&self, canvas: &mut RgbaImage, layer: &Layer) -> Result<(), LayerRenderError> {
        let result = match &layer.kind {
            LayerKind::Image {
                asset_id,
                width,
                height,
                ..
            } => self.paint_image(canvas, layer, asset_id, *width, *height),
            LayerKind::Text {
                text,
                font_size,
                color,
            } => self.paint_text(canvas, layer, text, *font_size, *color),
        };
        result.map_err(|source| LayerRenderError {
            layer_id: layer.layer_id,
            source,
        })
    }

    fn paint_image(
        &self,
        canvas: &mut RgbaImage,
        layer: &Layer,
        asset_id: &AssetId,
        width: u32,
        height: u32,
    ) -> RenderResult<()> {
        let bytes = self.blobs.get(asset_id)?;
        let decoded = crate::image::decode(&bytes)?;
        let mut img = rotate_expand(&stretch(&decoded, width, height), layer.rotation);
        scale_alpha(&mut img, layer.opacity);
        debug!(
            layer_id = %layer.layer_id,
            "Painting image {asset_id} {}x{} at ({}, {})",
            img.width(),
            img.height(),
            layer.x,
            layer.y
        );
        overlay(canvas, &img, i64::from(layer.x), i64::from(layer.y));
        Ok(())
    }

    fn paint_text(
        &self,
        canvas: &mut RgbaImage,
        layer: &Layer,
        text: &str,
        font_size: u32,
        color: Rgb,
    ) -> RenderResult<()> {
        debug!(layer_id = %layer.layer_id, "Painting text at ({}, {})", layer.x, layer.y);
        if layer.opacity >= 1.0 {
            return self
                .fonts
                .paint(canvas, text, font_size, (layer.x, layer.y), color);
        }

        // Translucent text: paint into a scratch layer covering the visible
        // part of the text box.
        let bbox = self.fonts.measure(text, font_size, (layer.x, layer.y))?;
        let Some(clip) = bbox.clamp_to(canvas.width(), canvas.height()) else {
            return Ok(());
        };
        let (w, h) = (
            u32::try_from(clip.width).unwrap_or(u32::MAX),
            u32::try_from(clip.height).unwrap_or(u32::MAX),
        );
        let origin = |pos: i32, start: i64| {
            i32::try_from(i64::from(pos) - start)
                .map_err(|_| RenderError::InvalidArgument(format!("text origin {pos} out of range")))
        };
        let mut scratch = RgbaImage::new(w, h);
        self.fonts.paint(
            &mut scratch,
            text,
            font_size,
            (origin(layer.x, clip.x)?, origin(layer.y, clip.y)?),
            color,
        )?;
        scale_alpha(&mut scratch, layer.opacity);
        overlay(canvas, &scratch, clip.x, clip.y);
        Ok(())
    }
}
