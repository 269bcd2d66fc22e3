//! Layers - the positioned, orderable building blocks of a project.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AssetId, CoreError, CoreResult, Rect, Rgb};

/// Role tag marking an image layer as the brand logo.
pub const LOGO_ROLE: &str = "logo";

/// Unique identifier for a layer within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Create a new unique layer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a layer ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the string is not a UUID.
    pub fn parse(s: &str) -> CoreResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CoreError::invalid(format!("invalid layer id '{s}': {e}")))
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-form metadata attached to an image layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMeta {
    /// Semantic role, e.g. `"logo"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// The content a layer carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    /// A raster asset stretched to `width × height`.
    Image {
        /// Blob store reference; not owned by the project.
        asset_id: AssetId,
        /// Target render width.
        width: u32,
        /// Target render height.
        height: u32,
        /// Optional metadata such as the logo role.
        #[serde(default)]
        meta: LayerMeta,
    },

    /// A single run of text.
    Text {
        /// Text content, no wrapping.
        text: String,
        /// Font size in pixels.
        font_size: u32,
        /// Fill color.
        color: Rgb,
    },
}

const fn default_opacity() -> f32 {
    1.0
}

/// A layer with placement and content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique identifier, assigned when the layer is added.
    pub layer_id: LayerId,
    /// Left edge of the placement.
    #[serde(default)]
    pub x: i32,
    /// Top edge of the placement.
    #[serde(default)]
    pub y: i32,
    /// Counter-clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f32,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Layer content.
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    /// Create a layer at the origin with default rotation and opacity.
    #[must_use]
    pub fn new(kind: LayerKind) -> Self {
        Self {
            layer_id: LayerId::new(),
            x: 0,
            y: 0,
            rotation: 0.0,
            opacity: 1.0,
            kind,
        }
    }

    /// Create an image layer.
    #[must_use]
    pub fn image(asset_id: impl Into<AssetId>, width: u32, height: u32) -> Self {
        Self::new(LayerKind::Image {
            asset_id: asset_id.into(),
            width,
            height,
            meta: LayerMeta::default(),
        })
    }

    /// Create a text layer.
    #[must_use]
    pub fn text(text: impl Into<String>, font_size: u32, color: Rgb) -> Self {
        Self::new(LayerKind::Text {
            text: text.into(),
            font_size,
            color,
        })
    }

    /// Set the placement.
    #[must_use]
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Tag an image layer with a role. No-op for text layers.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        if let LayerKind::Image { meta, .. } = &mut self.kind {
            meta.role = Some(role.into());
        }
        self
    }

    /// Whether this is a text layer.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, LayerKind::Text { .. })
    }

    /// Whether this is an image layer.
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self.kind, LayerKind::Image { .. })
    }

    /// Whether this is an image layer tagged as the logo.
    #[must_use]
    pub fn is_logo(&self) -> bool {
        matches!(&self.kind, LayerKind::Image { meta, .. } if meta.role.as_deref() == Some(LOGO_ROLE))
    }

    /// Unrotated placement box of an image layer.
    #[must_use]
    pub fn image_bounds(&self) -> Option<Rect> {
        match self.kind {
            LayerKind::Image { width, height, .. } => Some(Rect::new(
                i64::from(self.x),
                i64::from(self.y),
                u64::from(width),
                u64::from(height),
            )),
            LayerKind::Text { .. } => None,
        }
    }

    /// Check the layer invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for opacity outside `[0, 1]`,
    /// non-finite rotation, zero font size or zero image dimensions.
    pub fn validate(&self) -> CoreResult<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(CoreError::invalid(format!(
                "opacity {} outside [0, 1]",
                self.opacity
            )));
        }
        if !self.rotation.is_finite() {
            return Err(CoreError::invalid("rotation must be finite"));
        }
        match &self.kind {
            LayerKind::Image { width, height, .. } if *width == 0 || *height == 0 => Err(
                CoreError::invalid(format!("image size {width}x{height} must be positive")),
            ),
            LayerKind::Text { font_size: 0, .. } => {
                Err(CoreError::invalid("font_size must be positive"))
            }
            _ => Ok(()),
        }
    }

    /// Merge a patch into this layer.
    ///
    /// The patch is applied to a copy first, so a rejected patch leaves the
    /// layer untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if a field does not apply to this
    /// layer's variant or the result violates [`Layer::validate`].
    pub fn apply(&mut self, patch: &LayerPatch) -> CoreResult<()> {
        let mut next = self.clone();
        if let Some(x) = patch.x {
            next.x = x;
        }
        if let Some(y) = patch.y {
            next.y = y;
        }
        if let Some(rotation) = patch.rotation {
            next.rotation = rotation;
        }
        if let Some(opacity) = patch.opacity {
            next.opacity = opacity;
        }
        match &mut next.kind {
            LayerKind::Image {
                asset_id,
                width,
                height,
                meta,
            } => {
                if let Some(field) = patch.text_field() {
                    return Err(CoreError::invalid(format!(
                        "field `{field}` does not apply to an image layer"
                    )));
                }
                if let Some(id) = &patch.asset_id {
                    *asset_id = id.clone();
                }
                if let Some(w) = patch.width {
                    *width = w;
                }
                if let Some(h) = patch.height {
                    *height = h;
                }
                if let Some(role) = &patch.role {
                    meta.role = (!role.is_empty()).then(|| role.clone());
                }
            }
            LayerKind::Text {
                text,
                font_size,
                color,
            } => {
                if let Some(field) = patch.image_field() {
                    return Err(CoreError::invalid(format!(
                        "field `{field}` does not apply to a text layer"
                    )));
                }
                if let Some(t) = &patch.text {
                    text.clone_from(t);
                }
                if let Some(size) = patch.font_size {
                    *font_size = size;
                }
                if let Some(c) = patch.color {
                    *color = c;
                }
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Partial update for a layer; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerPatch {
    /// New left edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    /// New top edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    /// New rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    /// New opacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    /// Image only: new asset reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<AssetId>,
    /// Image only: new render width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Image only: new render height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Image only: new role; an empty string clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text only: new content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Text only: new font size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    /// Text only: new color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
}

impl LayerPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn image_field(&self) -> Option<&'static str> {
        if self.asset_id.is_some() {
            Some("asset_id")
        } else if self.width.is_some() {
            Some("width")
        } else if self.height.is_some() {
            Some("height")
        } else if self.role.is_some() {
            Some("role")
        } else {
            None
        }
    }

    fn text_field(&self) -> Option<&'static str> {
        if self.text.is_some() {
            Some("text")
        } else if self.font_size.is_some() {
            Some("font_size")
        } else if self.color.is_some() {
            Some("color")
        } else {
            None
        }
    }
}
