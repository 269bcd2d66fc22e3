//! Projects - the canvas documents layers are painted onto.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult, Layer, LayerId, LayerPatch, Rgb};

/// Default canvas width for new projects.
pub const DEFAULT_WIDTH: u32 = 1080;

/// Default canvas height for new projects.
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Unique identifier for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Create a new unique project ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a project ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the string is not a UUID.
    pub fn parse(s: &str) -> CoreResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CoreError::invalid(format!("invalid project id '{s}': {e}")))
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A canvas document: size, background, layers in paint order and the
/// undo/redo stacks.
///
/// `layers[0]` is painted first. `history` holds full copies of earlier
/// layer lists, oldest first; `future` holds undone states, the most recent
/// undo last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: ProjectId,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Canvas fill beneath all layers.
    pub background_color: Rgb,
    /// Layers in paint order.
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Snapshots for undo.
    #[serde(default)]
    pub history: Vec<Vec<Layer>>,
    /// Snapshots for redo.
    #[serde(default)]
    pub future: Vec<Vec<Layer>>,
}

impl Project {
    /// Create an empty project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if either dimension is zero.
    pub fn new(width: u32, height: u32, background_color: Rgb) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::invalid(format!(
                "canvas size {width}x{height} must be positive"
            )));
        }
        Ok(Self {
            id: ProjectId::new(),
            width,
            height,
            background_color,
            layers: Vec::new(),
            history: Vec::new(),
            future: Vec::new(),
        })
    }

    /// Append a layer under a freshly generated id and return that id.
    ///
    /// Callers are expected to [`snapshot`](Self::snapshot) first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the layer is invalid.
    pub fn add_layer(&mut self, mut layer: Layer) -> CoreResult<LayerId> {
        layer.validate()?;
        let mut id = LayerId::new();
        while self.layer(id).is_some() {
            id = LayerId::new();
        }
        layer.layer_id = id;
        self.layers.push(layer);
        Ok(id)
    }

    /// Merge `patch` into the layer with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LayerNotFound`] if no layer has that id, or
    /// [`CoreError::InvalidArgument`] if the patch is rejected.
    pub fn update_layer(&mut self, id: LayerId, patch: &LayerPatch) -> CoreResult<&Layer> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.layer_id == id)
            .ok_or_else(|| CoreError::LayerNotFound(id.to_string()))?;
        layer.apply(patch)?;
        Ok(layer)
    }

    /// Replace the whole layer list, e.g. with an autofixed copy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if any layer is invalid or ids repeat.
    pub fn replace_layers(&mut self, layers: Vec<Layer>) -> CoreResult<()> {
        let mut seen = std::collections::HashSet::with_capacity(layers.len());
        for layer in &layers {
            layer.validate()?;
            if !seen.insert(layer.layer_id) {
                return Err(CoreError::invalid(format!(
                    "duplicate layer id {}",
                    layer.layer_id
                )));
            }
        }
        self.layers = layers;
        Ok(())
    }

    /// Get a layer by id.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.layer_id == id)
    }

    /// Text layers in paint order.
    pub fn text_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.is_text())
    }

    /// Image layers in paint order.
    pub fn image_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.is_image())
    }

    /// Length of the shorter canvas side.
    #[must_use]
    pub fn shorter_side(&self) -> u32 {
        self.width.min(self.height)
    }

    /// Number of layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Whether the project has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Serialize the project to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(CoreError::Serialization)
    }

    /// Deserialize a project from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(CoreError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LayerKind;

    fn project() -> Project {
        Project::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, Rgb::WHITE).expect("project")
    }

    #[test]
    fn test_new_project_is_empty() {
        let p = project();
        assert!(p.is_empty());
        assert!(p.history.is_empty());
        assert!(p.future.is_empty());
        assert_eq!(p.shorter_side(), 1080);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            Project::new(0, 100, Rgb::WHITE),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_add_layer_assigns_fresh_id() {
        let mut p = project();
        let layer = Layer::text("Hello", 24, Rgb::BLACK);
        let original_id = layer.layer_id;
        let first = p.add_layer(layer.clone()).expect("add");
        let second = p.add_layer(layer).expect("add");
        assert_ne!(first, original_id);
        assert_ne!(first, second);
        assert_eq!(p.layer_count(), 2);
        assert_eq!(p.layers[0].layer_id, first);
    }

    #[test]
    fn test_update_layer() {
        let mut p = project();
        let id = p.add_layer(Layer::image("a", 100, 100)).expect("add");
        let patch = LayerPatch {
            x: Some(40),
            width: Some(250),
            ..LayerPatch::default()
        };
        p.update_layer(id, &patch).expect("update");
        let layer = p.layer(id).expect("layer");
        assert_eq!(layer.x, 40);
        assert!(matches!(layer.kind, LayerKind::Image { width: 250, .. }));
    }

    #[test]
    fn test_update_missing_layer() {
        let mut p = project();
        let result = p.update_layer(LayerId::new(), &LayerPatch::default());
        assert!(matches!(result, Err(CoreError::LayerNotFound(_))));
    }

    #[test]
    fn test_replace_layers_rejects_duplicate_ids() {
        let mut p = project();
        let layer = Layer::text("a", 12, Rgb::BLACK);
        let result = p.replace_layers(vec![layer.clone(), layer]);
        assert!(matches!(result, Err(CoreError::InvalidArgument(_))));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut p = project();
        p.add_layer(Layer::text("Sale", 32, Rgb::new(200, 0, 0)).at(5, 6))
            .expect("add");
        p.snapshot();
        let json = p.to_json().expect("json");
        assert_eq!(Project::from_json(&json).expect("parse"), p);
    }

    #[test]
    fn test_layer_filters_preserve_order() {
        let mut p = project();
        p.add_layer(Layer::image("a", 10, 10)).expect("add");
        p.add_layer(Layer::text("t1", 12, Rgb::BLACK)).expect("add");
        p.add_layer(Layer::image("b", 10, 10)).expect("add");
        p.add_layer(Layer::text("t2", 12, Rgb::BLACK)).expect("add");
        let texts: Vec<_> = p
            .text_layers()
            .map(|l| match &l.kind {
                LayerKind::Text { text, .. } => text.clone(),
                LayerKind::Image { .. } => String::new(),
            })
            .collect();
        assert_eq!(texts, ["t1", "t2"]);
        assert_eq!(p.image_layers().count(), 2);
    }
}
