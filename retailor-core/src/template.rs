//! Starter layouts that can be stamped onto a project.

use serde::{Deserialize, Serialize};

use crate::{AssetId, CoreError, CoreResult, Layer, LayerId, Project, Rgb};

/// A reusable layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Display name, also the lookup key.
    pub name: String,
    /// Intended canvas width.
    pub width: u32,
    /// Intended canvas height.
    pub height: u32,
    /// Intended background.
    pub background_color: Rgb,
    /// Layers copied into the project.
    pub layers: Vec<Layer>,
}

impl Template {
    /// Append copies of this template's layers to `project` under fresh ids.
    ///
    /// Callers are expected to snapshot first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if a template layer is invalid.
    pub fn apply_to(&self, project: &mut Project) -> CoreResult<Vec<LayerId>> {
        self.layers
            .iter()
            .map(|layer| project.add_layer(layer.clone()))
            .collect()
    }
}

/// The set of available templates.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TemplateLibrary {
    /// Library holding the built-in layouts. Image placeholders carry an
    /// empty asset id until the user swaps in a product shot.
    #[must_use]
    pub fn with_defaults() -> Self {
        let placeholder = || AssetId::new("");
        let headline = "Your Headline Here";
        Self {
            templates: vec![
                Template {
                    name: "Centered Hero".to_string(),
                    width: 1080,
                    height: 1080,
                    background_color: Rgb::WHITE,
                    layers: vec![
                        Layer::image(placeholder(), 680, 680).at(200, 200),
                        Layer::text(headline, 64, Rgb::BLACK).at(150, 920),
                        Layer::text("Shop Now", 48, Rgb::BLACK).at(380, 1000),
                    ],
                },
                Template {
                    name: "Left Hero + Right Text".to_string(),
                    width: 1080,
                    height: 1080,
                    background_color: Rgb::WHITE,
                    layers: vec![
                        Layer::image(placeholder(), 500, 500).at(100, 200),
                        Layer::text(headline, 60, Rgb::BLACK).at(650, 250),
                        Layer::text("Shop Now", 46, Rgb::BLACK).at(650, 350),
                    ],
                },
                Template {
                    name: "Full Background".to_string(),
                    width: 1080,
                    height: 1080,
                    background_color: Rgb::WHITE,
                    layers: vec![
                        Layer::image(placeholder(), 600, 600).at(240, 240),
                        Layer::text(headline, 62, Rgb::BLACK).at(100, 900),
                    ],
                },
            ],
        }
    }

    /// Add a template, replacing any with the same name.
    pub fn insert(&mut self, template: Template) {
        self.templates.retain(|t| t.name != template.name);
        self.templates.push(template);
    }

    /// Look up a template by name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TemplateNotFound`] for unknown names.
    pub fn get(&self, name: &str) -> CoreResult<&Template> {
        self.templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| CoreError::TemplateNotFound(name.to_string()))
    }

    /// All templates in insertion order.
    #[must_use]
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let library = TemplateLibrary::with_defaults();
        let names: Vec<_> = library.templates().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            ["Centered Hero", "Left Hero + Right Text", "Full Background"]
        );
    }

    #[test]
    fn test_apply_uses_fresh_ids() {
        let library = TemplateLibrary::with_defaults();
        let template = library.get("Centered Hero").expect("template");
        let mut project = Project::new(1080, 1080, Rgb::WHITE).expect("project");

        let ids = template.apply_to(&mut project).expect("apply");
        assert_eq!(ids.len(), 3);
        for (id, layer) in ids.iter().zip(&template.layers) {
            assert_ne!(*id, layer.layer_id);
        }

        template.apply_to(&mut project).expect("apply twice");
        assert_eq!(project.layer_count(), 6);
    }

    #[test]
    fn test_unknown_template() {
        let library = TemplateLibrary::with_defaults();
        assert!(matches!(
            library.get("Nope"),
            Err(CoreError::TemplateNotFound(_))
        ));
    }
}
