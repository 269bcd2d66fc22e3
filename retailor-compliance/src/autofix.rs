//! Automatic repair of guideline violations.
//!
//! Fixes are computed on a working copy of the layers, compositing it one
//! layer at a time as each is repaired. Nothing is persisted here; callers
//! decide whether to apply [`AutofixOutcome::layers`].

use image::RgbaImage;
use retailor_core::{Guideline, Layer, LayerId, LayerKind, Project, Rgb};
use retailor_renderer::Compositor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::contrast::{best_text_color, contrast_ratio};
use crate::metrics::{breaches_margin, sample_mean_rgb};

/// A single applied fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "fix", rename_all = "snake_case")]
pub enum Fix {
    /// Font size raised to the minimum.
    IncreaseFont {
        /// Previous size.
        from: u32,
        /// New size.
        to: u32,
    },
    /// Text colour switched to black or white.
    ColorContrast {
        /// Previous colour.
        from: Rgb,
        /// New colour.
        to: Rgb,
    },
    /// Logo pushed away from the top/left edges.
    MoveLogoInsideMargin {
        /// Previous position.
        from: (i32, i32),
        /// New position.
        to: (i32, i32),
    },
}

/// A fix tied to the layer it changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixChange {
    /// Changed layer.
    pub layer_id: LayerId,
    /// What changed.
    #[serde(flatten)]
    pub fix: Fix,
}

/// Result of an autofix pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutofixOutcome {
    /// Whether any layer differs from the input.
    pub changed: bool,
    /// Fixes in the order they were made.
    pub changes: Vec<FixChange>,
    /// The repaired layer list; equal to the input when nothing changed.
    #[serde(skip)]
    pub layers: Vec<Layer>,
}

/// Computes fixes for guideline violations.
#[derive(Debug, Clone)]
pub struct AutofixEngine {
    compositor: Compositor,
}

impl AutofixEngine {
    /// Create an engine rendering through `compositor`.
    #[must_use]
    pub fn new(compositor: Compositor) -> Self {
        Self { compositor }
    }

    /// Compute fixes for `project` under `guideline`.
    ///
    /// Layers are visited bottom to top against a canvas holding only the
    /// already-fixed layers beneath them, so a text layer's colour is chosen
    /// from what is behind it and never from its own glyphs. Per text layer
    /// the font size is raised first, then the colour is checked under the
    /// resized text box. Logos too close to the top or left edge are moved
    /// to the margin; logos that only breach the right or bottom edge are
    /// left alone.
    #[must_use]
    pub fn autofix(&self, project: &Project, guideline: &Guideline) -> AutofixOutcome {
        let margin = guideline.logo_margin_px(project.width, project.height);
        let mut canvas = Compositor::background(project);
        let mut layers = project.layers.clone();
        let mut changes = Vec::new();

        for layer in &mut layers {
            if layer.is_text() {
                self.fix_text(layer, &canvas, guideline, &mut changes);
            } else if layer.is_logo() {
                fix_logo(layer, project, margin, &mut changes);
            }
            if let Err(e) = self.compositor.render_layer(&mut canvas, layer) {
                warn!(project_id = %project.id, "{e}");
            }
        }

        debug!(
            project_id = %project.id,
            retailer = %guideline.retailer,
            "Autofix produced {} changes",
            changes.len()
        );
        AutofixOutcome {
            changed: !changes.is_empty(),
            changes,
            layers,
        }
    }

    fn fix_text(
        &self,
        layer: &mut Layer,
        below: &RgbaImage,
        guideline: &Guideline,
        changes: &mut Vec<FixChange>,
    ) {
        let rules = &guideline.rules;
        let layer_id = layer.layer_id;
        let origin = (layer.x, layer.y);
        let LayerKind::Text {
            text,
            font_size,
            color,
        } = &mut layer.kind
        else {
            return;
        };

        if *font_size < rules.min_font_size {
            changes.push(FixChange {
                layer_id,
                fix: Fix::IncreaseFont {
                    from: *font_size,
                    to: rules.min_font_size,
                },
            });
            *font_size = rules.min_font_size;
        }

        let bbox = match self.compositor.fonts().measure(text, *font_size, origin) {
            Ok(bbox) => bbox,
            Err(e) => {
                warn!(%layer_id, "Skipping contrast fix: {e}");
                return;
            }
        };
        let behind = sample_mean_rgb(below, bbox);
        if contrast_ratio(*color, behind) >= rules.min_contrast_ratio {
            return;
        }
        let preferred = best_text_color(behind);
        if preferred != *color {
            changes.push(FixChange {
                layer_id,
                fix: Fix::ColorContrast {
                    from: *color,
                    to: preferred,
                },
            });
            *color = preferred;
        }
    }
}

fn fix_logo(layer: &mut Layer, project: &Project, margin: i64, changes: &mut Vec<FixChange>) {
    let Some(bounds) = layer.image_bounds() else {
        return;
    };
    if !breaches_margin(bounds, project.width, project.height, margin) {
        return;
    }
    let (x, y) = (layer.x, layer.y);
    let clamp = |v: i32| i32::try_from(i64::from(v).max(margin)).unwrap_or(i32::MAX);
    let to = (clamp(x), clamp(y));
    if to != (x, y) {
        changes.push(FixChange {
            layer_id: layer.layer_id,
            fix: Fix::MoveLogoInsideMargin { from: (x, y), to },
        });
        layer.x = to.0;
        layer.y = to.1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use retailor_core::{MemoryBlobStore, LOGO_ROLE};

    use super::*;
    use crate::check::{ComplianceEngine, ViolationCode};

    fn compositor() -> Compositor {
        Compositor::with_builtin_font(Arc::new(MemoryBlobStore::new()))
    }

    #[test]
    fn test_shop_now_is_repaired() {
        let mut project = Project::new(1080, 1080, Rgb::WHITE).expect("project");
        let id = project
            .add_layer(Layer::text("Shop Now", 10, Rgb::WHITE))
            .expect("add");
        let guideline = Guideline::retailer_a();

        let outcome = AutofixEngine::new(compositor()).autofix(&project, &guideline);
        assert!(outcome.changed);
        assert_eq!(
            outcome.changes,
            [
                FixChange {
                    layer_id: id,
                    fix: Fix::IncreaseFont { from: 10, to: 18 },
                },
                FixChange {
                    layer_id: id,
                    fix: Fix::ColorContrast {
                        from: Rgb::WHITE,
                        to: Rgb::BLACK,
                    },
                },
            ]
        );

        project.replace_layers(outcome.layers).expect("replace");
        let remaining = ComplianceEngine::new(compositor()).check(&project, &guideline);
        assert!(remaining.is_empty(), "{remaining:?}");
    }

    #[test]
    fn test_autofix_is_idempotent() {
        let mut project = Project::new(1080, 1080, Rgb::WHITE).expect("project");
        project
            .add_layer(Layer::text("Sale", 12, Rgb::new(250, 250, 250)).at(30, 40))
            .expect("add");
        project
            .add_layer(Layer::image("logo", 100, 60).at(5, 1000).with_role(LOGO_ROLE))
            .expect("add");
        let guideline = Guideline::retailer_a();
        let engine = AutofixEngine::new(compositor());

        let first = engine.autofix(&project, &guideline);
        assert!(first.changed);
        project.replace_layers(first.layers).expect("replace");

        let second = engine.autofix(&project, &guideline);
        assert!(!second.changed);
        assert!(second.changes.is_empty());
        assert_eq!(second.layers, project.layers);
    }

    #[test]
    fn test_autofix_is_idempotent_across_backgrounds() {
        let guideline = Guideline::retailer_a();
        let engine = AutofixEngine::new(compositor());

        for bg in [0u8, 20, 90, 128, 160, 196, 254] {
            for text in ["BBBB", "MMMM", "Shop Now", "8888"] {
                let shade = Rgb::new(bg, bg, bg);
                let mut project = Project::new(1080, 1080, shade).expect("project");
                project
                    .add_layer(Layer::text(text, 200, shade))
                    .expect("add");

                let first = engine.autofix(&project, &guideline);
                assert!(first.changed, "bg={bg} {text}");
                project.replace_layers(first.layers).expect("replace");

                let second = engine.autofix(&project, &guideline);
                assert!(second.changes.is_empty(), "bg={bg} {text}: {:?}", second.changes);
            }
        }
    }

    #[test]
    fn test_contrast_fix_ignores_own_glyphs() {
        let dark = Rgb::new(20, 20, 20);
        let mut project = Project::new(1080, 1080, dark).expect("project");
        let id = project
            .add_layer(Layer::text("BBBB", 200, dark))
            .expect("add");

        let outcome = AutofixEngine::new(compositor()).autofix(&project, &Guideline::retailer_a());
        assert_eq!(
            outcome.changes,
            [FixChange {
                layer_id: id,
                fix: Fix::ColorContrast {
                    from: dark,
                    to: Rgb::WHITE,
                },
            }]
        );
    }

    #[test]
    fn test_lower_layers_are_fixed_before_sampling() {
        // The bottom text is repaired to black; the top text sits on it and
        // must be judged against the repaired glyphs, so a second run agrees.
        let mut project = Project::new(400, 400, Rgb::WHITE).expect("project");
        project
            .add_layer(Layer::text("MMMM", 160, Rgb::WHITE))
            .expect("add");
        project
            .add_layer(Layer::text("MM", 40, Rgb::new(120, 120, 120)).at(10, 10))
            .expect("add");
        let guideline = Guideline::retailer_a();
        let engine = AutofixEngine::new(compositor());

        let first = engine.autofix(&project, &guideline);
        project.replace_layers(first.layers).expect("replace");
        assert!(engine.autofix(&project, &guideline).changes.is_empty());
    }

    #[test]
    fn test_logo_clamps_near_edges_only() {
        let mut project = Project::new(1080, 1080, Rgb::WHITE).expect("project");
        let id = project
            .add_layer(Layer::image("logo", 100, 100).at(-20, 10).with_role(LOGO_ROLE))
            .expect("add");
        let outcome = AutofixEngine::new(compositor()).autofix(&project, &Guideline::retailer_a());
        assert_eq!(
            outcome.changes,
            [FixChange {
                layer_id: id,
                fix: Fix::MoveLogoInsideMargin {
                    from: (-20, 10),
                    to: (54, 54),
                },
            }]
        );
        assert_eq!((outcome.layers[0].x, outcome.layers[0].y), (54, 54));
    }

    #[test]
    fn test_far_edge_logo_is_reported_but_not_moved() {
        let mut project = Project::new(1080, 1080, Rgb::WHITE).expect("project");
        project
            .add_layer(Layer::image("logo", 100, 100).at(1000, 500).with_role(LOGO_ROLE))
            .expect("add");
        let guideline = Guideline::retailer_a();

        let outcome = AutofixEngine::new(compositor()).autofix(&project, &guideline);
        assert!(!outcome.changed);

        let violations = ComplianceEngine::new(compositor()).check(&project, &guideline);
        assert_eq!(violations[0].code, ViolationCode::LogoMarginViolation);
    }

    #[test]
    fn test_compliant_project_unchanged() {
        let mut project = Project::new(1080, 1080, Rgb::WHITE).expect("project");
        project
            .add_layer(Layer::text("Fine", 30, Rgb::BLACK).at(100, 100))
            .expect("add");
        let outcome = AutofixEngine::new(compositor()).autofix(&project, &Guideline::retailer_a());
        assert!(!outcome.changed);
        assert_eq!(outcome.layers, project.layers);
    }

    #[test]
    fn test_change_json_shape() {
        let change = FixChange {
            layer_id: LayerId::new(),
            fix: Fix::ColorContrast {
                from: Rgb::WHITE,
                to: Rgb::BLACK,
            },
        };
        let json = serde_json::to_value(&change).expect("serialize");
        assert_eq!(json["fix"], "color_contrast");
        assert_eq!(json["from"], "#FFFFFF");
        assert_eq!(json["to"], "#000000");
    }
}
