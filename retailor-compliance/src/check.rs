//! Guideline checks against a rendered project.

use std::fmt;

use image::RgbImage;
use retailor_core::{Guideline, LayerId, LayerKind, Project};
use retailor_renderer::Compositor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::contrast::contrast_ratio;
use crate::metrics::{
    breaches_margin, covered_area, sample_mean_rgb, significant_overlap, OVERLAP_THRESHOLD,
};

/// Which rule a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    /// Canvas smaller than the required resolution.
    ResolutionLow,
    /// Text smaller than the minimum font size.
    FontTooSmall,
    /// Text does not stand out from what is behind it.
    LowContrast,
    /// Text boxes cover too much of the canvas.
    TextTooMuch,
    /// Logo too close to a canvas edge.
    LogoMarginViolation,
    /// Two images overlap heavily.
    ImageOverlap,
}

impl ViolationCode {
    /// Wire name, e.g. `LOW_CONTRAST`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolutionLow => "RESOLUTION_LOW",
            Self::FontTooSmall => "FONT_TOO_SMALL",
            Self::LowContrast => "LOW_CONTRAST",
            Self::TextTooMuch => "TEXT_TOO_MUCH",
            Self::LogoMarginViolation => "LOGO_MARGIN_VIOLATION",
            Self::ImageOverlap => "IMAGE_OVERLAP",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic.
    Low,
    /// Should be fixed before submission.
    Medium,
    /// Will be rejected.
    High,
}

/// One broken rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule identifier.
    pub code: ViolationCode,
    /// Severity.
    pub severity: Severity,
    /// Offending layer, when the rule concerns a single layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<LayerId>,
    /// Human readable explanation.
    pub message: String,
}

impl Violation {
    fn new(code: ViolationCode, severity: Severity, layer_id: Option<LayerId>, message: String) -> Self {
        Self {
            code,
            severity,
            layer_id,
            message,
        }
    }
}

/// Runs guideline checks.
#[derive(Debug, Clone)]
pub struct ComplianceEngine {
    compositor: Compositor,
}

impl ComplianceEngine {
    /// Create an engine rendering through `compositor`.
    #[must_use]
    pub fn new(compositor: Compositor) -> Self {
        Self { compositor }
    }

    /// Render the project and check it.
    #[must_use]
    pub fn check(&self, project: &Project, guideline: &Guideline) -> Vec<Violation> {
        let canvas = self.compositor.render_rgb(project);
        self.check_rendered(project, &canvas, guideline)
    }

    /// Check a project against an already rendered canvas.
    ///
    /// Violations come out in a fixed order: resolution, per-text rules in
    /// layer order, text coverage, logo margins, then image overlaps.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn check_rendered(
        &self,
        project: &Project,
        canvas: &RgbImage,
        guideline: &Guideline,
    ) -> Vec<Violation> {
        let rules = &guideline.rules;
        let mut violations = Vec::new();

        let required = rules.required_resolution;
        if !required.is_met_by(project.width, project.height) {
            violations.push(Violation::new(
                ViolationCode::ResolutionLow,
                Severity::High,
                None,
                format!(
                    "Canvas resolution {}x{} is below required {}x{}",
                    project.width, project.height, required.width, required.height
                ),
            ));
        }

        let fonts = self.compositor.fonts();
        let mut total_text_pixels: u64 = 0;
        for layer in &project.layers {
            let LayerKind::Text {
                text,
                font_size,
                color,
            } = &layer.kind
            else {
                continue;
            };

            if *font_size < rules.min_font_size {
                violations.push(Violation::new(
                    ViolationCode::FontTooSmall,
                    Severity::Medium,
                    Some(layer.layer_id),
                    format!(
                        "Text layer font size {font_size}px is smaller than required {}px",
                        rules.min_font_size
                    ),
                ));
            }

            let bbox = match fonts.measure(text, *font_size, (layer.x, layer.y)) {
                Ok(bbox) => bbox,
                Err(e) => {
                    warn!(layer_id = %layer.layer_id, "Skipping text measurement: {e}");
                    continue;
                }
            };
            total_text_pixels += covered_area(bbox, project.width, project.height);

            let sampled = sample_mean_rgb(canvas, bbox);
            let ratio = contrast_ratio(*color, sampled);
            debug!(layer_id = %layer.layer_id, "Contrast {ratio:.2} against {sampled}");
            if ratio < rules.min_contrast_ratio {
                violations.push(Violation::new(
                    ViolationCode::LowContrast,
                    if ratio < 3.0 {
                        Severity::High
                    } else {
                        Severity::Medium
                    },
                    Some(layer.layer_id),
                    format!(
                        "Text contrast ratio {ratio:.2} is below required {}",
                        rules.min_contrast_ratio
                    ),
                ));
            }
        }

        let canvas_area = u64::from(project.width) * u64::from(project.height);
        let coverage = total_text_pixels as f64 / canvas_area as f64;
        if coverage > rules.max_text_coverage_pct {
            violations.push(Violation::new(
                ViolationCode::TextTooMuch,
                Severity::Medium,
                None,
                format!(
                    "Text covers {:.1}% of canvas which exceeds allowed {:.0}%",
                    coverage * 100.0,
                    rules.max_text_coverage_pct * 100.0
                ),
            ));
        }

        let margin = guideline.logo_margin_px(project.width, project.height);
        for layer in project.layers.iter().filter(|l| l.is_logo()) {
            let Some(bounds) = layer.image_bounds() else {
                continue;
            };
            if breaches_margin(bounds, project.width, project.height, margin) {
                violations.push(Violation::new(
                    ViolationCode::LogoMarginViolation,
                    Severity::Low,
                    Some(layer.layer_id),
                    format!(
                        "Logo is closer than {margin}px to canvas edge; move inward to meet safe margin"
                    ),
                ));
            }
        }

        let images: Vec<_> = project
            .image_layers()
            .filter_map(|l| l.image_bounds().map(|b| (l.layer_id, b)))
            .collect();
        for (i, (a_id, a)) in images.iter().enumerate() {
            for (b_id, b) in &images[i + 1..] {
                if let Some(overlap) = significant_overlap(*a, *b) {
                    violations.push(Violation::new(
                        ViolationCode::ImageOverlap,
                        Severity::Medium,
                        None,
                        format!(
                            "Images {a_id} and {b_id} overlap significantly ({overlap}px², over {:.0}% of the smaller image)",
                            OVERLAP_THRESHOLD * 100.0
                        ),
                    ));
                }
            }
        }

        debug!(
            project_id = %project.id,
            retailer = %guideline.retailer,
            "{} violations",
            violations.len()
        );
        violations
    }
}
