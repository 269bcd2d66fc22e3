//! Retailer creative guidelines.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, Rect};

/// Minimum canvas size as `[width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Resolution {
    /// Minimum width.
    pub width: u32,
    /// Minimum height.
    pub height: u32,
}

impl Resolution {
    /// Create a resolution requirement.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether a `width × height` canvas meets the requirement in both dimensions.
    #[must_use]
    pub const fn is_met_by(&self, width: u32, height: u32) -> bool {
        width >= self.width && height >= self.height
    }
}

impl From<[u32; 2]> for Resolution {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Resolution> for [u32; 2] {
    fn from(r: Resolution) -> Self {
        [r.width, r.height]
    }
}

/// The rule set a retailer enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineRules {
    /// Smallest allowed font size in pixels.
    pub min_font_size: u32,
    /// Minimum WCAG contrast ratio between text and background.
    pub min_contrast_ratio: f64,
    /// Logo safe margin as a fraction of the shorter canvas side.
    pub logo_safe_margin_pct: f64,
    /// Largest fraction of the canvas text boxes may cover.
    pub max_text_coverage_pct: f64,
    /// Minimum canvas resolution.
    #[serde(alias = "required_file_resolution")]
    pub required_resolution: Resolution,
    /// Areas content should avoid; not evaluated yet.
    #[serde(default)]
    pub forbidden_areas: Vec<Rect>,
}

/// A named set of retailer rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guideline {
    /// Retailer name used for lookup.
    pub retailer: String,
    /// The rules.
    pub rules: GuidelineRules,
}

impl Guideline {
    /// Built-in guideline for `RetailerA`.
    #[must_use]
    pub fn retailer_a() -> Self {
        Self {
            retailer: "RetailerA".to_string(),
            rules: GuidelineRules {
                min_font_size: 18,
                min_contrast_ratio: 4.5,
                logo_safe_margin_pct: 0.05,
                max_text_coverage_pct: 0.25,
                required_resolution: Resolution::new(800, 800),
                forbidden_areas: Vec::new(),
            },
        }
    }

    /// Built-in guideline for `RetailerB`.
    #[must_use]
    pub fn retailer_b() -> Self {
        Self {
            retailer: "RetailerB".to_string(),
            rules: GuidelineRules {
                min_font_size: 14,
                min_contrast_ratio: 3.0,
                logo_safe_margin_pct: 0.03,
                max_text_coverage_pct: 0.30,
                required_resolution: Resolution::new(600, 600),
                forbidden_areas: Vec::new(),
            },
        }
    }

    /// Logo safe margin in whole pixels for a canvas.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn logo_margin_px(&self, canvas_width: u32, canvas_height: u32) -> i64 {
        let shorter = f64::from(canvas_width.min(canvas_height));
        (shorter * self.rules.logo_safe_margin_pct).floor().max(0.0) as i64
    }
}

/// Thread-safe lookup of guidelines by retailer name.
#[derive(Debug, Clone)]
pub struct GuidelineRegistry {
    guidelines: Arc<RwLock<BTreeMap<String, Guideline>>>,
}

impl Default for GuidelineRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl GuidelineRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            guidelines: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create a registry holding the built-in retailers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.insert(Guideline::retailer_a());
        registry.insert(Guideline::retailer_b());
        registry
    }

    /// Add or replace a guideline.
    pub fn insert(&self, guideline: Guideline) {
        let mut guidelines = self
            .guidelines
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guidelines.insert(guideline.retailer.clone(), guideline);
    }

    /// Load guidelines from a JSON file holding an array of [`Guideline`]s.
    ///
    /// Returns the number of guidelines loaded.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the file cannot be read or
    /// [`CoreError::Serialization`] if it does not parse.
    pub fn load_file(&self, path: &Path) -> CoreResult<usize> {
        let contents = std::fs::read_to_string(path)?;
        let loaded: Vec<Guideline> = serde_json::from_str(&contents)?;
        let count = loaded.len();
        for guideline in loaded {
            tracing::debug!("Loaded guideline for {}", guideline.retailer);
            self.insert(guideline);
        }
        Ok(count)
    }

    /// Look up a retailer's guideline.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::GuidelineNotFound`] for unknown retailers.
    pub fn get(&self, retailer: &str) -> CoreResult<Guideline> {
        let guidelines = self
            .guidelines
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guidelines
            .get(retailer)
            .cloned()
            .ok_or_else(|| CoreError::GuidelineNotFound(retailer.to_string()))
    }

    /// Registered retailer names in sorted order.
    #[must_use]
    pub fn retailers(&self) -> Vec<String> {
        let guidelines = self
            .guidelines
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guidelines.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_registered() {
        let registry = GuidelineRegistry::with_defaults();
        assert_eq!(registry.retailers(), ["RetailerA", "RetailerB"]);
        let a = registry.get("RetailerA").expect("guideline");
        assert_eq!(a.rules.min_font_size, 18);
        assert_eq!(a.rules.required_resolution, Resolution::new(800, 800));
    }

    #[test]
    fn test_unknown_retailer() {
        let registry = GuidelineRegistry::with_defaults();
        assert!(matches!(
            registry.get("Nobody"),
            Err(CoreError::GuidelineNotFound(_))
        ));
    }

    #[test]
    fn test_logo_margin_floors() {
        let g = Guideline::retailer_a();
        assert_eq!(g.logo_margin_px(1080, 1080), 54);
        assert_eq!(g.logo_margin_px(1000, 330), 16);
    }

    #[test]
    fn test_resolution_check() {
        let r = Resolution::new(800, 800);
        assert!(r.is_met_by(800, 800));
        assert!(!r.is_met_by(799, 2000));
        assert!(!r.is_met_by(2000, 10));
    }

    #[test]
    fn test_load_file_accepts_legacy_key() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        let json = serde_json::json!([{
            "retailer": "RetailerC",
            "rules": {
                "min_font_size": 20,
                "min_contrast_ratio": 7.0,
                "logo_safe_margin_pct": 0.1,
                "max_text_coverage_pct": 0.2,
                "required_file_resolution": [1200, 628]
            }
        }]);
        file.write_all(json.to_string().as_bytes()).expect("write");

        let registry = GuidelineRegistry::with_defaults();
        assert_eq!(registry.load_file(file.path()).expect("load"), 1);
        let c = registry.get("RetailerC").expect("guideline");
        assert_eq!(c.rules.required_resolution, Resolution::new(1200, 628));
        assert!(c.rules.forbidden_areas.is_empty());
    }
}
