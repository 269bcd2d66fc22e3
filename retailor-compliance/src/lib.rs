//! # Retailor Compliance
//!
//! Retailer guideline checks over a rendered project, and automatic fixes
//! for the violations that have a mechanical repair.
//!
//! Both engines render through a shared
//! [`Compositor`](retailor_renderer::Compositor) and measure text with the
//! same font the compositor paints with, so the boxes they sample are the
//! boxes that were drawn. [`layout`] builds starter layouts around a
//! product image using the same colour rules.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod autofix;
pub mod check;
pub mod contrast;
pub mod layout;
pub mod metrics;

pub use autofix::{AutofixEngine, AutofixOutcome, Fix, FixChange};
pub use check::{ComplianceEngine, Severity, Violation, ViolationCode};
pub use contrast::{best_text_color, contrast_ratio, relative_luminance};
pub use layout::{focal_point, mean_color, suggest_layouts, LayoutBrief};
pub use metrics::{
    breaches_margin, covered_area, sample_mean_rgb, significant_overlap, OVERLAP_THRESHOLD,
};
