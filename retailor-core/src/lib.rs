//! # Retailor Core
//!
//! Document model for retail creatives: projects made of ordered image and
//! text layers, snapshot-based undo/redo, retailer guidelines, starter
//! templates, and the storage seams the rest of the workspace builds on.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                 retailor-core                 │
//! ├───────────────────────────────────────────────┤
//! │  Document model    │  Rules                   │
//! │  - Project         │  - Guideline             │
//! │  - Layer / Patch   │  - GuidelineRegistry     │
//! │  - History         │  - TemplateLibrary       │
//! ├───────────────────────────────────────────────┤
//! │  Storage           │  Concurrency             │
//! │  - BlobStore       │  - ProjectStore          │
//! │  - DocumentStore   │    (per-project gates)   │
//! └───────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod blob;
pub mod color;
pub mod document;
pub mod error;
pub mod geometry;
pub mod guideline;
pub mod history;
pub mod layer;
pub mod project;
pub mod store;
pub mod template;

pub use blob::{AssetId, AssetInfo, BlobStore, FsBlobStore, MemoryBlobStore};
pub use color::Rgb;
pub use document::{DocumentStore, FsDocumentStore, MemoryDocumentStore};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use geometry::Rect;
pub use guideline::{Guideline, GuidelineRegistry, GuidelineRules, Resolution};
pub use layer::{Layer, LayerId, LayerKind, LayerMeta, LayerPatch, LOGO_ROLE};
pub use project::{Project, ProjectId, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use store::ProjectStore;
pub use template::{Template, TemplateLibrary};

/// Retailor core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
