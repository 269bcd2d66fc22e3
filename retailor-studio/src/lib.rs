//! # Retailor Studio
//!
//! The operations a creative tool exposes to its callers, wired over the
//! Retailor stores and engines.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                      Studio                        │
//! ├──────────────┬──────────────┬──────────────────────┤
//! │ ProjectStore │ BlobStore    │ GuidelineRegistry    │
//! │ (gated docs) │ (assets)     │ TemplateLibrary      │
//! ├──────────────┴──────┬───────┴──────────────────────┤
//! │ Compositor          │ ComplianceEngine / Autofix   │
//! └─────────────────────┴──────────────────────────────┘
//! ```
//!
//! Structural edits (add, update, template, autofix-apply) snapshot the
//! layer list first so they can be undone. Every read-modify-write runs
//! under the project's write gate.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

use std::sync::Arc;

use retailor_compliance::{
    suggest_layouts, AutofixEngine, ComplianceEngine, FixChange, LayoutBrief, Violation,
};
use retailor_core::{
    AssetId, AssetInfo, BlobStore, CoreError, DocumentStore, FsBlobStore, FsDocumentStore,
    Guideline, GuidelineRegistry, Layer, LayerId, LayerPatch, MemoryBlobStore,
    MemoryDocumentStore, Project, ProjectId, ProjectStore, Rgb, Template, TemplateLibrary,
    DEFAULT_HEIGHT, DEFAULT_WIDTH,
};
use retailor_renderer::image::{decode, parse_data_uri, ImageFormat};
use retailor_renderer::{
    apply_ops, channel_presets, crop, encode, encode_png, enhance, resize_for_channel, Compositor,
    CropMode, EnhanceParams, ExportConfig, ExportFormat, ImageOp, RgbaImage,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use config::{StudioArgs, StudioConfig, DEFAULT_RETAILER};
pub use error::{StudioError, StudioResult};

/// Result of a compliance check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Retailer whose guideline was applied.
    pub retailer: String,
    /// Whether no violations were found.
    pub compliant: bool,
    /// Violations in rule order.
    pub violations: Vec<Violation>,
}

/// Result of an autofix request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutofixReport {
    /// Retailer whose guideline was applied.
    pub retailer: String,
    /// Whether the fixes were written back to the project.
    pub applied: bool,
    /// Fixes found, applied or not.
    pub changes: Vec<FixChange>,
}

/// One output of [`Studio::resize_for_channels`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRendition {
    /// Channel preset name.
    pub channel: String,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Stored PNG.
    pub asset_id: AssetId,
}

/// Project, asset and compliance operations over shared stores.
///
/// Cheap to clone; clones share stores and locks.
#[derive(Debug, Clone)]
pub struct Studio {
    config: StudioConfig,
    blobs: Arc<dyn BlobStore>,
    projects: ProjectStore,
    guidelines: GuidelineRegistry,
    templates: TemplateLibrary,
    compositor: Compositor,
    compliance: ComplianceEngine,
    autofixer: AutofixEngine,
}

impl Studio {
    /// Open a studio, on disk when `config.data_dir` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if a store directory cannot be created or the
    /// guideline file cannot be loaded.
    pub fn open(config: StudioConfig) -> StudioResult<Self> {
        let (blobs, documents): (Arc<dyn BlobStore>, Arc<dyn DocumentStore>) =
            match (config.assets_dir(), config.projects_dir()) {
                (Some(assets), Some(projects)) => {
                    info!("Opening stores under {:?}", config.data_dir);
                    (
                        Arc::new(FsBlobStore::open(assets)?),
                        Arc::new(FsDocumentStore::open(projects)?),
                    )
                }
                _ => (
                    Arc::new(MemoryBlobStore::new()),
                    Arc::new(MemoryDocumentStore::new()),
                ),
            };
        Self::with_stores(config, blobs, documents)
    }

    /// A studio holding everything in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::assemble(
            StudioConfig::in_memory(),
            Arc::new(MemoryBlobStore::new()),
            ProjectStore::in_memory(),
            GuidelineRegistry::with_defaults(),
        )
    }

    /// Build a studio over caller-supplied stores.
    ///
    /// # Errors
    ///
    /// Returns an error if `config.guidelines_path` is set and fails to load.
    pub fn with_stores(
        config: StudioConfig,
        blobs: Arc<dyn BlobStore>,
        documents: Arc<dyn DocumentStore>,
    ) -> StudioResult<Self> {
        let guidelines = GuidelineRegistry::with_defaults();
        if let Some(path) = &config.guidelines_path {
            let count = guidelines.load_file(path)?;
            info!("Loaded {count} guidelines from {}", path.display());
        }
        let projects = ProjectStore::new(documents).with_history_limit(config.max_history);
        Ok(Self::assemble(config, blobs, projects, guidelines))
    }

    fn assemble(
        config: StudioConfig,
        blobs: Arc<dyn BlobStore>,
        projects: ProjectStore,
        guidelines: GuidelineRegistry,
    ) -> Self {
        let compositor = Compositor::with_builtin_font(Arc::clone(&blobs));
        Self {
            config,
            blobs,
            projects,
            guidelines,
            templates: TemplateLibrary::with_defaults(),
            compliance: ComplianceEngine::new(compositor.clone()),
            autofixer: AutofixEngine::new(compositor.clone()),
            compositor,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    // Projects

    /// Create an empty project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for a zero dimension.
    pub fn create_project(&self, width: u32, height: u32, background: Rgb) -> StudioResult<Project> {
        let project = Project::new(width, height, background)?;
        self.projects.create(&project)?;
        info!(project_id = %project.id, "Created {width}x{height} project");
        Ok(project)
    }

    /// Fetch a project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProjectNotFound`] for unknown ids.
    pub fn project(&self, id: ProjectId) -> StudioResult<Project> {
        Ok(self.projects.get(id)?)
    }

    /// Delete a project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProjectNotFound`] for unknown ids.
    pub fn delete_project(&self, id: ProjectId) -> StudioResult<()> {
        self.projects.delete(id)?;
        info!(project_id = %id, "Deleted project");
        Ok(())
    }

    /// Ids of all projects.
    ///
    /// # Errors
    ///
    /// Propagates document store failures.
    pub fn list_projects(&self) -> StudioResult<Vec<ProjectId>> {
        Ok(self.projects.list()?)
    }

    // Assets

    /// Store an uploaded image.
    ///
    /// An empty or unrecognised `content_type` is replaced by the type
    /// sniffed from the bytes.
    ///
    /// # Errors
    ///
    /// Returns [`retailor_renderer::RenderError::Decode`] if the bytes are
    /// not a decodable image.
    pub fn upload_asset(&self, bytes: &[u8], content_type: &str) -> StudioResult<AssetInfo> {
        decode(bytes)?;
        let content_type = match ImageFormat::from_mime(content_type) {
            ImageFormat::Unknown => ImageFormat::from_magic_bytes(bytes).mime(),
            known => known.mime(),
        };
        let asset_id = self.blobs.put(bytes, content_type)?;
        info!(%asset_id, "Stored {} byte {content_type} asset", bytes.len());
        Ok(AssetInfo {
            asset_id,
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
        })
    }

    /// Store an image given as a base64 `data:` URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is malformed or the payload is not an image.
    pub fn upload_data_uri(&self, uri: &str) -> StudioResult<AssetInfo> {
        let (bytes, content_type) = parse_data_uri(uri)?;
        self.upload_asset(&bytes, &content_type)
    }

    /// Raw bytes of an asset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetNotFound`] for unknown ids.
    pub fn asset(&self, id: &AssetId) -> StudioResult<Vec<u8>> {
        Ok(self.blobs.get(id)?)
    }

    /// Remove an asset. Layers still pointing at it are skipped on render.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetNotFound`] for unknown ids.
    pub fn delete_asset(&self, id: &AssetId) -> StudioResult<()> {
        self.blobs.delete(id)?;
        info!(asset_id = %id, "Deleted asset");
        Ok(())
    }

    /// All stored assets.
    ///
    /// # Errors
    ///
    /// Propagates blob store failures.
    pub fn list_assets(&self) -> StudioResult<Vec<AssetInfo>> {
        Ok(self.blobs.list()?)
    }

    // Layers

    /// Append an image layer. The referenced asset must exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `layer` is not an image
    /// layer, [`CoreError::AssetNotFound`] for a missing asset, and
    /// [`CoreError::ProjectNotFound`] for unknown projects.
    pub fn add_image_layer(&self, project_id: ProjectId, layer: Layer) -> StudioResult<Layer> {
        let retailor_core::LayerKind::Image { asset_id, .. } = &layer.kind else {
            return Err(CoreError::invalid("expected an image layer").into());
        };
        self.blobs.get(asset_id)?;
        self.append_layer(project_id, layer)
    }

    /// Append a text layer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `layer` is not a valid text
    /// layer and [`CoreError::ProjectNotFound`] for unknown projects.
    pub fn add_text_layer(&self, project_id: ProjectId, layer: Layer) -> StudioResult<Layer> {
        if !layer.is_text() {
            return Err(CoreError::invalid("expected a text layer").into());
        }
        self.append_layer(project_id, layer)
    }

    fn append_layer(&self, project_id: ProjectId, layer: Layer) -> StudioResult<Layer> {
        let layer = self.projects.mutate(project_id, |project| {
            let id = project.add_layer(layer)?;
            project
                .layer(id)
                .cloned()
                .ok_or_else(|| CoreError::LayerNotFound(id.to_string()))
        })?;
        info!(%project_id, layer_id = %layer.layer_id, "Added layer");
        Ok(layer)
    }

    /// Merge a partial update into a layer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for an empty or rejected patch
    /// and [`CoreError::LayerNotFound`] for unknown layers.
    pub fn update_layer(
        &self,
        project_id: ProjectId,
        layer_id: LayerId,
        patch: &LayerPatch,
    ) -> StudioResult<Layer> {
        if patch.is_empty() {
            return Err(CoreError::invalid("layer patch is empty").into());
        }
        let layer = self.projects.mutate(project_id, |project| {
            project.update_layer(layer_id, patch).cloned()
        })?;
        info!(%project_id, %layer_id, "Updated layer");
        Ok(layer)
    }

    // Templates

    /// Available templates.
    #[must_use]
    pub fn templates(&self) -> &[Template] {
        self.templates.templates()
    }

    /// Append a template's layers to a project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TemplateNotFound`] for unknown names and
    /// [`CoreError::ProjectNotFound`] for unknown projects.
    pub fn apply_template(&self, project_id: ProjectId, name: &str) -> StudioResult<Vec<LayerId>> {
        let template = self.templates.get(name)?;
        self.apply_layout(project_id, template)
    }

    /// Starter layouts built around a stored product image.
    ///
    /// Text colour follows the product's mean colour and the full-bleed
    /// hero is anchored on its brightest region. A logo is placed inside
    /// the default retailer's safe margin.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetNotFound`] if the product or logo is
    /// missing, or a decode error if the product is not an image.
    pub fn suggest_layouts(&self, brief: &LayoutBrief) -> StudioResult<Vec<Template>> {
        let product = decode(&self.blobs.get(&brief.product)?)?;
        if let Some(logo) = &brief.logo {
            self.blobs.get(logo)?;
        }
        let margin = self
            .guideline(None)?
            .logo_margin_px(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        let layouts = suggest_layouts(brief, &product, margin);
        debug!(product = %brief.product, "Suggested {} layouts", layouts.len());
        Ok(layouts)
    }

    /// Append a layout's layers to a project as one undoable step.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if a layer is invalid and
    /// [`CoreError::ProjectNotFound`] for unknown projects.
    pub fn apply_layout(&self, project_id: ProjectId, layout: &Template) -> StudioResult<Vec<LayerId>> {
        let ids = self
            .projects
            .mutate(project_id, |project| layout.apply_to(project))?;
        info!(%project_id, layout = %layout.name, "Applied layout with {} layers", ids.len());
        Ok(ids)
    }

    // History

    /// Restore the previous layer list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NothingToUndo`] when there is no history.
    pub fn undo(&self, project_id: ProjectId) -> StudioResult<Vec<Layer>> {
        let layers = self
            .projects
            .update(project_id, |project| project.undo().map(<[Layer]>::to_vec))?;
        debug!(%project_id, "Undo");
        Ok(layers)
    }

    /// Re-apply the most recently undone layer list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NothingToRedo`] when nothing was undone.
    pub fn redo(&self, project_id: ProjectId) -> StudioResult<Vec<Layer>> {
        let layers = self
            .projects
            .update(project_id, |project| project.redo().map(<[Layer]>::to_vec))?;
        debug!(%project_id, "Redo");
        Ok(layers)
    }

    // Rendering

    /// Render a project and store the result as a PNG asset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProjectNotFound`] for unknown projects, or an
    /// export or store error.
    pub fn render(&self, project_id: ProjectId) -> StudioResult<AssetInfo> {
        let canvas = self.render_canvas(project_id)?;
        let info = self.store_png(&canvas)?;
        info!(%project_id, asset_id = %info.asset_id, "Rendered project");
        Ok(info)
    }

    /// Render a project and encode it without storing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProjectNotFound`] for unknown projects or an
    /// export error.
    pub fn export(&self, project_id: ProjectId, format: ExportFormat) -> StudioResult<Vec<u8>> {
        let canvas = self.render_canvas(project_id)?;
        Ok(encode(&canvas, format, &ExportConfig::default())?)
    }

    fn render_canvas(&self, project_id: ProjectId) -> StudioResult<RgbaImage> {
        let project = self.projects.get(project_id)?;
        Ok(self.compositor.render(&project))
    }

    // Compliance

    /// Retailers with a registered guideline.
    #[must_use]
    pub fn retailers(&self) -> Vec<String> {
        self.guidelines.retailers()
    }

    /// The guideline for `retailer`, or for the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::GuidelineNotFound`] for unknown retailers.
    pub fn guideline(&self, retailer: Option<&str>) -> StudioResult<Guideline> {
        let retailer = retailer.unwrap_or(&self.config.default_retailer);
        Ok(self.guidelines.get(retailer)?)
    }

    /// Check a project against a retailer's guideline.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::GuidelineNotFound`] or
    /// [`CoreError::ProjectNotFound`].
    pub fn check(&self, project_id: ProjectId, retailer: Option<&str>) -> StudioResult<ComplianceReport> {
        let guideline = self.guideline(retailer)?;
        let project = self.projects.get(project_id)?;
        let violations = self.compliance.check(&project, &guideline);
        info!(
            %project_id,
            retailer = %guideline.retailer,
            "Compliance check found {} violations",
            violations.len()
        );
        Ok(ComplianceReport {
            retailer: guideline.retailer,
            compliant: violations.is_empty(),
            violations,
        })
    }

    /// Compute fixes and, when `apply` is set, write them back as one
    /// undoable step.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::GuidelineNotFound`] or
    /// [`CoreError::ProjectNotFound`].
    pub fn autofix(
        &self,
        project_id: ProjectId,
        retailer: Option<&str>,
        apply: bool,
    ) -> StudioResult<AutofixReport> {
        let guideline = self.guideline(retailer)?;
        let outcome = if apply {
            let limit = self.projects.history_limit();
            self.projects.update(project_id, |project| {
                let outcome = self.autofixer.autofix(project, &guideline);
                if outcome.changed {
                    project.snapshot();
                    project.replace_layers(outcome.layers.clone())?;
                    if let Some(limit) = limit {
                        project.trim_history(limit);
                    }
                }
                Ok(outcome)
            })?
        } else {
            self.projects
                .read(project_id, |project| Ok(self.autofixer.autofix(project, &guideline)))?
        };
        let applied = apply && outcome.changed;
        info!(
            %project_id,
            retailer = %guideline.retailer,
            applied,
            "Autofix found {} changes",
            outcome.changes.len()
        );
        Ok(AutofixReport {
            retailer: guideline.retailer,
            applied,
            changes: outcome.changes,
        })
    }

    // Asset transforms

    /// Crop an asset and store the result.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetNotFound`] or a decode error.
    pub fn crop_asset(&self, id: &AssetId, mode: CropMode) -> StudioResult<AssetInfo> {
        let img = self.load_image(id)?;
        let info = self.store_png(&crop(&img, mode))?;
        info!(source = %id, asset_id = %info.asset_id, %mode, "Cropped asset");
        Ok(info)
    }

    /// Enhance an asset and store the result.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown assets or out-of-range parameters.
    pub fn enhance_asset(&self, id: &AssetId, params: &EnhanceParams) -> StudioResult<AssetInfo> {
        let img = self.load_image(id)?;
        let info = self.store_png(&enhance(&img, params)?)?;
        info!(source = %id, asset_id = %info.asset_id, "Enhanced asset");
        Ok(info)
    }

    /// Produce one stored rendition per channel preset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetNotFound`] or a decode error.
    pub fn resize_for_channels(
        &self,
        id: &AssetId,
        custom: Option<(u32, u32)>,
    ) -> StudioResult<Vec<ChannelRendition>> {
        let img = self.load_image(id)?;
        channel_presets(custom)
            .into_iter()
            .map(|preset| {
                let info = self.store_png(&resize_for_channel(&img, &preset))?;
                debug!(source = %id, channel = %preset.name, "Resized asset");
                Ok(ChannelRendition {
                    channel: preset.name,
                    width: preset.width,
                    height: preset.height,
                    asset_id: info.asset_id,
                })
            })
            .collect()
    }

    /// Run a transform pipeline over an asset and store the result.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown assets or invalid operations.
    pub fn transform_asset(&self, id: &AssetId, ops: &[ImageOp]) -> StudioResult<AssetInfo> {
        let img = self.load_image(id)?;
        let info = self.store_png(&apply_ops(img, ops)?)?;
        info!(source = %id, asset_id = %info.asset_id, "Applied {} image ops", ops.len());
        Ok(info)
    }

    fn load_image(&self, id: &AssetId) -> StudioResult<RgbaImage> {
        let bytes = self.blobs.get(id)?;
        Ok(decode(&bytes)?)
    }

    fn store_png(&self, img: &RgbaImage) -> StudioResult<AssetInfo> {
        let bytes = encode_png(img)?;
        let content_type = ExportFormat::Png.mime();
        let asset_id = self.blobs.put(&bytes, content_type)?;
        Ok(AssetInfo {
            asset_id,
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
        })
    }
}
