//! # retailor
//!
//! Command-line front end for Retailor Studio. Every subcommand prints its
//! result as JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use retailor_core::{
    AssetId, Layer, LayerId, LayerPatch, ProjectId, Rgb, DEFAULT_HEIGHT, DEFAULT_WIDTH, LOGO_ROLE,
};
use retailor_compliance::LayoutBrief;
use retailor_renderer::{CropMode, EnhanceParams, ExportFormat};
use retailor_studio::{Studio, StudioArgs, StudioConfig};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Retail creative canvas with guideline compliance checks.
#[derive(Debug, Parser)]
#[command(name = "retailor")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    studio: StudioArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an empty project
    Create {
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: u32,
        #[arg(long, default_value_t = DEFAULT_HEIGHT)]
        height: u32,
        #[arg(long, default_value = "#FFFFFF")]
        background: String,
    },
    /// Print a project
    Show { project: String },
    /// List project ids
    List,
    /// Delete a project
    Delete { project: String },
    /// Store an image file as an asset
    Upload {
        file: PathBuf,
        /// MIME type; sniffed from the bytes when omitted
        #[arg(long, default_value = "")]
        content_type: String,
    },
    /// List stored assets
    Assets,
    /// Append an image layer
    AddImage {
        project: String,
        asset: String,
        #[arg(long, default_value_t = 400)]
        width: u32,
        #[arg(long, default_value_t = 400)]
        height: u32,
        #[command(flatten)]
        placement: Placement,
        /// Mark the layer as the brand logo
        #[arg(long)]
        logo: bool,
    },
    /// Append a text layer
    AddText {
        project: String,
        text: String,
        #[arg(long, default_value_t = 48)]
        font_size: u32,
        #[arg(long, default_value = "#000000")]
        color: String,
        #[command(flatten)]
        placement: Placement,
    },
    /// Patch a layer with a JSON object, e.g. '{"x": 10, "font_size": 24}'
    Update {
        project: String,
        layer: String,
        patch: String,
    },
    /// List templates
    Templates,
    /// Append a template's layers to a project
    ApplyTemplate { project: String, template: String },
    /// Suggest layouts around a product asset, or apply one to a project
    Suggest {
        product: String,
        #[arg(long)]
        logo: Option<String>,
        #[arg(long)]
        headline: Option<String>,
        #[arg(long)]
        cta: Option<String>,
        /// Append the named layout to this project
        #[arg(long, requires = "layout")]
        project: Option<String>,
        #[arg(long, requires = "project")]
        layout: Option<String>,
    },
    /// Render a project; stores a PNG asset unless --out is given
    Render {
        project: String,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "png")]
        format: String,
    },
    /// Undo the last edit
    Undo { project: String },
    /// Redo the last undone edit
    Redo { project: String },
    /// List retailers with guidelines
    Retailers,
    /// Check a project against a retailer's guideline
    Check {
        project: String,
        /// Retailer to check against instead of the default
        #[arg(long = "for", value_name = "RETAILER")]
        target: Option<String>,
    },
    /// Repair what can be repaired automatically
    Autofix {
        project: String,
        /// Retailer to check against instead of the default
        #[arg(long = "for", value_name = "RETAILER")]
        target: Option<String>,
        /// Report fixes without applying them
        #[arg(long)]
        dry_run: bool,
    },
    /// Crop an asset: square, portrait, landscape or custom
    Crop {
        asset: String,
        #[arg(long, default_value = "square")]
        mode: String,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
    },
    /// Sharpen, add contrast and brighten an asset
    Enhance {
        asset: String,
        #[arg(long, default_value_t = 1.2)]
        sharpness: f32,
        #[arg(long, default_value_t = 1.15)]
        contrast: f32,
        #[arg(long, default_value_t = 1.1)]
        brightness: f32,
    },
    /// Produce one rendition per sales channel
    Resize {
        asset: String,
        #[arg(long, requires = "height")]
        width: Option<u32>,
        #[arg(long, requires = "width")]
        height: Option<u32>,
    },
}

#[derive(Debug, Clone, clap::Args)]
struct Placement {
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    x: i32,
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    y: i32,
    /// Degrees counter-clockwise
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    rotation: f32,
    #[arg(long, default_value_t = 1.0)]
    opacity: f32,
}

impl Placement {
    fn place(&self, layer: Layer) -> Layer {
        layer
            .at(self.x, self.y)
            .with_rotation(self.rotation)
            .with_opacity(self.opacity)
    }
}

/// Initialize structured tracing on stderr.
///
/// `RUST_LOG` controls levels (default: `info,retailor_studio=debug`).
/// `RUST_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,retailor_studio=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn project_id(s: &str) -> anyhow::Result<ProjectId> {
    ProjectId::parse(s).with_context(|| format!("bad project id {s:?}"))
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = StudioConfig::from(cli.studio);
    if config.data_dir.is_none() {
        tracing::warn!("No --data-dir set; nothing will outlive this command");
    }
    let studio = Studio::open(config).context("failed to open studio")?;

    match cli.command {
        Command::Create {
            width,
            height,
            background,
        } => {
            let background: Rgb = background.parse()?;
            print_json(&studio.create_project(width, height, background)?)
        }
        Command::Show { project } => print_json(&studio.project(project_id(&project)?)?),
        Command::List => print_json(&studio.list_projects()?),
        Command::Delete { project } => {
            let id = project_id(&project)?;
            studio.delete_project(id)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        Command::Upload { file, content_type } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            print_json(&studio.upload_asset(&bytes, &content_type)?)
        }
        Command::Assets => print_json(&studio.list_assets()?),
        Command::AddImage {
            project,
            asset,
            width,
            height,
            placement,
            logo,
        } => {
            let mut layer = placement.place(Layer::image(asset, width, height));
            if logo {
                layer = layer.with_role(LOGO_ROLE);
            }
            print_json(&studio.add_image_layer(project_id(&project)?, layer)?)
        }
        Command::AddText {
            project,
            text,
            font_size,
            color,
            placement,
        } => {
            let layer = placement.place(Layer::text(text, font_size, color.parse()?));
            print_json(&studio.add_text_layer(project_id(&project)?, layer)?)
        }
        Command::Update {
            project,
            layer,
            patch,
        } => {
            let patch: LayerPatch =
                serde_json::from_str(&patch).context("patch must be a JSON object of layer fields")?;
            let layer_id = LayerId::parse(&layer)?;
            print_json(&studio.update_layer(project_id(&project)?, layer_id, &patch)?)
        }
        Command::Templates => print_json(&studio.templates()),
        Command::ApplyTemplate { project, template } => {
            print_json(&studio.apply_template(project_id(&project)?, &template)?)
        }
        Command::Suggest {
            product,
            logo,
            headline,
            cta,
            project,
            layout,
        } => {
            let mut brief = LayoutBrief::new(product);
            if let Some(logo) = logo {
                brief = brief.with_logo(logo);
            }
            if let Some(headline) = headline {
                brief = brief.with_headline(headline);
            }
            if let Some(cta) = cta {
                brief = brief.with_cta(cta);
            }
            let layouts = studio.suggest_layouts(&brief)?;
            match project.zip(layout) {
                Some((project, name)) => {
                    let chosen = layouts
                        .iter()
                        .find(|l| l.name == name)
                        .with_context(|| format!("no suggested layout named {name:?}"))?;
                    print_json(&studio.apply_layout(project_id(&project)?, chosen)?)
                }
                None => print_json(&layouts),
            }
        }
        Command::Render {
            project,
            out,
            format,
        } => {
            let id = project_id(&project)?;
            match out {
                Some(path) => {
                    let format: ExportFormat = format.parse()?;
                    let bytes = studio.export(id, format)?;
                    std::fs::write(&path, &bytes)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    print_json(&serde_json::json!({
                        "path": path,
                        "content_type": format.mime(),
                        "size": bytes.len(),
                    }))
                }
                None => print_json(&studio.render(id)?),
            }
        }
        Command::Undo { project } => print_json(&studio.undo(project_id(&project)?)?),
        Command::Redo { project } => print_json(&studio.redo(project_id(&project)?)?),
        Command::Retailers => print_json(&studio.retailers()),
        Command::Check { project, target } => {
            print_json(&studio.check(project_id(&project)?, target.as_deref())?)
        }
        Command::Autofix {
            project,
            target,
            dry_run,
        } => print_json(&studio.autofix(
            project_id(&project)?,
            target.as_deref(),
            !dry_run,
        )?),
        Command::Crop {
            asset,
            mode,
            width,
            height,
        } => {
            let mode = CropMode::parse(&mode, width, height)?;
            print_json(&studio.crop_asset(&AssetId::new(asset), mode)?)
        }
        Command::Enhance {
            asset,
            sharpness,
            contrast,
            brightness,
        } => {
            let params = EnhanceParams {
                sharpness,
                contrast,
                brightness,
            };
            print_json(&studio.enhance_asset(&AssetId::new(asset), &params)?)
        }
        Command::Resize {
            asset,
            width,
            height,
        } => print_json(&studio.resize_for_channels(&AssetId::new(asset), width.zip(height))?),
    }
}
