//! Studio configuration.

use std::path::PathBuf;

use clap::Args;

/// Retailer used when a command does not name one.
pub const DEFAULT_RETAILER: &str = "RetailerA";

/// Storage and rule options shared by every `retailor` subcommand.
#[derive(Debug, Clone, Args)]
pub struct StudioArgs {
    /// Directory holding `projects/` and `assets/`; in-memory when unset
    #[arg(long, global = true, env = "RETAILOR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep at most this many undo snapshots per project
    #[arg(long, global = true, env = "RETAILOR_MAX_HISTORY")]
    pub max_history: Option<usize>,

    /// JSON file with extra retailer guidelines
    #[arg(long, global = true, env = "RETAILOR_GUIDELINES")]
    pub guidelines: Option<PathBuf>,

    /// Retailer checked when none is given
    #[arg(long, global = true, env = "RETAILOR_RETAILER", default_value = DEFAULT_RETAILER)]
    pub retailer: String,
}

/// Resolved studio configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    /// Root of the filesystem stores; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Undo depth cap; `None` is unbounded.
    pub max_history: Option<usize>,
    /// Extra guidelines merged over the built-in ones.
    pub guidelines_path: Option<PathBuf>,
    /// Retailer used when a caller passes none.
    pub default_retailer: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_history: None,
            guidelines_path: None,
            default_retailer: DEFAULT_RETAILER.to_string(),
        }
    }
}

impl StudioConfig {
    /// In-memory configuration.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Configuration backed by the filesystem under `dir`.
    #[must_use]
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Directory for project documents, if persistent.
    #[must_use]
    pub fn projects_dir(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("projects"))
    }

    /// Directory for asset blobs, if persistent.
    #[must_use]
    pub fn assets_dir(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("assets"))
    }
}

impl From<StudioArgs> for StudioConfig {
    fn from(args: StudioArgs) -> Self {
        Self {
            data_dir: args.data_dir,
            // zero would make every snapshot vanish immediately
            max_history: args.max_history.filter(|&n| n > 0),
            guidelines_path: args.guidelines,
            default_retailer: args.retailer,
        }
    }
}
