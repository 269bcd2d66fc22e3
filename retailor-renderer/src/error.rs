//! Renderer error types.

use retailor_core::{CoreError, LayerId};
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Asset lookup or another core operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Image could not be encoded.
    #[error("Export failed: {0}")]
    Export(String),

    /// Text could not be measured or painted.
    #[error("Font error: {0}")]
    Font(String),

    /// Caller supplied an argument outside the accepted domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RenderError {
    /// Whether the error means a referenced asset does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(e) if e.kind() == retailor_core::ErrorKind::NotFound)
    }
}

/// A failure confined to one layer; the compositor logs it and moves on.
#[derive(Debug, Error)]
#[error("Layer {layer_id} skipped: {source}")]
pub struct LayerRenderError {
    /// The layer that could not be painted.
    pub layer_id: LayerId,
    /// Why it was skipped.
    #[source]
    pub source: RenderError,
}
