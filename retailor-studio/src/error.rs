//! Errors surfaced by [`crate::Studio`].

use retailor_core::{CoreError, ErrorKind};
use retailor_renderer::RenderError;
use thiserror::Error;

/// Result type for studio operations.
pub type StudioResult<T> = Result<T, StudioError>;

/// Errors from any layer beneath the studio.
#[derive(Debug, Error)]
pub enum StudioError {
    /// Document, store or history failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Image decode, transform or export failure.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl StudioError {
    /// Classify the error the same way [`CoreError::kind`] does.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) | Self::Render(RenderError::Core(e)) => e.kind(),
            Self::Render(RenderError::Decode(_) | RenderError::InvalidArgument(_)) => {
                ErrorKind::InvalidArgument
            }
            Self::Render(RenderError::Export(_) | RenderError::Font(_)) => ErrorKind::Internal,
        }
    }
}
