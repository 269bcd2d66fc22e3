//! Error types for document and store operations.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Project does not exist in the document store.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Layer id is not present in the project.
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    /// No guideline registered for the retailer.
    #[error("Guideline not found: {0}")]
    GuidelineNotFound(String),

    /// Asset id is unknown to the blob store.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Template name is unknown to the library.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Caller supplied an argument outside the accepted domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Undo requested with an empty history stack.
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Redo requested with an empty future stack.
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Backing store I/O failed; the caller may retry.
    #[error("Store failure: {0}")]
    Store(String),

    /// Document (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of a [`CoreError`] for API layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Something the caller referenced does not exist (404-equivalent).
    NotFound,
    /// The request itself is malformed or not applicable (400-equivalent).
    InvalidArgument,
    /// Store I/O failed; retrying with backoff may succeed.
    Transient,
    /// Internal failure such as a corrupt document.
    Internal,
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidArgument`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Shorthand for [`CoreError::Store`].
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProjectNotFound(_)
            | Self::LayerNotFound(_)
            | Self::GuidelineNotFound(_)
            | Self::AssetNotFound(_)
            | Self::TemplateNotFound(_) => ErrorKind::NotFound,
            Self::InvalidArgument(_) | Self::NothingToUndo | Self::NothingToRedo => {
                ErrorKind::InvalidArgument
            }
            Self::Store(_) => ErrorKind::Transient,
            Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            CoreError::ProjectNotFound("p".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::AssetNotFound("a".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(CoreError::NothingToUndo.kind(), ErrorKind::InvalidArgument);
        assert_eq!(CoreError::NothingToRedo.kind(), ErrorKind::InvalidArgument);
        assert_eq!(CoreError::store("disk").kind(), ErrorKind::Transient);
    }

    #[test]
    fn test_io_errors_are_transient() {
        let err: CoreError = std::io::Error::other("boom").into();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(CoreError::NothingToUndo.to_string(), "Nothing to undo");
        assert_eq!(
            CoreError::invalid("bad crop mode").to_string(),
            "Invalid argument: bad crop mode"
        );
    }
}
