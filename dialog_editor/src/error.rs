//! Editor error types.

use dialog_model::{DialogId, ValidationError};
use thiserror::Error;

/// Failure reported by a persistence gateway call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("operation not supported by this gateway: {0}")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced to the intent that triggered them. None are fatal.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid step coordinate: {reason}")]
    InvalidCoordinate { reason: String },

    #[error("no dialog is selected")]
    NoDialogSelected,

    #[error("dialog has not been persisted yet")]
    DialogNotPersisted,

    #[error("dialog {0} is not the selected dialog")]
    DialogMismatch(DialogId),

    #[error("label {0:?} was dropped by a newer dialog selection before it was written")]
    LabelUpdateSuperseded(String),

    #[error("gateway failure: {0}")]
    Gateway(#[from] GatewayError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl EditorError {
    pub(crate) fn invalid_coordinate(reason: impl Into<String>) -> Self {
        EditorError::InvalidCoordinate {
            reason: reason.into(),
        }
    }

    /// Whether the failure came from persistence rather than local checks.
    pub fn is_gateway_failure(&self) -> bool {
        matches!(self, EditorError::Gateway(_))
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
