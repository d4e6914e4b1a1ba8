use thiserror::Error;

use docforge_core::DomainError;
use docforge_reconcile::{InputError, ReconcileError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    /// Action input failed validation; `path` names the offending field when known.
    #[error("validation failed: {message}")]
    Validation {
        path: Option<String>,
        message: String,
    },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Duplicate ids, repeated creation or a stale revision.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Publication failed after the operation was recorded.
    #[error("publishing operation failed: {0}")]
    Publish(String),
    /// An operation log could not be replayed.
    #[error("operation log rejected: {0}")]
    Replay(String),
}

impl DispatchError {
    pub fn field_path(&self) -> Option<&str> {
        match self {
            DispatchError::Validation { path, .. } => path.as_deref(),
            _ => None,
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(message) | DomainError::InvalidId(message) => {
                DispatchError::Validation {
                    path: None,
                    message,
                }
            }
            DomainError::InvalidField { path, reason } => DispatchError::Validation {
                message: format!("{path}: {reason}"),
                path: Some(path),
            },
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::NotFound(what) => DispatchError::NotFound(what),
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
        }
    }
}

/// Failure of a draft editing session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The document or line item the draft refers to does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
