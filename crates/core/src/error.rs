//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures only (validation, invariants, conflicts).
/// Dispatch and replay failures are modelled by the editor crate on top of this.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An action input failed validation without a specific field.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A single field of an action input failed validation.
    ///
    /// `path` mirrors the action input shape (e.g. `input.unitPriceTaxExcl`) so
    /// that callers can point the user at the offending field.
    #[error("invalid field `{path}`: {reason}")]
    InvalidField { path: String, reason: String },

    /// A document invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier or code was malformed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The targeted document, line item or wallet does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The action conflicts with current state (duplicate, already created, stale revision).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_field(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// The field path this error points at, if any.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Self::InvalidField { path, .. } => Some(path),
            _ => None,
        }
    }
}
