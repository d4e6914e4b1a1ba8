//! User-facing notices.
//!
//! Every failure a user can cause while editing is turned into a [`Notice`]
//! naming the first offending field, so the caller can display it next to the
//! input that needs fixing.

use serde::Serialize;

use docforge_reconcile::{InputError, LineItemField, ReconcileError};

use crate::error::{DispatchError, SessionError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            field_path: None,
            message: message.into(),
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }
}

impl core::fmt::Display for Notice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.field_path {
            Some(path) => write!(f, "{} ({path}): {}", self.title, self.message),
            None => write!(f, "{}: {}", self.title, self.message),
        }
    }
}

fn input_path(field: LineItemField) -> String {
    format!("input.{field}")
}

impl From<&DispatchError> for Notice {
    fn from(err: &DispatchError) -> Self {
        let (level, title) = match err {
            DispatchError::Validation { .. } => (NoticeLevel::Error, "Invalid input"),
            DispatchError::InvariantViolation(_) => (NoticeLevel::Error, "Inconsistent line item"),
            DispatchError::NotFound(_) => (NoticeLevel::Error, "Not found"),
            DispatchError::Conflict(_) => (NoticeLevel::Warning, "Conflicting change"),
            DispatchError::Publish(_) => (NoticeLevel::Warning, "Saved, but not broadcast"),
            DispatchError::Replay(_) => (NoticeLevel::Error, "Corrupted history"),
        };
        let notice = Notice::new(level, title, err.to_string());
        match err.field_path() {
            Some(path) => notice.with_field_path(path),
            None => notice,
        }
    }
}

impl From<&ReconcileError> for Notice {
    fn from(err: &ReconcileError) -> Self {
        let field = match err {
            ReconcileError::ZeroQuantity { .. } => LineItemField::Quantity,
            ReconcileError::NonFinite { field } | ReconcileError::NotEditable { field, .. } => {
                *field
            }
        };
        Notice::new(NoticeLevel::Error, "Cannot recalculate", err.to_string())
            .with_field_path(input_path(field))
    }
}

impl From<&InputError> for Notice {
    fn from(err: &InputError) -> Self {
        match err {
            InputError::Rejected { field, .. } => {
                Notice::new(NoticeLevel::Warning, "Invalid number", err.to_string())
                    .with_field_path(input_path(*field))
            }
            InputError::Pattern(_) => {
                Notice::new(NoticeLevel::Error, "Editor misconfigured", err.to_string())
            }
        }
    }
}

impl From<&SessionError> for Notice {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => Notice::new(NoticeLevel::Error, "Not found", err.to_string()),
            SessionError::Input(e) => e.into(),
            SessionError::Reconcile(e) => e.into(),
            SessionError::Dispatch(e) => e.into(),
        }
    }
}
