use chrono::{DateTime, Utc};

/// An accepted, immutable change to a document.
///
/// Operations are:
/// - **facts** (never rejected on replay)
/// - **versioned** (schema evolution)
/// - **append-only** within a document's log
pub trait Operation: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable operation name (e.g. "invoice.line_item.edited").
    fn operation_type(&self) -> &'static str;

    /// Schema version for this operation type.
    fn version(&self) -> u32;

    /// When the user performed the change.
    fn occurred_at(&self) -> DateTime<Utc>;
}
