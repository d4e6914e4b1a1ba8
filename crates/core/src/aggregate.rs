//! Document aggregate traits for event-sourced business documents.

use crate::error::{DomainError, DomainResult};

/// Document root marker + minimal interface.
///
/// Every business document (invoice, billing statement, expense report) is an
/// aggregate owning its line items. The revision counts applied operations.
pub trait Document {
    /// Strongly-typed document identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the document identifier.
    fn id(&self) -> &Self::Id;

    /// Number of operations applied to this document.
    fn revision(&self) -> u64;
}

/// Optimistic concurrency expectation for a document.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedRevision {
    /// Skip revision checking.
    Any,
    /// Require the document to be at an exact revision.
    Exact(u64),
}

impl ExpectedRevision {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedRevision::Any => true,
            ExpectedRevision::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "stale document revision (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

/// Document execution semantics (pure, deterministic).
///
/// - `handle(&self, action)` decides which operations an action produces.
/// - `apply(&mut self, operation)` evolves state; it must not fail, since
///   operations are facts that were already accepted.
///
/// Implementations perform no IO.
pub trait DocumentModel: Document {
    type Action: Clone + core::fmt::Debug;
    type Operation: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single operation (+1 revision).
    fn apply(&mut self, operation: &Self::Operation);

    /// Decide which operations to record for an action, without mutating state.
    fn handle(&self, action: &Self::Action) -> Result<Vec<Self::Operation>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_revision_rejects_stale_state() {
        assert!(ExpectedRevision::Exact(3).check(3).is_ok());
        let err = ExpectedRevision::Exact(2).check(3).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn any_revision_always_matches() {
        assert!(ExpectedRevision::Any.matches(0));
        assert!(ExpectedRevision::Any.matches(u64::MAX));
    }
}
