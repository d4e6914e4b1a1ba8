/// A request dispatched against a document (`ADD_LINE_ITEM`, `EDIT_LINE_ITEM`, ...).
///
/// Actions express **intent**. They are transient: the reactor validates them
/// against current state and, if accepted, records the resulting operations.
/// A rejected action leaves no trace in the operation log.
///
/// Actions must be cloneable and own their data so they can be logged, queued
/// or re-dispatched after the user fixes a validation error.
pub trait Action: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable action name in the document-model convention (e.g. "EDIT_LINE_ITEM").
    fn action_type(&self) -> &'static str;
}
