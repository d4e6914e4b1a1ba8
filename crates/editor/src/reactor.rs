//! In-process document reactor.
//!
//! The reactor owns one document, its operation log and a bus. Dispatching an
//! action runs the usual event-sourcing pipeline:
//!
//! ```text
//! Action
//!   ↓
//! 1. Check the expected revision
//!   ↓
//! 2. Decide operations (pure, no mutation)
//!   ↓
//! 3. Append envelopes to the log and apply them
//!   ↓
//! 4. Publish envelopes to subscribers
//! ```
//!
//! The log is the source of truth: a document can always be rebuilt from it
//! with [`Reactor::replay`].

use uuid::Uuid;

use docforge_core::{Document, DocumentId, DocumentModel, DomainError, ExpectedRevision};
use docforge_documents::LineItemDocument;
use docforge_events::{Action, EventBus, Operation, OperationEnvelope, Subscription};

use crate::config::EditorConfig;
use crate::error::DispatchError;

/// Something that accepts actions of type `A`.
///
/// Draft sessions commit through this seam so they do not depend on a
/// concrete reactor.
pub trait Dispatch<A> {
    type Operation;

    fn dispatch(&mut self, action: A) -> Result<Vec<OperationEnvelope<Self::Operation>>, DispatchError>;
}

#[derive(Debug)]
pub struct Reactor<D: DocumentModel, B> {
    document: D,
    document_type: String,
    log: Vec<OperationEnvelope<D::Operation>>,
    bus: B,
}

impl<D, B> Reactor<D, B>
where
    D: DocumentModel<Error = DomainError> + Document<Id = DocumentId>,
    D::Action: Action,
    D::Operation: Operation,
    B: EventBus<OperationEnvelope<D::Operation>>,
{
    pub fn new(document: D, document_type: impl Into<String>, bus: B) -> Self {
        Self {
            document,
            document_type: document_type.into(),
            log: Vec::new(),
            bus,
        }
    }

    /// Rebuild a reactor from an operation log.
    ///
    /// Every envelope must belong to `document` and indices must strictly
    /// increase. Replayed operations are not re-published.
    pub fn replay(
        document: D,
        document_type: impl Into<String>,
        bus: B,
        log: impl IntoIterator<Item = OperationEnvelope<D::Operation>>,
    ) -> Result<Self, DispatchError> {
        let mut reactor = Self::new(document, document_type, bus);
        let document_id = *reactor.document.id();

        for (position, envelope) in log.into_iter().enumerate() {
            if envelope.document_id() != document_id {
                return Err(DispatchError::Replay(format!(
                    "entry {position} belongs to document {}",
                    envelope.document_id()
                )));
            }
            if envelope.document_type() != reactor.document_type {
                return Err(DispatchError::Replay(format!(
                    "entry {position} has document type '{}', expected '{}'",
                    envelope.document_type(),
                    reactor.document_type
                )));
            }
            let last = reactor.last_index();
            if envelope.index() <= last {
                return Err(DispatchError::Replay(format!(
                    "non-monotonic index at entry {position} (last={last}, found={})",
                    envelope.index()
                )));
            }
            reactor.document.apply(envelope.payload());
            reactor.log.push(envelope);
        }

        tracing::debug!(
            document_id = %document_id,
            operations = reactor.log.len(),
            revision = reactor.document.revision(),
            "replayed operation log"
        );
        Ok(reactor)
    }

    /// Dispatch `action` only if the document is still at `expected`.
    pub fn dispatch_expecting(
        &mut self,
        expected: ExpectedRevision,
        action: D::Action,
    ) -> Result<Vec<OperationEnvelope<D::Operation>>, DispatchError> {
        let document_id = *self.document.id();
        let action_type = action.action_type();

        let decided = expected
            .check(self.document.revision())
            .and_then(|()| self.document.handle(&action))
            .map_err(|err| {
                tracing::warn!(document_id = %document_id, action_type, error = %err, "action rejected");
                DispatchError::from(err)
            })?;

        let mut committed = Vec::with_capacity(decided.len());
        for operation in decided {
            self.document.apply(&operation);
            let envelope = OperationEnvelope::new(
                Uuid::now_v7(),
                document_id,
                self.document_type.clone(),
                self.last_index() + 1,
                operation,
            );
            self.log.push(envelope.clone());
            committed.push(envelope);
        }

        tracing::info!(
            document_id = %document_id,
            action_type,
            operations = committed.len(),
            revision = self.document.revision(),
            "dispatched action"
        );

        for envelope in &committed {
            self.bus.publish(envelope.clone()).map_err(|e| {
                tracing::warn!(
                    document_id = %document_id,
                    operation_type = envelope.payload().operation_type(),
                    "publishing operation failed"
                );
                DispatchError::Publish(format!("{e:?}"))
            })?;
        }

        Ok(committed)
    }

    pub fn subscribe(&self) -> Subscription<OperationEnvelope<D::Operation>> {
        self.bus.subscribe()
    }

    pub fn state(&self) -> &D {
        &self.document
    }

    pub fn log(&self) -> &[OperationEnvelope<D::Operation>] {
        &self.log
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    fn last_index(&self) -> u64 {
        self.log.last().map(|e| e.index()).unwrap_or(0)
    }
}

impl<D, B> Reactor<D, B>
where
    D: LineItemDocument + Document<Id = DocumentId>,
    D::Action: Action,
    D::Operation: Operation,
    B: EventBus<OperationEnvelope<D::Operation>>,
{
    /// Like [`Reactor::new`], with the document checking invariants at the
    /// tolerance drafts opened from `config` reconcile with.
    pub fn configured(
        mut document: D,
        document_type: impl Into<String>,
        bus: B,
        config: &EditorConfig,
    ) -> Self {
        document.set_tolerance(config.tolerance());
        Self::new(document, document_type, bus)
    }

    /// Like [`Reactor::replay`], with the tolerance taken from `config`.
    pub fn replay_configured(
        mut document: D,
        document_type: impl Into<String>,
        bus: B,
        log: impl IntoIterator<Item = OperationEnvelope<D::Operation>>,
        config: &EditorConfig,
    ) -> Result<Self, DispatchError> {
        document.set_tolerance(config.tolerance());
        Self::replay(document, document_type, bus, log)
    }
}

impl<D, B> Dispatch<D::Action> for Reactor<D, B>
where
    D: DocumentModel<Error = DomainError> + Document<Id = DocumentId>,
    D::Action: Action,
    D::Operation: Operation,
    B: EventBus<OperationEnvelope<D::Operation>>,
{
    type Operation = D::Operation;

    fn dispatch(
        &mut self,
        action: D::Action,
    ) -> Result<Vec<OperationEnvelope<D::Operation>>, DispatchError> {
        self.dispatch_expecting(ExpectedRevision::Any, action)
    }
}
