//! Draft editing of a single line item.
//!
//! A draft keeps the last committed values of a line item together with the
//! raw text the user typed since. Nothing reaches the document until
//! [`LineItemDraft::commit`], which reconciles the edits into a minimal patch
//! and dispatches at most one action.

use chrono::Utc;

use docforge_core::LineItemId;
use docforge_documents::{AddLineItem, DeleteLineItem, EditLineItem, LineItemDocument};
use docforge_events::OperationEnvelope;
use docforge_reconcile::{
    FieldEdits, InputGate, LineItemField, LineItemPatch, LineItemValues, ReconcileError,
    ReconcileSettings, Reconciliation, Rule, reconcile,
};

use crate::config::EditorConfig;
use crate::error::SessionError;
use crate::reactor::Dispatch;

/// What a commit did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome<O> {
    /// Nothing changed beyond tolerance; no action was dispatched.
    Unchanged,
    Committed {
        rule: Rule,
        patch: LineItemPatch,
        operations: Vec<OperationEnvelope<O>>,
    },
}

#[derive(Debug, Clone)]
pub struct LineItemDraft<D: LineItemDocument> {
    scope: D::Scope,
    id: LineItemId,
    /// `false` until the line item exists in the document.
    persisted: bool,
    description: String,
    committed: LineItemValues,
    pending_description: Option<String>,
    edits: FieldEdits,
    gate: InputGate,
    settings: ReconcileSettings,
}

impl<D: LineItemDocument> LineItemDraft<D> {
    /// Start editing an existing line item.
    pub fn open(
        document: &D,
        scope: D::Scope,
        id: LineItemId,
        config: &EditorConfig,
    ) -> Result<Self, SessionError> {
        let gate = gate_for(document, config)?;
        let item = document
            .line_item(&scope, id)
            .ok_or_else(|| SessionError::NotFound(format!("line item {id} in {scope:?}")))?;

        Ok(Self {
            description: item.description.clone(),
            committed: item.values,
            scope,
            id,
            persisted: true,
            pending_description: None,
            edits: FieldEdits::new(),
            gate,
            settings: config.reconcile_settings(),
        })
    }

    /// Start a new line item with default values; committing adds it.
    pub fn create(document: &D, scope: D::Scope, config: &EditorConfig) -> Result<Self, SessionError> {
        let gate = gate_for(document, config)?;
        Ok(Self {
            scope,
            id: LineItemId::new(),
            persisted: false,
            description: String::new(),
            committed: LineItemValues::from_unit_price(config.default_quantity, 0.0, 0.0),
            pending_description: None,
            edits: FieldEdits::new(),
            gate,
            settings: config.reconcile_settings(),
        })
    }

    pub fn id(&self) -> LineItemId {
        self.id
    }

    pub fn scope(&self) -> &D::Scope {
        &self.scope
    }

    /// Last committed values.
    pub fn values(&self) -> &LineItemValues {
        &self.committed
    }

    pub fn description(&self) -> &str {
        self.pending_description.as_deref().unwrap_or(&self.description)
    }

    pub fn edits(&self) -> &FieldEdits {
        &self.edits
    }

    pub fn is_dirty(&self) -> bool {
        !self.edits.is_empty() || self.pending_description.is_some()
    }

    /// Record a keystroke for `field`.
    ///
    /// Input that fails the keystroke pattern, or targets a field this
    /// document type does not edit, is rejected and the draft stays as it was.
    pub fn input(&mut self, field: LineItemField, raw: &str) -> Result<(), SessionError> {
        if !D::PROFILE.is_editable(field) {
            tracing::warn!(field = %field, profile = ?D::PROFILE, "keystroke on read-only field");
            return Err(ReconcileError::NotEditable {
                field,
                profile: D::PROFILE,
            }
            .into());
        }
        if let Err(err) = self.gate.check(field, raw) {
            tracing::warn!(field = %field, raw, "keystroke rejected");
            return Err(err.into());
        }
        self.edits.insert(field, raw);
        Ok(())
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.pending_description = Some(text.into());
    }

    /// Reconcile the pending edits without dispatching anything.
    pub fn preview(&self) -> Result<Reconciliation, SessionError> {
        Ok(reconcile(&self.committed, &self.edits, D::PROFILE, &self.settings)?)
    }

    /// Reconcile and dispatch the pending edits.
    ///
    /// Re-typing a value that is already committed is not a change: when every
    /// entered figure equals its committed value, no derived figure moves
    /// beyond tolerance and the description is the same, nothing is
    /// dispatched. On failure the edits are kept so the user can correct and retry.
    pub fn commit<X>(&mut self, dispatcher: &mut X) -> Result<CommitOutcome<X::Operation>, SessionError>
    where
        X: Dispatch<D::Action>,
    {
        let reconciliation = self.preview()?;
        let description = self
            .pending_description
            .clone()
            .filter(|d| *d != self.description);

        let changed = reconciliation.changes(&self.committed, &self.settings.tolerance());

        if self.persisted && !changed && description.is_none() {
            self.discard();
            return Ok(CommitOutcome::Unchanged);
        }

        let occurred_at = Utc::now();
        let action = if self.persisted {
            D::edit_line_item(
                &self.scope,
                EditLineItem {
                    id: self.id,
                    description: description.clone(),
                    patch: reconciliation.patch,
                    occurred_at,
                },
            )
        } else {
            D::add_line_item(
                &self.scope,
                AddLineItem {
                    id: self.id,
                    description: description.clone().unwrap_or_else(|| self.description.clone()),
                    values: reconciliation.values,
                    occurred_at,
                },
            )
        };

        let operations = dispatcher.dispatch(action).map_err(|err| {
            tracing::warn!(line_item = %self.id, error = %err, "commit failed; keeping edits");
            err
        })?;

        self.committed = if self.persisted {
            reconciliation.patch.apply_to(&self.committed)
        } else {
            reconciliation.values
        };
        if let Some(description) = description {
            self.description = description;
        }
        self.persisted = true;
        self.discard();

        Ok(CommitOutcome::Committed {
            rule: reconciliation.rule,
            patch: reconciliation.patch,
            operations,
        })
    }

    /// Drop all pending edits.
    pub fn discard(&mut self) {
        self.edits.clear();
        self.pending_description = None;
    }

    /// Reload the committed record from `document`, keeping pending edits.
    pub fn rebase(&mut self, document: &D) -> Result<(), SessionError> {
        let item = document.line_item(&self.scope, self.id).ok_or_else(|| {
            SessionError::NotFound(format!("line item {} in {:?}", self.id, self.scope))
        })?;
        self.committed = item.values;
        self.description = item.description.clone();
        self.persisted = true;
        Ok(())
    }

    /// Delete the line item this draft edits.
    pub fn delete<X>(self, dispatcher: &mut X) -> Result<Vec<OperationEnvelope<X::Operation>>, SessionError>
    where
        X: Dispatch<D::Action>,
    {
        if !self.persisted {
            return Ok(Vec::new());
        }
        let action = D::delete_line_item(
            &self.scope,
            DeleteLineItem {
                id: self.id,
                occurred_at: Utc::now(),
            },
        );
        Ok(dispatcher.dispatch(action)?)
    }
}

fn gate_for<D: LineItemDocument>(document: &D, config: &EditorConfig) -> Result<InputGate, SessionError> {
    let currency = document
        .currency()
        .ok_or_else(|| SessionError::NotFound("document has not been created".to_string()))?;
    Ok(InputGate::for_currency(currency, &config.precision_policy())?)
}
