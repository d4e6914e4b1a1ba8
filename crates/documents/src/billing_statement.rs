use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docforge_core::{Currency, Document, DocumentId, DocumentModel, DomainError, LineItemId};
use docforge_events::{Action, Operation};
use docforge_reconcile::{Profile, Tolerance};

use crate::line_item::{
    AddLineItem, DeleteLineItem, EditLineItem, LineItem, LineItemAdded, LineItemDeleted,
    LineItemDocument, LineItemEdited, LineItems,
};

pub const BILLING_STATEMENT_DOCUMENT_TYPE: &str = "docforge/billing-statement";

/// Aggregate root: BillingStatement.
///
/// Statements are tax-free: every line carries a 0 % rate, so inclusive
/// figures always mirror the exclusive ones.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingStatement {
    id: DocumentId,
    currency: Option<Currency>,
    line_items: LineItems,
    tolerance: Tolerance,
    revision: u64,
    created: bool,
}

impl BillingStatement {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: DocumentId) -> Self {
        Self {
            id,
            currency: None,
            line_items: LineItems::new(),
            tolerance: Tolerance::default(),
            revision: 0,
            created: false,
        }
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn line_items(&self) -> &[LineItem] {
        self.line_items.as_slice()
    }

    /// Amount due across all lines.
    pub fn total(&self) -> f64 {
        self.line_items.total_excl()
    }

}

impl Document for BillingStatement {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

/// Action: CREATE_BILLING_STATEMENT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillingStatement {
    pub statement_id: DocumentId,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "input", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingStatementAction {
    CreateBillingStatement(CreateBillingStatement),
    AddLineItem(AddLineItem),
    EditLineItem(EditLineItem),
    DeleteLineItem(DeleteLineItem),
}

impl Action for BillingStatementAction {
    fn action_type(&self) -> &'static str {
        match self {
            BillingStatementAction::CreateBillingStatement(_) => "CREATE_BILLING_STATEMENT",
            BillingStatementAction::AddLineItem(_) => "ADD_LINE_ITEM",
            BillingStatementAction::EditLineItem(_) => "EDIT_LINE_ITEM",
            BillingStatementAction::DeleteLineItem(_) => "DELETE_LINE_ITEM",
        }
    }
}

/// Operation: BillingStatementCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingStatementCreated {
    pub statement_id: DocumentId,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BillingStatementOperation {
    BillingStatementCreated(BillingStatementCreated),
    LineItemAdded(LineItemAdded),
    LineItemEdited(LineItemEdited),
    LineItemDeleted(LineItemDeleted),
}

impl Operation for BillingStatementOperation {
    fn operation_type(&self) -> &'static str {
        match self {
            BillingStatementOperation::BillingStatementCreated(_) => "billing_statement.created",
            BillingStatementOperation::LineItemAdded(_) => "billing_statement.line_item.added",
            BillingStatementOperation::LineItemEdited(_) => "billing_statement.line_item.edited",
            BillingStatementOperation::LineItemDeleted(_) => "billing_statement.line_item.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BillingStatementOperation::BillingStatementCreated(o) => o.occurred_at,
            BillingStatementOperation::LineItemAdded(o) => o.occurred_at,
            BillingStatementOperation::LineItemEdited(o) => o.occurred_at,
            BillingStatementOperation::LineItemDeleted(o) => o.occurred_at,
        }
    }
}

impl DocumentModel for BillingStatement {
    type Action = BillingStatementAction;
    type Operation = BillingStatementOperation;
    type Error = DomainError;

    fn apply(&mut self, operation: &Self::Operation) {
        match operation {
            BillingStatementOperation::BillingStatementCreated(o) => {
                self.id = o.statement_id;
                self.currency = Some(o.currency.clone());
                self.created = true;
            }
            BillingStatementOperation::LineItemAdded(o) => self.line_items.apply_added(o),
            BillingStatementOperation::LineItemEdited(o) => self.line_items.apply_edited(o),
            BillingStatementOperation::LineItemDeleted(o) => self.line_items.apply_deleted(o),
        }

        self.revision += 1;
    }

    fn handle(&self, action: &Self::Action) -> Result<Vec<Self::Operation>, Self::Error> {
        let op = match action {
            BillingStatementAction::CreateBillingStatement(cmd) => return self.handle_create(cmd),
            BillingStatementAction::AddLineItem(a) => {
                self.ensure_created()?;
                BillingStatementOperation::LineItemAdded(self.line_items.decide_add(
                    a,
                    Self::PROFILE,
                    &self.tolerance,
                )?)
            }
            BillingStatementAction::EditLineItem(a) => {
                self.ensure_created()?;
                BillingStatementOperation::LineItemEdited(self.line_items.decide_edit(
                    a,
                    Self::PROFILE,
                    &self.tolerance,
                )?)
            }
            BillingStatementAction::DeleteLineItem(a) => {
                self.ensure_created()?;
                BillingStatementOperation::LineItemDeleted(self.line_items.decide_delete(a)?)
            }
        };
        Ok(vec![op])
    }
}

impl BillingStatement {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if self.created {
            Ok(())
        } else {
            Err(DomainError::not_found(format!("billing statement {}", self.id)))
        }
    }

    fn handle_create(&self, cmd: &CreateBillingStatement) -> Result<Vec<BillingStatementOperation>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("billing statement already exists"));
        }
        if cmd.statement_id != self.id {
            return Err(DomainError::invariant("statement_id mismatch"));
        }

        Ok(vec![BillingStatementOperation::BillingStatementCreated(BillingStatementCreated {
            statement_id: cmd.statement_id,
            currency: cmd.currency.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

impl LineItemDocument for BillingStatement {
    type Scope = ();

    const PROFILE: Profile = Profile::BillingStatement;

    fn currency(&self) -> Option<&Currency> {
        self.currency.as_ref()
    }

    fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    fn set_tolerance(&mut self, tolerance: Tolerance) {
        self.tolerance = tolerance;
    }

    fn line_item(&self, _scope: &(), id: LineItemId) -> Option<&LineItem> {
        self.line_items.get(id)
    }

    fn add_line_item(_scope: &(), action: AddLineItem) -> BillingStatementAction {
        BillingStatementAction::AddLineItem(action)
    }

    fn edit_line_item(_scope: &(), action: EditLineItem) -> BillingStatementAction {
        BillingStatementAction::EditLineItem(action)
    }

    fn delete_line_item(_scope: &(), action: DeleteLineItem) -> BillingStatementAction {
        BillingStatementAction::DeleteLineItem(action)
    }
}
