use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docforge_core::{Currency, Document, DocumentId, DocumentModel, DomainError, LineItemId};
use docforge_events::{Action, Operation};
use docforge_reconcile::{Profile, Tolerance};

use crate::line_item::{
    AddLineItem, DeleteLineItem, EditLineItem, LineItem, LineItemAdded, LineItemDeleted,
    LineItemDocument, LineItemEdited, LineItems,
};

pub const INVOICE_DOCUMENT_TYPE: &str = "docforge/invoice";

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    id: DocumentId,
    currency: Option<Currency>,
    line_items: LineItems,
    tolerance: Tolerance,
    revision: u64,
    created: bool,
}

impl Invoice {
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

    /// Sum of all line totals before tax.
    pub fn total_excl(&self) -> f64 {
        self.line_items.total_excl()
    }

    /// Sum of all line totals including tax.
    pub fn total_incl(&self) -> f64 {
        self.line_items.total_incl()
    }
}

impl Document for Invoice {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

/// Action: CREATE_INVOICE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoice {
    pub invoice_id: DocumentId,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "input", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceAction {
    CreateInvoice(CreateInvoice),
    AddLineItem(AddLineItem),
    EditLineItem(EditLineItem),
    DeleteLineItem(DeleteLineItem),
}

impl Action for InvoiceAction {
    fn action_type(&self) -> &'static str {
        match self {
            InvoiceAction::CreateInvoice(_) => "CREATE_INVOICE",
            InvoiceAction::AddLineItem(_) => "ADD_LINE_ITEM",
            InvoiceAction::EditLineItem(_) => "EDIT_LINE_ITEM",
            InvoiceAction::DeleteLineItem(_) => "DELETE_LINE_ITEM",
        }
    }
}

/// Operation: InvoiceCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCreated {
    pub invoice_id: DocumentId,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InvoiceOperation {
    InvoiceCreated(InvoiceCreated),
    LineItemAdded(LineItemAdded),
    LineItemEdited(LineItemEdited),
    LineItemDeleted(LineItemDeleted),
}

impl Operation for InvoiceOperation {
    fn operation_type(&self) -> &'static str {
        match self {
            InvoiceOperation::InvoiceCreated(_) => "invoice.created",
            InvoiceOperation::LineItemAdded(_) => "invoice.line_item.added",
            InvoiceOperation::LineItemEdited(_) => "invoice.line_item.edited",
            InvoiceOperation::LineItemDeleted(_) => "invoice.line_item.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceOperation::InvoiceCreated(o) => o.occurred_at,
            InvoiceOperation::LineItemAdded(o) => o.occurred_at,
            InvoiceOperation::LineItemEdited(o) => o.occurred_at,
            InvoiceOperation::LineItemDeleted(o) => o.occurred_at,
        }
    }
}

impl DocumentModel for Invoice {
    type Action = InvoiceAction;
    type Operation = InvoiceOperation;
    type Error = DomainError;

    fn apply(&mut self, operation: &Self::Operation) {
        match operation {
            InvoiceOperation::InvoiceCreated(o) => {
                self.id = o.invoice_id;
                self.currency = Some(o.currency.clone());
                self.created = true;
            }
            InvoiceOperation::LineItemAdded(o) => self.line_items.apply_added(o),
            InvoiceOperation::LineItemEdited(o) => self.line_items.apply_edited(o),
            InvoiceOperation::LineItemDeleted(o) => self.line_items.apply_deleted(o),
        }

        self.revision += 1;
    }

    fn handle(&self, action: &Self::Action) -> Result<Vec<Self::Operation>, Self::Error> {
        let op = match action {
            InvoiceAction::CreateInvoice(cmd) => return self.handle_create(cmd),
            InvoiceAction::AddLineItem(a) => {
                self.ensure_created()?;
                InvoiceOperation::LineItemAdded(self.line_items.decide_add(
                    a,
                    Self::PROFILE,
                    &self.tolerance,
                )?)
            }
            InvoiceAction::EditLineItem(a) => {
                self.ensure_created()?;
                InvoiceOperation::LineItemEdited(self.line_items.decide_edit(
                    a,
                    Self::PROFILE,
                    &self.tolerance,
                )?)
            }
            InvoiceAction::DeleteLineItem(a) => {
                self.ensure_created()?;
                InvoiceOperation::LineItemDeleted(self.line_items.decide_delete(a)?)
            }
        };
        Ok(vec![op])
    }
}

impl Invoice {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if self.created {
            Ok(())
        } else {
            Err(DomainError::not_found(format!("invoice {}", self.id)))
        }
    }

    fn handle_create(&self, cmd: &CreateInvoice) -> Result<Vec<InvoiceOperation>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("invoice already exists"));
        }
        if cmd.invoice_id != self.id {
            return Err(DomainError::invariant("invoice_id mismatch"));
        }

        Ok(vec![InvoiceOperation::InvoiceCreated(InvoiceCreated {
            invoice_id: cmd.invoice_id,
            currency: cmd.currency.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

impl LineItemDocument for Invoice {
    type Scope = ();

    const PROFILE: Profile = Profile::Invoice;

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

    fn add_line_item(_scope: &(), action: AddLineItem) -> InvoiceAction {
        InvoiceAction::AddLineItem(action)
    }

    fn edit_line_item(_scope: &(), action: EditLineItem) -> InvoiceAction {
        InvoiceAction::EditLineItem(action)
    }

    fn delete_line_item(_scope: &(), action: DeleteLineItem) -> InvoiceAction {
        InvoiceAction::DeleteLineItem(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docforge_events::execute;
    use docforge_reconcile::{LineItemField, LineItemPatch, LineItemValues};

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn eur() -> Currency {
        "EUR".parse().unwrap()
    }

    fn created_invoice() -> Invoice {
        let id = DocumentId::new();
        let mut invoice = Invoice::empty(id);
        execute(
            &mut invoice,
            &InvoiceAction::CreateInvoice(CreateInvoice {
                invoice_id: id,
                currency: eur(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        invoice
    }

    fn add_action(quantity: f64, unit: f64, tax: f64) -> AddLineItem {
        AddLineItem {
            id: LineItemId::new(),
            description: "Design work".to_string(),
            values: LineItemValues::from_unit_price(quantity, unit, tax),
            occurred_at: test_time(),
        }
    }

    #[test]
    fn create_invoice_emits_invoice_created_operation() {
        let id = DocumentId::new();
        let invoice = Invoice::empty(id);
        let ops = invoice
            .handle(&InvoiceAction::CreateInvoice(CreateInvoice {
                invoice_id: id,
                currency: eur(),
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            InvoiceOperation::InvoiceCreated(o) => {
                assert_eq!(o.invoice_id, id);
                assert_eq!(o.currency, eur());
            }
            _ => panic!("Expected InvoiceCreated operation"),
        }
        assert_eq!(ops[0].operation_type(), "invoice.created");
    }

    #[test]
    fn cannot_create_twice() {
        let invoice = created_invoice();
        let err = invoice
            .handle(&InvoiceAction::CreateInvoice(CreateInvoice {
                invoice_id: *invoice.id(),
                currency: eur(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn line_item_actions_require_creation() {
        let invoice = Invoice::empty(DocumentId::new());
        let err = invoice
            .handle(&InvoiceAction::AddLineItem(add_action(1.0, 1.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn add_edit_delete_lifecycle_tracks_totals_and_revision() {
        let mut invoice = created_invoice();
        let first = add_action(2.0, 50.0, 20.0);
        let second = add_action(1.0, 10.0, 0.0);
        execute(&mut invoice, &InvoiceAction::AddLineItem(first.clone())).unwrap();
        execute(&mut invoice, &InvoiceAction::AddLineItem(second.clone())).unwrap();
        assert_eq!(invoice.line_items().len(), 2);
        assert!((invoice.total_excl() - 110.0).abs() < 1e-9);
        assert!((invoice.total_incl() - 130.0).abs() < 1e-9);

        let mut patch = LineItemPatch::default();
        patch.set(LineItemField::Quantity, 3.0);
        patch.set(LineItemField::TotalPriceTaxExcl, 30.0);
        patch.set(LineItemField::TotalPriceTaxIncl, 30.0);
        execute(
            &mut invoice,
            &InvoiceAction::EditLineItem(EditLineItem {
                id: second.id,
                description: None,
                patch,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert!((invoice.total_excl() - 130.0).abs() < 1e-9);

        execute(
            &mut invoice,
            &InvoiceAction::DeleteLineItem(DeleteLineItem {
                id: first.id,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert_eq!(invoice.line_items().len(), 1);
        assert_eq!(invoice.revision(), 5);
    }

    #[test]
    fn duplicate_line_item_id_is_a_conflict() {
        let mut invoice = created_invoice();
        let add = add_action(1.0, 5.0, 0.0);
        execute(&mut invoice, &InvoiceAction::AddLineItem(add.clone())).unwrap();
        let err = invoice
            .handle(&InvoiceAction::AddLineItem(add))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn tax_above_hundred_percent_is_rejected_with_path() {
        let invoice = created_invoice();
        let err = invoice
            .handle(&InvoiceAction::AddLineItem(add_action(1.0, 5.0, 150.0)))
            .unwrap_err();
        assert_eq!(err.field_path(), Some("input.taxPercent"));
    }

    #[test]
    fn actions_use_document_model_envelope_shape() {
        let action = InvoiceAction::DeleteLineItem(DeleteLineItem {
            id: LineItemId::new(),
            occurred_at: test_time(),
        });
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "DELETE_LINE_ITEM");
        assert!(json["input"]["id"].is_string());
        assert_eq!(action.action_type(), "DELETE_LINE_ITEM");
    }
}
