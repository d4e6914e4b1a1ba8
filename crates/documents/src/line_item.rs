//! Line items and the actions/operations shared by every document type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docforge_core::{Currency, DocumentModel, DomainError, DomainResult, LineItemId};
use docforge_reconcile::{LineItemField, LineItemPatch, LineItemValues, Profile, Tolerance};

/// One billable row. Owned by exactly one document (or wallet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub description: String,
    #[serde(flatten)]
    pub values: LineItemValues,
}

/// Action: ADD_LINE_ITEM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineItem {
    pub id: LineItemId,
    pub description: String,
    #[serde(flatten)]
    pub values: LineItemValues,
    pub occurred_at: DateTime<Utc>,
}

/// Action: EDIT_LINE_ITEM. Absent fields stay as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditLineItem {
    pub id: LineItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub patch: LineItemPatch,
    pub occurred_at: DateTime<Utc>,
}

/// Action: DELETE_LINE_ITEM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLineItem {
    pub id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Operation: line item added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemAdded {
    pub item: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Operation: line item edited (only the changed fields are recorded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemEdited {
    pub id: LineItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub patch: LineItemPatch,
    pub occurred_at: DateTime<Utc>,
}

/// Operation: line item deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDeleted {
    pub id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// A document whose line items can be edited through a draft session.
///
/// `Scope` locates the owning collection: `()` for documents with a single
/// list, a wallet address for expense reports.
pub trait LineItemDocument: DocumentModel<Error = DomainError> {
    type Scope: Clone + core::fmt::Debug;

    /// Field set and tax rules of this editor.
    const PROFILE: Profile;

    /// `None` until the document has been created.
    fn currency(&self) -> Option<&Currency>;

    /// Tolerance used when checking line-item invariants.
    fn tolerance(&self) -> Tolerance;

    fn set_tolerance(&mut self, tolerance: Tolerance);

    fn line_item(&self, scope: &Self::Scope, id: LineItemId) -> Option<&LineItem>;

    fn add_line_item(scope: &Self::Scope, action: AddLineItem) -> Self::Action;

    fn edit_line_item(scope: &Self::Scope, action: EditLineItem) -> Self::Action;

    fn delete_line_item(scope: &Self::Scope, action: DeleteLineItem) -> Self::Action;
}

/// Ordered line-item list with the decide/apply rules shared by all documents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineItems {
    items: Vec<LineItem>,
}

impl LineItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[LineItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn total_excl(&self) -> f64 {
        self.items.iter().map(|i| i.values.total_price_tax_excl).sum()
    }

    pub fn total_incl(&self) -> f64 {
        self.items.iter().map(|i| i.values.total_price_tax_incl).sum()
    }

    pub fn decide_add(
        &self,
        action: &AddLineItem,
        profile: Profile,
        tolerance: &Tolerance,
    ) -> DomainResult<LineItemAdded> {
        if self.get(action.id).is_some() {
            return Err(DomainError::conflict(format!(
                "line item {} already exists",
                action.id
            )));
        }
        for field in LineItemField::ALL {
            validate_field(field, action.values.get(field), profile)?;
        }
        ensure_consistent(action.id, &action.values, tolerance)?;

        Ok(LineItemAdded {
            item: LineItem {
                id: action.id,
                description: action.description.clone(),
                values: action.values,
            },
            occurred_at: action.occurred_at,
        })
    }

    pub fn decide_edit(
        &self,
        action: &EditLineItem,
        profile: Profile,
        tolerance: &Tolerance,
    ) -> DomainResult<LineItemEdited> {
        let current = self
            .get(action.id)
            .ok_or_else(|| DomainError::not_found(format!("line item {}", action.id)))?;

        if action.patch.is_empty() && action.description.is_none() {
            return Err(DomainError::validation("edit contains no changes"));
        }
        for (field, value) in action.patch.entries() {
            validate_field(field, value, profile)?;
        }
        ensure_consistent(action.id, &action.patch.apply_to(&current.values), tolerance)?;

        Ok(LineItemEdited {
            id: action.id,
            description: action.description.clone(),
            patch: action.patch,
            occurred_at: action.occurred_at,
        })
    }

    pub fn decide_delete(&self, action: &DeleteLineItem) -> DomainResult<LineItemDeleted> {
        if self.get(action.id).is_none() {
            return Err(DomainError::not_found(format!("line item {}", action.id)));
        }
        Ok(LineItemDeleted {
            id: action.id,
            occurred_at: action.occurred_at,
        })
    }

    pub fn apply_added(&mut self, op: &LineItemAdded) {
        self.items.push(op.item.clone());
    }

    pub fn apply_edited(&mut self, op: &LineItemEdited) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == op.id) {
            if let Some(description) = &op.description {
                item.description = description.clone();
            }
            item.values = op.patch.apply_to(&item.values);
        }
    }

    pub fn apply_deleted(&mut self, op: &LineItemDeleted) {
        self.items.retain(|i| i.id != op.id);
    }
}

fn validate_field(field: LineItemField, value: f64, profile: Profile) -> DomainResult<()> {
    let path = format!("input.{field}");
    if !value.is_finite() {
        return Err(DomainError::invalid_field(path, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(DomainError::invalid_field(path, "must not be negative"));
    }
    if field == LineItemField::TaxPercent {
        if value > 100.0 {
            return Err(DomainError::invalid_field(path, "must be between 0 and 100"));
        }
        if profile.is_tax_free() && value != 0.0 {
            return Err(DomainError::invalid_field(
                path,
                format!("{profile:?} line items are tax-free"),
            ));
        }
    }
    Ok(())
}

fn ensure_consistent(
    id: LineItemId,
    values: &LineItemValues,
    tolerance: &Tolerance,
) -> DomainResult<()> {
    match values.inconsistency(tolerance) {
        Some(broken) => {
            tracing::debug!(line_item = %id, broken, "rejected inconsistent line item");
            Err(DomainError::invariant(format!("line item {id}: {broken}")))
        }
        None => Ok(()),
    }
}
