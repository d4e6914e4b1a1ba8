use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docforge_core::{Currency, Document, DocumentId, DocumentModel, DomainError, LineItemId};
use docforge_events::{Action, Operation};
use docforge_reconcile::{Profile, Tolerance};

use crate::line_item::{
    AddLineItem, DeleteLineItem, EditLineItem, LineItem, LineItemAdded, LineItemDeleted,
    LineItemDocument, LineItemEdited, LineItems,
};

pub const EXPENSE_REPORT_DOCUMENT_TYPE: &str = "docforge/expense-report";

/// Address of a wallet whose spending the report covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::str::FromStr for WalletAddress {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::invalid_id(format!("WalletAddress: {s:?}")));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

impl core::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A wallet and the expenses booked against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    address: WalletAddress,
    name: Option<String>,
    line_items: LineItems,
}

impl Wallet {
    pub fn address(&self) -> &WalletAddress {
        &self.address
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn line_items(&self) -> &[LineItem] {
        self.line_items.as_slice()
    }

    pub fn total_excl(&self) -> f64 {
        self.line_items.total_excl()
    }

    pub fn total_incl(&self) -> f64 {
        self.line_items.total_incl()
    }
}

/// Aggregate root: ExpenseReport.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseReport {
    id: DocumentId,
    currency: Option<Currency>,
    wallets: Vec<Wallet>,
    tolerance: Tolerance,
    revision: u64,
    created: bool,
}

impl ExpenseReport {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: DocumentId) -> Self {
        Self {
            id,
            currency: None,
            wallets: Vec::new(),
            tolerance: Tolerance::default(),
            revision: 0,
            created: false,
        }
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    pub fn wallet(&self, address: &WalletAddress) -> Option<&Wallet> {
        self.wallets.iter().find(|w| &w.address == address)
    }

    pub fn total_excl(&self) -> f64 {
        self.wallets.iter().map(Wallet::total_excl).sum()
    }

    pub fn total_incl(&self) -> f64 {
        self.wallets.iter().map(Wallet::total_incl).sum()
    }

    fn wallet_mut(&mut self, address: &WalletAddress) -> Option<&mut Wallet> {
        self.wallets.iter_mut().find(|w| &w.address == address)
    }
}

impl Document for ExpenseReport {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

/// Action: CREATE_EXPENSE_REPORT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseReport {
    pub report_id: DocumentId,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
}

/// Action: ADD_WALLET.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWallet {
    pub address: WalletAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Action: REMOVE_WALLET. Drops the wallet together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveWallet {
    pub address: WalletAddress,
    pub occurred_at: DateTime<Utc>,
}

/// A line-item action or operation targeting one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InWallet<T> {
    pub wallet: WalletAddress,
    #[serde(flatten)]
    pub inner: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "input", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseReportAction {
    CreateExpenseReport(CreateExpenseReport),
    AddWallet(AddWallet),
    RemoveWallet(RemoveWallet),
    AddLineItem(InWallet<AddLineItem>),
    EditLineItem(InWallet<EditLineItem>),
    DeleteLineItem(InWallet<DeleteLineItem>),
}

impl Action for ExpenseReportAction {
    fn action_type(&self) -> &'static str {
        match self {
            ExpenseReportAction::CreateExpenseReport(_) => "CREATE_EXPENSE_REPORT",
            ExpenseReportAction::AddWallet(_) => "ADD_WALLET",
            ExpenseReportAction::RemoveWallet(_) => "REMOVE_WALLET",
            ExpenseReportAction::AddLineItem(_) => "ADD_LINE_ITEM",
            ExpenseReportAction::EditLineItem(_) => "EDIT_LINE_ITEM",
            ExpenseReportAction::DeleteLineItem(_) => "DELETE_LINE_ITEM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReportCreated {
    pub report_id: DocumentId,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAdded {
    pub address: WalletAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRemoved {
    pub address: WalletAddress,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExpenseReportOperation {
    ExpenseReportCreated(ExpenseReportCreated),
    WalletAdded(WalletAdded),
    WalletRemoved(WalletRemoved),
    LineItemAdded(InWallet<LineItemAdded>),
    LineItemEdited(InWallet<LineItemEdited>),
    LineItemDeleted(InWallet<LineItemDeleted>),
}

impl Operation for ExpenseReportOperation {
    fn operation_type(&self) -> &'static str {
        match self {
            ExpenseReportOperation::ExpenseReportCreated(_) => "expense_report.created",
            ExpenseReportOperation::WalletAdded(_) => "expense_report.wallet.added",
            ExpenseReportOperation::WalletRemoved(_) => "expense_report.wallet.removed",
            ExpenseReportOperation::LineItemAdded(_) => "expense_report.line_item.added",
            ExpenseReportOperation::LineItemEdited(_) => "expense_report.line_item.edited",
            ExpenseReportOperation::LineItemDeleted(_) => "expense_report.line_item.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ExpenseReportOperation::ExpenseReportCreated(o) => o.occurred_at,
            ExpenseReportOperation::WalletAdded(o) => o.occurred_at,
            ExpenseReportOperation::WalletRemoved(o) => o.occurred_at,
            ExpenseReportOperation::LineItemAdded(o) => o.inner.occurred_at,
            ExpenseReportOperation::LineItemEdited(o) => o.inner.occurred_at,
            ExpenseReportOperation::LineItemDeleted(o) => o.inner.occurred_at,
        }
    }
}

impl DocumentModel for ExpenseReport {
    type Action = ExpenseReportAction;
    type Operation = ExpenseReportOperation;
    type Error = DomainError;

    fn apply(&mut self, operation: &Self::Operation) {
        match operation {
            ExpenseReportOperation::ExpenseReportCreated(o) => {
                self.id = o.report_id;
                self.currency = Some(o.currency.clone());
                self.created = true;
            }
            ExpenseReportOperation::WalletAdded(o) => self.wallets.push(Wallet {
                address: o.address.clone(),
                name: o.name.clone(),
                line_items: LineItems::new(),
            }),
            ExpenseReportOperation::WalletRemoved(o) => {
                self.wallets.retain(|w| w.address != o.address)
            }
            ExpenseReportOperation::LineItemAdded(o) => {
                if let Some(w) = self.wallet_mut(&o.wallet) {
                    w.line_items.apply_added(&o.inner);
                }
            }
            ExpenseReportOperation::LineItemEdited(o) => {
                if let Some(w) = self.wallet_mut(&o.wallet) {
                    w.line_items.apply_edited(&o.inner);
                }
            }
            ExpenseReportOperation::LineItemDeleted(o) => {
                if let Some(w) = self.wallet_mut(&o.wallet) {
                    w.line_items.apply_deleted(&o.inner);
                }
            }
        }

        self.revision += 1;
    }

    fn handle(&self, action: &Self::Action) -> Result<Vec<Self::Operation>, Self::Error> {
        let op = match action {
            ExpenseReportAction::CreateExpenseReport(cmd) => return self.handle_create(cmd),
            ExpenseReportAction::AddWallet(cmd) => {
                self.ensure_created()?;
                if self.wallet(&cmd.address).is_some() {
                    return Err(DomainError::conflict(format!(
                        "wallet {} already exists",
                        cmd.address
                    )));
                }
                ExpenseReportOperation::WalletAdded(WalletAdded {
                    address: cmd.address.clone(),
                    name: cmd.name.clone(),
                    occurred_at: cmd.occurred_at,
                })
            }
            ExpenseReportAction::RemoveWallet(cmd) => {
                self.existing_wallet(&cmd.address)?;
                ExpenseReportOperation::WalletRemoved(WalletRemoved {
                    address: cmd.address.clone(),
                    occurred_at: cmd.occurred_at,
                })
            }
            ExpenseReportAction::AddLineItem(a) => {
                let wallet = self.existing_wallet(&a.wallet)?;
                let added = wallet
                    .line_items
                    .decide_add(&a.inner, Self::PROFILE, &self.tolerance)?;
                ExpenseReportOperation::LineItemAdded(InWallet {
                    wallet: a.wallet.clone(),
                    inner: added,
                })
            }
            ExpenseReportAction::EditLineItem(a) => {
                let wallet = self.existing_wallet(&a.wallet)?;
                let edited = wallet
                    .line_items
                    .decide_edit(&a.inner, Self::PROFILE, &self.tolerance)?;
                ExpenseReportOperation::LineItemEdited(InWallet {
                    wallet: a.wallet.clone(),
                    inner: edited,
                })
            }
            ExpenseReportAction::DeleteLineItem(a) => {
                let wallet = self.existing_wallet(&a.wallet)?;
                let deleted = wallet.line_items.decide_delete(&a.inner)?;
                ExpenseReportOperation::LineItemDeleted(InWallet {
                    wallet: a.wallet.clone(),
                    inner: deleted,
                })
            }
        };
        Ok(vec![op])
    }
}

impl ExpenseReport {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if self.created {
            Ok(())
        } else {
            Err(DomainError::not_found(format!("expense report {}", self.id)))
        }
    }

    fn existing_wallet(&self, address: &WalletAddress) -> Result<&Wallet, DomainError> {
        self.ensure_created()?;
        self.wallet(address)
            .ok_or_else(|| DomainError::not_found(format!("wallet {address}")))
    }

    fn handle_create(
        &self,
        cmd: &CreateExpenseReport,
    ) -> Result<Vec<ExpenseReportOperation>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("expense report already exists"));
        }
        if cmd.report_id != self.id {
            return Err(DomainError::invariant("report_id mismatch"));
        }

        Ok(vec![ExpenseReportOperation::ExpenseReportCreated(
            ExpenseReportCreated {
                report_id: cmd.report_id,
                currency: cmd.currency.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}

impl LineItemDocument for ExpenseReport {
    type Scope = WalletAddress;

    const PROFILE: Profile = Profile::ExpenseReport;

    fn currency(&self) -> Option<&Currency> {
        self.currency.as_ref()
    }

    fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    fn set_tolerance(&mut self, tolerance: Tolerance) {
        self.tolerance = tolerance;
    }

    fn line_item(&self, scope: &WalletAddress, id: LineItemId) -> Option<&LineItem> {
        self.wallet(scope).and_then(|w| w.line_items.get(id))
    }

    fn add_line_item(scope: &WalletAddress, action: AddLineItem) -> ExpenseReportAction {
        ExpenseReportAction::AddLineItem(InWallet {
            wallet: scope.clone(),
            inner: action,
        })
    }

    fn edit_line_item(scope: &WalletAddress, action: EditLineItem) -> ExpenseReportAction {
        ExpenseReportAction::EditLineItem(InWallet {
            wallet: scope.clone(),
            inner: action,
        })
    }

    fn delete_line_item(scope: &WalletAddress, action: DeleteLineItem) -> ExpenseReportAction {
        ExpenseReportAction::DeleteLineItem(InWallet {
            wallet: scope.clone(),
            inner: action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docforge_events::execute;
    use docforge_reconcile::LineItemValues;

    fn wallet(addr: &str) -> WalletAddress {
        addr.parse().unwrap()
    }

    fn report_with_wallet(addr: &str) -> ExpenseReport {
        let id = DocumentId::new();
        let mut report = ExpenseReport::empty(id);
        execute(
            &mut report,
            &ExpenseReportAction::CreateExpenseReport(CreateExpenseReport {
                report_id: id,
                currency: "DAI".parse().unwrap(),
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();
        execute(
            &mut report,
            &ExpenseReportAction::AddWallet(AddWallet {
                address: wallet(addr),
                name: Some("Ops".to_string()),
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();
        report
    }

    fn receipt(gross_unit: f64, tax: f64) -> AddLineItem {
        let net = gross_unit / (1.0 + tax / 100.0);
        AddLineItem {
            id: LineItemId::new(),
            description: "Travel".to_string(),
            values: LineItemValues::from_unit_price(1.0, net, tax),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn line_items_are_scoped_to_their_wallet() {
        let mut report = report_with_wallet("0xabc");
        let add = receipt(119.0, 19.0);
        execute(
            &mut report,
            &ExpenseReport::add_line_item(&wallet("0xabc"), add.clone()),
        )
        .unwrap();

        assert!(report.line_item(&wallet("0xabc"), add.id).is_some());
        assert!(report.line_item(&wallet("0xdef"), add.id).is_none());
        assert!((report.total_incl() - 119.0).abs() < 1e-9);
        assert_eq!(report.wallets()[0].name(), Some("Ops"));
    }

    #[test]
    fn unknown_wallet_is_not_found() {
        let report = report_with_wallet("0xabc");
        let err = report
            .handle(&ExpenseReport::add_line_item(&wallet("0xdef"), receipt(10.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(msg) if msg.contains("0xdef")));
    }

    #[test]
    fn duplicate_wallet_is_a_conflict() {
        let report = report_with_wallet("0xabc");
        let err = report
            .handle(&ExpenseReportAction::AddWallet(AddWallet {
                address: wallet("0xabc"),
                name: None,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn removing_wallet_drops_its_expenses() {
        let mut report = report_with_wallet("0xabc");
        execute(
            &mut report,
            &ExpenseReport::add_line_item(&wallet("0xabc"), receipt(50.0, 0.0)),
        )
        .unwrap();
        execute(
            &mut report,
            &ExpenseReportAction::RemoveWallet(RemoveWallet {
                address: wallet("0xabc"),
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();
        assert!(report.wallets().is_empty());
        assert_eq!(report.total_incl(), 0.0);
    }

    #[test]
    fn wallet_addresses_reject_blank_and_spaced_values() {
        assert!("".parse::<WalletAddress>().is_err());
        assert!("0x ab".parse::<WalletAddress>().is_err());
    }

    #[test]
    fn wallet_scoped_action_serializes_flat() {
        let action = ExpenseReport::delete_line_item(
            &wallet("0xabc"),
            DeleteLineItem {
                id: LineItemId::new(),
                occurred_at: Utc::now(),
            },
        );
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "DELETE_LINE_ITEM");
        assert_eq!(json["input"]["wallet"], "0xabc");
        let back: ExpenseReportAction = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }
}
