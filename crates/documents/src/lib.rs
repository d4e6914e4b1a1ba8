//! Document aggregates whose line items are edited through the reconciliation
//! kernel: invoices, billing statements and wallet-scoped expense reports.
//!
//! Each aggregate follows the same decide/apply shape: `handle` validates an
//! action against current state and returns operations, `apply` folds an
//! operation into state and bumps the revision.

pub mod billing_statement;
pub mod expense_report;
pub mod invoice;
pub mod line_item;

pub use billing_statement::{
    BILLING_STATEMENT_DOCUMENT_TYPE, BillingStatement, BillingStatementAction,
    BillingStatementOperation, CreateBillingStatement,
};
pub use expense_report::{
    AddWallet, CreateExpenseReport, EXPENSE_REPORT_DOCUMENT_TYPE, ExpenseReport,
    ExpenseReportAction, ExpenseReportOperation, InWallet, RemoveWallet, Wallet, WalletAddress,
};
pub use invoice::{CreateInvoice, INVOICE_DOCUMENT_TYPE, Invoice, InvoiceAction, InvoiceOperation};
pub use line_item::{
    AddLineItem, DeleteLineItem, EditLineItem, LineItem, LineItemAdded, LineItemDeleted,
    LineItemDocument, LineItemEdited, LineItems,
};
