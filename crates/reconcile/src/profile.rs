//! Per-editor field sets.
//!
//! The same kernel drives several editors; each exposes a different subset of
//! the numeric fields to the user.

use serde::{Deserialize, Serialize};

use crate::field::LineItemField;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Profile {
    /// Every numeric field is editable; tax is set per line.
    Invoice,
    /// Tax-free statements: inclusive figures mirror the exclusive ones.
    BillingStatement,
    /// Receipts are entered gross; net figures are derived.
    ExpenseReport,
}

impl Profile {
    pub fn editable_fields(self) -> &'static [LineItemField] {
        use LineItemField::*;
        match self {
            Profile::Invoice => &LineItemField::ALL,
            Profile::BillingStatement => &[Quantity, UnitPriceTaxExcl, TotalPriceTaxExcl],
            Profile::ExpenseReport => {
                &[Quantity, TaxPercent, UnitPriceTaxIncl, TotalPriceTaxIncl]
            }
        }
    }

    pub fn is_editable(self, field: LineItemField) -> bool {
        self.editable_fields().contains(&field)
    }

    /// Whether line items under this profile always carry a 0 % rate.
    pub fn is_tax_free(self) -> bool {
        matches!(self, Profile::BillingStatement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_statement_hides_tax_fields() {
        let p = Profile::BillingStatement;
        assert!(p.is_tax_free());
        assert!(!p.is_editable(LineItemField::TaxPercent));
        assert!(!p.is_editable(LineItemField::UnitPriceTaxIncl));
        assert!(p.is_editable(LineItemField::TotalPriceTaxExcl));
    }

    #[test]
    fn expense_report_edits_gross_amounts() {
        let p = Profile::ExpenseReport;
        assert!(p.is_editable(LineItemField::UnitPriceTaxIncl));
        assert!(!p.is_editable(LineItemField::UnitPriceTaxExcl));
    }

    #[test]
    fn invoice_edits_everything() {
        assert!(LineItemField::ALL.iter().all(|f| Profile::Invoice.is_editable(*f)));
    }
}
