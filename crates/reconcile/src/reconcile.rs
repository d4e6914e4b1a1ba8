//! The reconciliation function.
//!
//! Rules are tried in priority order and the first match wins. Totals beat
//! unit prices, unit prices beat quantity: a user typing a lump sum expects
//! that exact figure to survive.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::{FieldEdits, LineItemField, LineItemPatch, LineItemValues};
use crate::numeric::{Tolerance, parse_entered, parse_quantity, parse_tax_percent};
use crate::profile::Profile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSettings {
    pub epsilon: f64,
    /// Quantity used when the typed quantity is blank, zero or unparsable.
    pub default_quantity: f64,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            epsilon: Tolerance::DEFAULT_EPSILON,
            default_quantity: 1.0,
        }
    }
}

impl ReconcileSettings {
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.epsilon)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
    /// A total-driven rule would have to divide by a zero quantity.
    #[error("cannot derive a unit price from {field} while quantity is zero")]
    ZeroQuantity { field: LineItemField },

    #[error("reconciliation produced a non-finite {field}")]
    NonFinite { field: LineItemField },

    #[error("{field} cannot be edited in a {profile:?} line item")]
    NotEditable {
        field: LineItemField,
        profile: Profile,
    },
}

/// Which rule decided the outcome.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    TotalTaxExcl,
    TotalTaxIncl,
    UnitPriceTaxExcl,
    UnitPriceTaxIncl,
    Quantity,
    Fallback,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::TotalTaxExcl => "total_tax_excl",
            Rule::TotalTaxIncl => "total_tax_incl",
            Rule::UnitPriceTaxExcl => "unit_price_tax_excl",
            Rule::UnitPriceTaxIncl => "unit_price_tax_incl",
            Rule::Quantity => "quantity",
            Rule::Fallback => "fallback",
        }
    }
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub rule: Rule,
    /// Full, consistent record after the edit.
    pub values: LineItemValues,
    /// Fields that changed beyond tolerance, plus those the user entered.
    pub patch: LineItemPatch,
    /// Fields whose typed text counts as an entered value.
    pub entered: Vec<LineItemField>,
}

impl Reconciliation {
    /// Whether committing the patch would alter `previous`.
    ///
    /// Entered figures are compared exactly, so a one-unit edit in the last
    /// token decimal is kept. Derived figures must move beyond `tolerance`.
    pub fn changes(&self, previous: &LineItemValues, tolerance: &Tolerance) -> bool {
        self.patch.entries().any(|(field, value)| {
            let before = previous.get(field);
            if self.entered.contains(&field) {
                value != before
            } else {
                !tolerance.eq(value, before)
            }
        })
    }
}

/// Reconcile `edits` against the last committed `previous` values.
///
/// 1. `totalPriceTaxExcl` entered: it is ground truth, unit prices follow.
/// 2. `totalPriceTaxIncl` entered: same, from the gross side.
/// 3. `unitPriceTaxExcl` entered: gross unit price and both totals follow.
/// 4. `unitPriceTaxIncl` entered: net unit price and both totals follow.
/// 5. `quantity` edited: totals follow from the existing unit prices.
/// 6. Otherwise totals are recomputed from the last net unit price.
///
/// Zero or blank prices count as "not yet entered" and never win a rule.
pub fn reconcile(
    previous: &LineItemValues,
    edits: &FieldEdits,
    profile: Profile,
    settings: &ReconcileSettings,
) -> Result<Reconciliation, ReconcileError> {
    if let Some(field) = edits.fields().find(|f| !profile.is_editable(*f)) {
        return Err(ReconcileError::NotEditable { field, profile });
    }

    let tolerance = settings.tolerance();
    let entered = |field| edits.get(field).and_then(parse_entered);

    let quantity = edits
        .get(LineItemField::Quantity)
        .map(|raw| parse_quantity(raw, settings.default_quantity))
        .unwrap_or(previous.quantity);
    let tax_percent = if profile.is_tax_free() {
        0.0
    } else {
        edits
            .get(LineItemField::TaxPercent)
            .and_then(parse_tax_percent)
            .unwrap_or(previous.tax_percent)
    };
    let factor = 1.0 + tax_percent / 100.0;

    let divide_by_quantity = |total: f64, field| {
        if tolerance.is_zero(quantity) {
            Err(ReconcileError::ZeroQuantity { field })
        } else {
            Ok(total / quantity)
        }
    };

    let (rule, unit_excl, unit_incl, total_excl, total_incl) =
        if let Some(total) = entered(LineItemField::TotalPriceTaxExcl) {
            let unit_excl = divide_by_quantity(total, LineItemField::TotalPriceTaxExcl)?;
            let unit_incl = unit_excl * factor;
            (Rule::TotalTaxExcl, unit_excl, unit_incl, total, quantity * unit_incl)
        } else if let Some(total) = entered(LineItemField::TotalPriceTaxIncl) {
            let unit_incl = divide_by_quantity(total, LineItemField::TotalPriceTaxIncl)?;
            let unit_excl = unit_incl / factor;
            (Rule::TotalTaxIncl, unit_excl, unit_incl, quantity * unit_excl, total)
        } else if let Some(unit_excl) = entered(LineItemField::UnitPriceTaxExcl) {
            let unit_incl = unit_excl * factor;
            (
                Rule::UnitPriceTaxExcl,
                unit_excl,
                unit_incl,
                quantity * unit_excl,
                quantity * unit_incl,
            )
        } else if let Some(unit_incl) = entered(LineItemField::UnitPriceTaxIncl) {
            let unit_excl = unit_incl / factor;
            (
                Rule::UnitPriceTaxIncl,
                unit_excl,
                unit_incl,
                quantity * unit_excl,
                quantity * unit_incl,
            )
        } else {
            let rule = if edits.contains(LineItemField::Quantity) {
                Rule::Quantity
            } else {
                Rule::Fallback
            };
            let unit_excl = previous.unit_price_tax_excl;
            let unit_incl = unit_excl * factor;
            (rule, unit_excl, unit_incl, quantity * unit_excl, quantity * unit_incl)
        };

    let values = LineItemValues {
        quantity,
        tax_percent,
        unit_price_tax_excl: unit_excl,
        unit_price_tax_incl: unit_incl,
        total_price_tax_excl: total_excl,
        total_price_tax_incl: total_incl,
    };
    if let Some(field) = LineItemField::ALL.into_iter().find(|f| !values.get(*f).is_finite()) {
        return Err(ReconcileError::NonFinite { field });
    }

    let entered: Vec<LineItemField> = LineItemField::ALL
        .into_iter()
        .filter(|f| was_entered(edits, *f))
        .collect();
    let mut patch = LineItemPatch::default();
    for field in LineItemField::ALL {
        let next = values.get(field);
        if !tolerance.eq(next, previous.get(field)) || entered.contains(&field) {
            patch.set(field, next);
        }
    }

    tracing::debug!(
        rule = rule.as_str(),
        profile = ?profile,
        changed = patch.entries().count(),
        "reconciled line item"
    );

    Ok(Reconciliation {
        rule,
        values,
        patch,
        entered,
    })
}

fn was_entered(edits: &FieldEdits, field: LineItemField) -> bool {
    match (field, edits.get(field)) {
        (_, None) => false,
        (LineItemField::Quantity, Some(_)) => true,
        (LineItemField::TaxPercent, Some(raw)) => parse_tax_percent(raw).is_some(),
        (_, Some(raw)) => parse_entered(raw).is_some(),
    }
}
