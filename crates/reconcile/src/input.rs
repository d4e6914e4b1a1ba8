//! Keystroke validation.
//!
//! Every keystroke in a numeric cell is matched against a pattern before it is
//! stored, so reconciliation only ever sees well-formed (possibly partial)
//! numbers. Partial input such as `"12."` passes: the user is mid-typing.

use regex::Regex;
use thiserror::Error;

use docforge_core::{Currency, PrecisionPolicy};

use crate::field::LineItemField;

const QUANTITY_DECIMALS: u32 = 4;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("`{raw}` is not a valid value for {field}")]
    Rejected { field: LineItemField, raw: String },

    #[error("invalid input pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Precompiled keystroke patterns for one currency.
#[derive(Debug, Clone)]
pub struct InputGate {
    precision: u32,
    monetary: Regex,
    quantity: Regex,
    tax_percent: Regex,
}

impl InputGate {
    /// Gate for amounts with `precision` decimals.
    pub fn new(precision: u32) -> Result<Self, InputError> {
        Ok(Self {
            precision,
            monetary: Regex::new(&format!(r"^[0-9]*\.?[0-9]{{0,{precision}}}$"))?,
            quantity: Regex::new(&format!(r"^[0-9]*\.?[0-9]{{0,{QUANTITY_DECIMALS}}}$"))?,
            tax_percent: Regex::new(r"^[0-9]{0,3}(\.[0-9]{0,2})?$")?,
        })
    }

    pub fn for_currency(currency: &Currency, policy: &PrecisionPolicy) -> Result<Self, InputError> {
        Self::new(policy.precision(currency))
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn accepts(&self, field: LineItemField, raw: &str) -> bool {
        let pattern = match field {
            LineItemField::Quantity => &self.quantity,
            LineItemField::TaxPercent => &self.tax_percent,
            _ => &self.monetary,
        };
        pattern.is_match(raw)
    }

    pub fn check(&self, field: LineItemField, raw: &str) -> Result<(), InputError> {
        if self.accepts(field, raw) {
            Ok(())
        } else {
            Err(InputError::Rejected {
                field,
                raw: raw.to_string(),
            })
        }
    }
}
