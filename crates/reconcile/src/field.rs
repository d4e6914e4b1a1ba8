//! The numeric fields of a line item, their values, edits and patches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::numeric::Tolerance;

/// A numeric line-item field.
///
/// Serialized names follow the document-model action inputs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineItemField {
    Quantity,
    TaxPercent,
    UnitPriceTaxExcl,
    UnitPriceTaxIncl,
    TotalPriceTaxExcl,
    TotalPriceTaxIncl,
}

impl LineItemField {
    pub const ALL: [LineItemField; 6] = [
        LineItemField::Quantity,
        LineItemField::TaxPercent,
        LineItemField::UnitPriceTaxExcl,
        LineItemField::UnitPriceTaxIncl,
        LineItemField::TotalPriceTaxExcl,
        LineItemField::TotalPriceTaxIncl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LineItemField::Quantity => "quantity",
            LineItemField::TaxPercent => "taxPercent",
            LineItemField::UnitPriceTaxExcl => "unitPriceTaxExcl",
            LineItemField::UnitPriceTaxIncl => "unitPriceTaxIncl",
            LineItemField::TotalPriceTaxExcl => "totalPriceTaxExcl",
            LineItemField::TotalPriceTaxIncl => "totalPriceTaxIncl",
        }
    }

    /// Prices and totals are denominated in the document currency.
    pub fn is_monetary(self) -> bool {
        !matches!(self, LineItemField::Quantity | LineItemField::TaxPercent)
    }
}

impl core::fmt::Display for LineItemField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Committed numeric values of one line item.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemValues {
    pub quantity: f64,
    pub tax_percent: f64,
    pub unit_price_tax_excl: f64,
    pub unit_price_tax_incl: f64,
    pub total_price_tax_excl: f64,
    pub total_price_tax_incl: f64,
}

impl LineItemValues {
    /// Build a consistent record from quantity, net unit price and tax rate.
    pub fn from_unit_price(quantity: f64, unit_price_tax_excl: f64, tax_percent: f64) -> Self {
        let unit_price_tax_incl = unit_price_tax_excl * (1.0 + tax_percent / 100.0);
        Self {
            quantity,
            tax_percent,
            unit_price_tax_excl,
            unit_price_tax_incl,
            total_price_tax_excl: quantity * unit_price_tax_excl,
            total_price_tax_incl: quantity * unit_price_tax_incl,
        }
    }

    pub fn get(&self, field: LineItemField) -> f64 {
        match field {
            LineItemField::Quantity => self.quantity,
            LineItemField::TaxPercent => self.tax_percent,
            LineItemField::UnitPriceTaxExcl => self.unit_price_tax_excl,
            LineItemField::UnitPriceTaxIncl => self.unit_price_tax_incl,
            LineItemField::TotalPriceTaxExcl => self.total_price_tax_excl,
            LineItemField::TotalPriceTaxIncl => self.total_price_tax_incl,
        }
    }

    pub fn set(&mut self, field: LineItemField, value: f64) {
        match field {
            LineItemField::Quantity => self.quantity = value,
            LineItemField::TaxPercent => self.tax_percent = value,
            LineItemField::UnitPriceTaxExcl => self.unit_price_tax_excl = value,
            LineItemField::UnitPriceTaxIncl => self.unit_price_tax_incl = value,
            LineItemField::TotalPriceTaxExcl => self.total_price_tax_excl = value,
            LineItemField::TotalPriceTaxIncl => self.total_price_tax_incl = value,
        }
    }

    /// First violated pricing invariant, if any.
    pub fn inconsistency(&self, tolerance: &Tolerance) -> Option<&'static str> {
        let factor = 1.0 + self.tax_percent / 100.0;
        let holds = |actual: f64, expected: f64| tolerance.eq_scaled(actual, expected);
        if !holds(self.unit_price_tax_incl, self.unit_price_tax_excl * factor) {
            return Some("unitPriceTaxIncl must equal unitPriceTaxExcl * (1 + taxPercent / 100)");
        }
        if !holds(self.total_price_tax_excl, self.quantity * self.unit_price_tax_excl) {
            return Some("totalPriceTaxExcl must equal quantity * unitPriceTaxExcl");
        }
        if !holds(self.total_price_tax_incl, self.quantity * self.unit_price_tax_incl) {
            return Some("totalPriceTaxIncl must equal quantity * unitPriceTaxIncl");
        }
        None
    }

    pub fn is_consistent(&self, tolerance: &Tolerance) -> bool {
        self.inconsistency(tolerance).is_none()
    }
}

/// Raw text the user typed into numeric fields during one editing session.
///
/// Only fields the user explicitly touched are present; recomputed values
/// never end up here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldEdits(BTreeMap<LineItemField, String>);

impl FieldEdits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: LineItemField, raw: impl Into<String>) -> Self {
        self.insert(field, raw);
        self
    }

    pub fn insert(&mut self, field: LineItemField, raw: impl Into<String>) {
        self.0.insert(field, raw.into());
    }

    pub fn get(&self, field: LineItemField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: LineItemField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn remove(&mut self, field: LineItemField) -> Option<String> {
        self.0.remove(&field)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = LineItemField> + '_ {
        self.0.keys().copied()
    }
}

/// Minimal set of numeric changes for one line item.
///
/// This is the numeric part of an `EDIT_LINE_ITEM` input: absent fields are
/// left untouched by the document.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price_tax_excl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price_tax_incl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price_tax_excl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price_tax_incl: Option<f64>,
}

impl LineItemPatch {
    pub fn get(&self, field: LineItemField) -> Option<f64> {
        match field {
            LineItemField::Quantity => self.quantity,
            LineItemField::TaxPercent => self.tax_percent,
            LineItemField::UnitPriceTaxExcl => self.unit_price_tax_excl,
            LineItemField::UnitPriceTaxIncl => self.unit_price_tax_incl,
            LineItemField::TotalPriceTaxExcl => self.total_price_tax_excl,
            LineItemField::TotalPriceTaxIncl => self.total_price_tax_incl,
        }
    }

    pub fn set(&mut self, field: LineItemField, value: f64) {
        let slot = match field {
            LineItemField::Quantity => &mut self.quantity,
            LineItemField::TaxPercent => &mut self.tax_percent,
            LineItemField::UnitPriceTaxExcl => &mut self.unit_price_tax_excl,
            LineItemField::UnitPriceTaxIncl => &mut self.unit_price_tax_incl,
            LineItemField::TotalPriceTaxExcl => &mut self.total_price_tax_excl,
            LineItemField::TotalPriceTaxIncl => &mut self.total_price_tax_incl,
        };
        *slot = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Present fields in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (LineItemField, f64)> + '_ {
        LineItemField::ALL
            .into_iter()
            .filter_map(|f| self.get(f).map(|v| (f, v)))
    }

    /// Overlay this patch on `values`.
    pub fn apply_to(&self, values: &LineItemValues) -> LineItemValues {
        let mut next = *values;
        for (field, value) in self.entries() {
            next.set(field, value);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistent_record_from_unit_price() {
        let v = LineItemValues::from_unit_price(3.0, 10.0, 20.0);
        assert_eq!(v.unit_price_tax_incl, 12.0);
        assert_eq!(v.total_price_tax_excl, 30.0);
        assert_eq!(v.total_price_tax_incl, 36.0);
        assert!(v.is_consistent(&Tolerance::default()));
    }

    #[test]
    fn inconsistency_names_the_broken_invariant() {
        let mut v = LineItemValues::from_unit_price(2.0, 5.0, 10.0);
        v.total_price_tax_excl = 11.0;
        let msg = v.inconsistency(&Tolerance::default()).unwrap();
        assert!(msg.starts_with("totalPriceTaxExcl"));
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let mut patch = LineItemPatch::default();
        patch.set(LineItemField::UnitPriceTaxExcl, 4.5);
        let json = serde_json::to_value(patch).unwrap();
        assert_eq!(json, serde_json::json!({ "unitPriceTaxExcl": 4.5 }));
    }

    #[test]
    fn patch_overlays_values() {
        let base = LineItemValues::from_unit_price(1.0, 2.0, 0.0);
        let mut patch = LineItemPatch::default();
        patch.set(LineItemField::Quantity, 4.0);
        let next = patch.apply_to(&base);
        assert_eq!(next.quantity, 4.0);
        assert_eq!(next.unit_price_tax_excl, 2.0);
    }

    #[test]
    fn edits_use_document_model_field_names() {
        let edits = FieldEdits::new().with(LineItemField::TotalPriceTaxIncl, "12.");
        let json = serde_json::to_value(&edits).unwrap();
        assert_eq!(json, serde_json::json!({ "totalPriceTaxIncl": "12." }));
    }
}
