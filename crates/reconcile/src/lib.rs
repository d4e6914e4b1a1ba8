//! Line-item financial reconciliation.
//!
//! Given the last committed values of a line item and the fields a user
//! explicitly edited, work out which figure the user meant as the source of
//! truth and recompute the rest so that
//!
//! - `unitPriceTaxIncl = unitPriceTaxExcl * (1 + taxPercent / 100)`
//! - `totalPriceTaxExcl = quantity * unitPriceTaxExcl`
//! - `totalPriceTaxIncl = quantity * unitPriceTaxIncl`
//!
//! hold within tolerance. The result is a minimal patch, so unchanged data
//! never turns into a mutation.
//!
//! Everything here is pure: no IO, no hidden state.

pub mod field;
pub mod input;
pub mod numeric;
pub mod profile;
pub mod reconcile;

pub use field::{FieldEdits, LineItemField, LineItemPatch, LineItemValues};
pub use input::{InputError, InputGate};
pub use numeric::Tolerance;
pub use profile::Profile;
pub use reconcile::{ReconcileError, ReconcileSettings, Reconciliation, Rule, reconcile};
