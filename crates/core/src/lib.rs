//! `docforge-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the document
//! editors: identifiers, the domain error model, the document aggregate
//! traits and currency precision rules. No IO lives here.

pub mod aggregate;
pub mod currency;
pub mod error;
pub mod id;

pub use aggregate::{Document, DocumentModel, ExpectedRevision};
pub use currency::{Currency, CurrencyKind, PrecisionPolicy};
pub use error::{DomainError, DomainResult};
pub use id::{DocumentId, LineItemId};
