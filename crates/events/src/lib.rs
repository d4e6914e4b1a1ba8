//! Actions, operations and their distribution.
//!
//! An **action** is a request dispatched against a document; an **operation**
//! is the accepted, immutable record it produces. Operations are wrapped in
//! envelopes, appended to the document's log and broadcast on an event bus.

pub mod action;
pub mod bus;
pub mod envelope;
pub mod handler;
pub mod in_memory_bus;
pub mod operation;

pub use action::Action;
pub use bus::{EventBus, Subscription};
pub use envelope::OperationEnvelope;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use operation::Operation;
