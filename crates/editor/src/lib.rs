//! Line-item editing on top of the document aggregates.
//!
//! - [`config`]: tolerances and currency precision, overridable from the environment.
//! - [`reactor`]: in-process document runtime (dispatch, operation log, replay, subscriptions).
//! - [`session`]: per-line-item drafts that reconcile keystrokes into minimal edits.
//! - [`notice`]: user-facing rendering of every failure above.

pub mod config;
pub mod error;
pub mod notice;
pub mod reactor;
pub mod session;

pub use config::EditorConfig;
pub use error::{DispatchError, SessionError};
pub use notice::{Notice, NoticeLevel};
pub use reactor::{Dispatch, Reactor};
pub use session::{CommitOutcome, LineItemDraft};
