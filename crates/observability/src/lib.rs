//! Process-wide logging setup shared by the docforge binaries.

pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, InitError, try_init};

/// Install JSON logging filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    if let Err(err) = try_init(DEFAULT_FILTER) {
        if !matches!(err, InitError::AlreadyInstalled) {
            eprintln!("docforge: logging disabled: {err}");
        }
    }
}
