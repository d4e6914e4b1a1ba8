//! `tracing-subscriber` configuration: JSON lines with timestamps, filtered
//! through `EnvFilter`.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid log filter `{directives}`: {reason}")]
    Filter { directives: String, reason: String },
    #[error("a global subscriber is already installed")]
    AlreadyInstalled,
}

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn try_init(default_filter: &str) -> Result<(), InitError> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(from_env.as_deref(), default_filter)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init()
        .map_err(|_| InitError::AlreadyInstalled)
}

fn build_filter(from_env: Option<&str>, default_filter: &str) -> Result<EnvFilter, InitError> {
    let directives = match from_env {
        Some(d) if !d.trim().is_empty() => d,
        _ => default_filter,
    };
    EnvFilter::try_new(directives).map_err(|e| InitError::Filter {
        directives: directives.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_env_uses_default() {
        let filter = build_filter(Some("  "), "warn").unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn env_directives_win() {
        let filter = build_filter(Some("docforge_reconcile=debug"), "info").unwrap();
        assert_eq!(filter.to_string(), "docforge_reconcile=debug");
    }

    #[test]
    fn malformed_directives_are_reported() {
        let err = build_filter(Some("docforge=notalevel"), "info").unwrap_err();
        assert!(matches!(err, InitError::Filter { .. }));
    }

    #[test]
    fn second_install_is_rejected() {
        let _ = try_init("off");
        assert!(matches!(try_init("off"), Err(InitError::AlreadyInstalled)));
    }
}
