//! Tracing subscriber setup
//!
//! Libraries in this workspace only emit `tracing` events; a host process
//! calls [`init_tracing`] once at startup to print them.
//!
//! `RUST_LOG` wins when set. Otherwise the workspace crates log at `info`
//! (`debug` when verbose) and everything else at `warn`.

use groupderef_domain::{DerefError, Result};
use tracing_subscriber::EnvFilter;

const WORKSPACE_TARGETS: [&str; 4] =
    ["groupderef_domain", "groupderef_common", "groupderef_core", "groupderef_infra"];

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives = vec!["warn".to_string()];
    directives.extend(WORKSPACE_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

/// Build the level filter, preferring `RUST_LOG`.
pub fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Install a global fmt subscriber.
///
/// # Errors
/// Returns `DerefError::Internal` if a global subscriber is already set.
pub fn init_tracing(verbose: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbose))
        .with_target(false)
        .try_init()
        .map_err(|e| DerefError::Internal(format!("Failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_follow_verbosity() {
        let quiet = default_directives(false);
        assert!(quiet.starts_with("warn,"));
        assert!(quiet.contains("groupderef_core=info"));
        assert!(!quiet.contains("debug"));

        let verbose = default_directives(true);
        assert!(verbose.contains("groupderef_infra=debug"));
        assert!(verbose.contains("groupderef_common=debug"));
    }

    #[test]
    fn test_directives_parse_as_filter() {
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_directives(verbose)).is_ok());
        }
    }

    #[test]
    fn test_second_install_fails() {
        // Whichever call runs first may succeed; the second never does.
        let _ = init_tracing(false);
        assert!(matches!(init_tracing(true), Err(DerefError::Internal(_))));
    }
}
