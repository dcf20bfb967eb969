//! Diagnostic logging setup.
//!
//! Library code logs through `tracing` macros; this module installs the
//! subscriber once in `main`. Output goes to stderr so it never mixes with
//! command output on stdout.
//!
//! The filter comes from `GOSW_LOG` (any `EnvFilter` directive such as
//! `debug` or `gosw::toolchain=trace`). Without it the level is `warn`, or
//! `debug` when `--verbose` is given.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "GOSW_LOG";

/// Builds the filter used by [`init`].
#[must_use]
pub fn build_filter(directive: Option<&str>, verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "warn" };
    directive
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level))
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let directive = std::env::var(LOG_ENV).ok();
    let filter = build_filter(directive.as_deref(), verbose);

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(verbose)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_warn() {
        assert_eq!(build_filter(None, false).to_string(), "warn");
    }

    #[test]
    fn verbose_raises_to_debug() {
        assert_eq!(build_filter(None, true).to_string(), "debug");
    }

    #[test]
    fn directive_overrides_default() {
        assert_eq!(
            build_filter(Some("gosw=trace"), false).to_string(),
            "gosw=trace"
        );
    }

    #[test]
    fn blank_or_invalid_directive_falls_back() {
        assert_eq!(build_filter(Some("  "), false).to_string(), "warn");
        assert_eq!(build_filter(Some("gosw=notalevel"), true).to_string(), "debug");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(false);
        init(true);
    }
}
