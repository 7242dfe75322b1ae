//! Tracing subscriber setup.
//!
//! Logs go to stderr so diagrams on stdout stay clean.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str = "sd_core=debug,sd_cli=debug";

/// Picks the filter directive: `--verbose` wins, then `RUST_LOG`, then `warn`.
pub fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new(VERBOSE_FILTER);
    }
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter(verbose))
        .try_init();
}
