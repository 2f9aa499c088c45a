//! Tracing subscriber setup for the binary
//!
//! Logs go to stderr; stdout is reserved for JSON responses.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `CPLANE_LOG` nor `RUST_LOG` is set
pub const DEFAULT_FILTER: &str = "warn";

/// Build the filter: `directive` if given, else `RUST_LOG`, else [`DEFAULT_FILTER`]
///
/// An unparsable `directive` falls back the same way.
#[must_use]
pub fn env_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init(directive: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
