//! Logging infrastructure for texmill.
//!
//! The pipeline is a one-shot batch tool, so there is no file appender:
//! structured events go to stderr, configurable via the `RUST_LOG`
//! environment variable.

use tracing_subscriber::EnvFilter;

/// Initialize the logging system.
///
/// Defaults to `warn` when `RUST_LOG` is not set so that batch runs stay
/// quiet; `silent` drops everything below `error`.
///
/// # Errors
///
/// Returns an error message if a global subscriber is already installed.
pub fn init_logging(silent: bool) -> Result<(), String> {
    let default_level = if silent { "error" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| e.to_string())
}
