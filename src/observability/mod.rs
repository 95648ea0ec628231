//! Logging setup.
//!
//! All log output goes to stderr; stdout is reserved for the MCP transport.
//! The filter comes from `PBIUX_LOG` (falling back to `info`, or `debug` when
//! `--verbose` is set), and `PBIUX_LOG_FORMAT=json` switches to structured
//! JSON lines.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes the global tracing subscriber.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init(verbose: bool) {
    INIT.get_or_init(|| {
        let default_level = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_env("PBIUX_LOG")
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let json = std::env::var("PBIUX_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        let result = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };

        // A subscriber installed by an embedding test harness wins.
        if result.is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
    });
}
