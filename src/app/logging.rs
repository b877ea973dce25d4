//! Logging configuration and initialization
//!
//! Logs go to stderr so stdout stays free for reports and `key=value` output.

use crate::app::config::AppConfig;
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the verbosity-derived filter
pub const LOG_ENV: &str = "STEPGUARD_LOG";

/// `STEPGUARD_LOG`, then `RUST_LOG`, then the `-v` count
pub fn env_filter(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()))
}

/// Initialize tracing/logging for the application
pub fn init_logging(config: &AppConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr)
        .with_target(config.verbose >= 2) // Show target module for -vv and above
        .with_line_number(config.verbose >= 3)
        .init();

    debug!("stepguard started with verbosity level: {}", config.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}
