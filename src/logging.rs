use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the verbosity flags, using
/// `tracing_subscriber` filter syntax (e.g. `loyalty=debug`).
pub const LOG_ENV: &str = "LOYALTY_LOG";

/// Level used when `LOYALTY_LOG` is unset.
pub fn default_level(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. Call once, before any work starts.
pub fn init_logging(verbosity: u8, quiet: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity, quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}
