use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Variable holding a `tracing` filter directive, e.g. `SSHTAB_LOG=debug`.
pub const LOG_ENV: &str = "SSHTAB_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Log to stderr so stdout carries only command output.
pub fn init_tracing() -> Result<()> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("{err}"))
}
