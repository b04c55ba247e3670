//! Logging initialization utilities.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::{LogFormat, LogLevel};

/// Initialize logging with the specified level and format.
///
/// Logs are written to stderr so stdout remains clean for program output.
/// `RUST_LOG`, when set, overrides `level`.
pub fn init_logging(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder
            .json()
            .with_current_span(false)
            .flatten_event(true)
            .try_init(),
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}
