//! Tracing setup. Logs go to stderr so stdout only carries the report.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default filter when nothing else is configured.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Install the global subscriber.
///
/// # Errors
/// Returns an error if the filter does not parse or a subscriber is already set.
pub fn init(verbose: u8, level: Option<&str>, format: LogFormat) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbose, level, rust_log.as_deref())?;

    let registry = tracing_subscriber::registry();
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .try_init()?,
    }
    Ok(())
}

/// Pick the filter directives: `-v` beats `RUST_LOG`, which beats the config file.
///
/// # Errors
/// Returns an error if the chosen directives do not parse.
pub fn build_filter(verbose: u8, level: Option<&str>, rust_log: Option<&str>) -> Result<EnvFilter> {
    let directives = match verbose {
        0 => rust_log
            .filter(|value| !value.trim().is_empty())
            .or(level)
            .unwrap_or(DEFAULT_LOG_LEVEL),
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_new(directives).with_context(|| format!("Invalid log filter '{directives}'"))
}
