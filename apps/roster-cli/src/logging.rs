//! Tracing subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` overrides the default filter.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{CliError, CliResult};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

fn build_filter(default: &str) -> CliResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .map_err(|e| CliError::Logging(e.to_string()))
}

/// Install the global subscriber.
pub fn init_logging(format: LogFormat, default_filter: &str) -> CliResult<()> {
    let filter_layer = build_filter(default_filter)?;

    let registry = tracing_subscriber::registry().with(filter_layer);
    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
    };
    result.map_err(|e| CliError::Logging(e.to_string()))?;

    tracing::debug!(format = ?format, "Logging initialized");
    Ok(())
}

/// Initialize logging for tests (with simpler output).
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_logging_does_not_panic() {
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_format_parses_from_cli_value() {
        assert_eq!(LogFormat::from_str("json", true).unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("TEXT", true).unwrap(), LogFormat::Text);
    }
}
