//! Logging initialization.
//!
//! Installs a `tracing` subscriber with an env filter. `RUST_LOG` takes
//! precedence over the configured level.

use crate::{RedkitError, RedkitResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default level directive (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Include the event target in each line.
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_with_target() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            with_target: default_with_target(),
        }
    }
}

impl TelemetryConfig {
    /// Returns the filter directive used when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_directive(&self) -> String {
        format!("{},redkit=debug", self.log_level)
    }
}

/// Installs the global subscriber, failing if one is already set.
pub fn try_init_logging(config: &TelemetryConfig) -> RedkitResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let result = match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(config.with_target))
            .try_init(),
    };

    result.map_err(|e| RedkitError::configuration(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(
        log_level = %config.log_level,
        log_format = ?config.log_format,
        "Logging initialized"
    );
    Ok(())
}

/// Installs the global subscriber, leaving an existing one in place.
pub fn init_logging(config: &TelemetryConfig) {
    if let Err(e) = try_init_logging(config) {
        tracing::debug!("Logging already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.with_target);
        assert_eq!(config.default_directive(), "info,redkit=debug");
    }

    #[test]
    fn test_log_format_deserializes_lowercase() {
        let config: TelemetryConfig =
            serde_json::from_str(r#"{"log_level":"warn","log_format":"json"}"#).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.with_target);
    }

    #[test]
    fn test_second_init_reports_error() {
        let config = TelemetryConfig::default();
        init_logging(&config);
        assert!(try_init_logging(&config).is_err());
    }
}
