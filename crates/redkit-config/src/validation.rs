//! Configuration validation.
//!
//! Fails fast at startup on settings the pool cannot work with, reporting
//! every problem at once.

use crate::AppConfig;
use std::fmt;
use tracing::warn;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Redis host is empty.
    EmptyHost,
    /// Port number is invalid (must be 1-65535).
    InvalidPort { value: u16 },
    /// Database index is negative.
    InvalidDatabase { value: i64 },
    /// Pool must allow at least one connection.
    ZeroMaxActive,
    /// More idle connections allowed than connections overall.
    MaxIdleExceedsMaxActive { max_idle: usize, max_active: usize },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyHost => write!(f, "Redis host must not be empty"),
            Self::InvalidPort { value } => {
                write!(f, "Invalid Redis port: {} (must be 1-65535)", value)
            }
            Self::InvalidDatabase { value } => {
                write!(f, "Invalid Redis database index: {}", value)
            }
            Self::ZeroMaxActive => write!(f, "pool.max_active must be at least 1"),
            Self::MaxIdleExceedsMaxActive { max_idle, max_active } => write!(
                f,
                "pool.max_idle ({}) cannot be greater than pool.max_active ({})",
                max_idle, max_active
            ),
            Self::NonPositiveTimeout { name } => write!(f, "{} must be positive", name),
            Self::InvalidLogLevel { value } => write!(
                f,
                "Invalid log level '{}' (expected trace, debug, info, warn or error)",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_redis(&config.redis, &mut errors);
        Self::validate_pool(&config.pool, &mut errors);

        let level = config.observability.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.observability.log_level.clone(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_redis(config: &crate::RedisConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.host.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyHost);
        }
        if config.port == 0 {
            errors.push(ConfigValidationError::InvalidPort { value: config.port });
        }
        if config.database < 0 {
            errors.push(ConfigValidationError::InvalidDatabase { value: config.database });
        }
        if config.timeout_ms == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "redis.timeout_ms".to_string(),
            });
        }

        // An empty credential means "no auth", same as leaving auth off.
        if config.auth_enabled && config.password().is_none() {
            warn!("redis.auth_enabled is set but no password is configured; connecting without auth");
        }
    }

    fn validate_pool(config: &crate::PoolConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.max_active == 0 {
            errors.push(ConfigValidationError::ZeroMaxActive);
        }
        if config.max_idle > config.max_active {
            errors.push(ConfigValidationError::MaxIdleExceedsMaxActive {
                max_idle: config.max_idle,
                max_active: config.max_active,
            });
        }
    }
}

/// Formats validation errors for display.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_port() {
        let mut config = AppConfig::default();
        config.redis.port = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.contains(&ConfigValidationError::InvalidPort { value: 0 }));
    }

    #[test]
    fn test_max_idle_exceeds_max_active() {
        let mut config = AppConfig::default();
        config.pool.max_active = 4;
        config.pool.max_idle = 10;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::MaxIdleExceedsMaxActive { max_idle: 10, max_active: 4 }
        )));
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = AppConfig::default();
        config.redis.host = " ".to_string();
        config.redis.timeout_ms = 0;
        config.pool.max_active = 0;
        config.pool.max_idle = 0;
        config.observability.log_level = "verbose".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ConfigValidationError::EmptyHost));
        assert!(errors.contains(&ConfigValidationError::ZeroMaxActive));
    }

    #[test]
    fn test_auth_without_password_is_not_an_error() {
        let mut config = AppConfig::default();
        config.redis.auth_enabled = true;
        config.redis.password = None;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_format_validation_errors() {
        let errors = vec![
            ConfigValidationError::EmptyHost,
            ConfigValidationError::ZeroMaxActive,
        ];
        let output = format_validation_errors(&errors);
        assert!(output.contains("1. Redis host must not be empty"));
        assert!(output.contains("2. pool.max_active must be at least 1"));
    }
}
