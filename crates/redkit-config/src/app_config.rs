//! Application configuration structures.

use redkit_core::{RedkitError, RedkitResult, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Redis connection configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Connection pool limits.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: TelemetryConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "redkit".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis host.
    pub host: String,
    /// Redis port.
    pub port: u16,
    /// Logical database index.
    pub database: i64,
    /// Send credentials on connect.
    pub auth_enabled: bool,
    /// ACL username (Redis 6+).
    pub username: Option<String>,
    /// Password, used only when `auth_enabled` is set.
    pub password: Option<String>,
    /// Connect and socket timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 0,
            auth_enabled: false,
            username: None,
            password: None,
            timeout_ms: 2000,
        }
    }
}

impl RedisConfig {
    /// Returns the effective password.
    ///
    /// `None` unless auth is enabled and the password is non-empty.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        if !self.auth_enabled {
            return None;
        }
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Returns the connection timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Builds the `redis://` connection URL, credentials percent-encoded.
    pub fn url(&self) -> RedkitResult<String> {
        let mut url = Url::parse(&format!("redis://{}:{}/{}", self.host, self.port, self.database))
            .map_err(|e| RedkitError::configuration(format!("Invalid Redis address: {}", e)))?;

        if let Some(password) = self.password() {
            if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
                url.set_username(username)
                    .map_err(|()| RedkitError::configuration("Redis username cannot be set on URL"))?;
            }
            url.set_password(Some(password))
                .map_err(|()| RedkitError::configuration("Redis password cannot be set on URL"))?;
        }

        Ok(url.into())
    }

    /// Returns `host:port` for log lines (never includes credentials).
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of connections, idle or borrowed.
    pub max_active: usize,
    /// Maximum number of idle connections kept for reuse.
    pub max_idle: usize,
    /// Checkout wait in milliseconds; negative waits forever.
    pub max_wait_ms: i64,
    /// PING a connection before handing it out.
    pub test_on_borrow: bool,
    /// PING a connection before putting it back.
    pub test_on_return: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_active: 8,
            max_idle: 8,
            max_wait_ms: -1,
            test_on_borrow: false,
            test_on_return: false,
        }
    }
}

impl PoolConfig {
    /// Returns the checkout wait, `None` meaning wait forever.
    #[must_use]
    pub fn max_wait(&self) -> Option<Duration> {
        u64::try_from(self.max_wait_ms).ok().map(Duration::from_millis)
    }
}
