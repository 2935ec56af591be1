//! The facade type and its process-wide instance.

use redkit_config::{AppConfig, ConfigLoader};
use redkit_core::{RedkitError, RedkitResult};
use redkit_pool::RedisPool;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

static GLOBAL: OnceLock<Redis> = OnceLock::new();

/// Pooled Redis helpers.
///
/// Cheap to clone; clones share the same pool.
#[derive(Debug, Clone)]
pub struct Redis {
    pub(crate) pool: RedisPool,
}

impl Redis {
    /// Builds the facade and its pool without connecting.
    pub fn new(config: &AppConfig) -> RedkitResult<Self> {
        Ok(Self::from_pool(RedisPool::new(config)?))
    }

    /// Builds the facade and checks that Redis answers.
    pub async fn connect(config: &AppConfig) -> RedkitResult<Self> {
        Ok(Self::from_pool(RedisPool::connect(config).await?))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }
}

/// Initializes the process-wide facade.
///
/// The pool is built once; a second call fails.
pub fn init(config: &AppConfig) -> RedkitResult<&'static Redis> {
    let redis = Redis::new(config)?;
    GLOBAL
        .set(redis)
        .map_err(|_| RedkitError::configuration("Redis facade is already initialized"))?;
    info!(redis = %config.redis.address(), "Redis facade initialized");
    global()
}

/// Loads configuration from `config_dir` and initializes the process-wide facade.
pub fn init_from_dir(config_dir: impl AsRef<Path>) -> RedkitResult<&'static Redis> {
    let loader = ConfigLoader::new(config_dir)?;
    init(loader.get())
}

/// Returns the process-wide facade.
pub fn global() -> RedkitResult<&'static Redis> {
    GLOBAL.get().ok_or(RedkitError::NotInitialized)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use redkit_pool::testing::{FakeRedis, DROP_KEY, GET_VALUE};

    /// A facade whose pool points at a closed port.
    pub(crate) fn offline() -> Redis {
        let mut config = AppConfig::default();
        config.redis.port = 1;
        config.redis.timeout_ms = 200;
        config.pool.max_wait_ms = 200;
        Redis::new(&config).unwrap()
    }

    /// Asserts that `result` is an argument error and nothing was borrowed.
    pub(crate) fn assert_rejected<T: std::fmt::Debug>(redis: &Redis, result: RedkitResult<T>) {
        let err = result.unwrap_err();
        assert!(err.is_invalid_argument(), "expected invalid argument, got {err:?}");
        assert_eq!(redis.pool().status().size, 0);
    }

    #[tokio::test]
    async fn test_global_lifecycle() {
        assert!(matches!(global(), Err(RedkitError::NotInitialized)));

        let mut config = AppConfig::default();
        config.redis.port = 1;
        let redis = init(&config).unwrap();
        assert_eq!(redis.pool().status().size, 0);
        assert!(global().is_ok());

        let err = init(&config).unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[tokio::test]
    async fn test_dropped_connection_is_evicted() {
        let server = FakeRedis::start().await.unwrap();
        let redis = Redis::new(&server.config()).unwrap();

        assert_eq!(redis.get("k").await.unwrap().as_deref(), Some(GET_VALUE));
        assert_eq!(redis.pool().status().size, 1);

        let err = redis.get(DROP_KEY).await.unwrap_err();
        assert!(err.is_connection_error());
        assert_eq!(redis.pool().status().size, 0);

        assert_eq!(redis.get("k").await.unwrap().as_deref(), Some(GET_VALUE));
        assert_eq!(redis.pool().status().size, 1);
    }

    #[tokio::test]
    async fn test_unreachable_store_surfaces_pool_error() {
        let redis = offline();
        let err = redis.get("some:key").await.unwrap_err();
        assert!(err.is_connection_error());
        assert!(!err.is_invalid_argument());
    }
}
