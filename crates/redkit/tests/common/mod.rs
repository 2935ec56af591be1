//! Common test infrastructure for Redis integration tests.

use redkit::{AppConfig, Redis};
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::Redis as RedisImage;

/// Test Redis container wrapper.
///
/// Manages a Redis testcontainer lifecycle and provides a connected facade.
pub struct TestRedis {
    _container: ContainerAsync<RedisImage>,
    redis: Redis,
}

impl TestRedis {
    /// Starts a fresh Redis container with the default pool limits.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Starts a fresh Redis container, letting the caller adjust the config.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let container = RedisImage::default()
            .start()
            .await
            .expect("Failed to start Redis container");

        let port = container
            .get_host_port_ipv4(6379)
            .await
            .expect("Failed to get Redis port");

        let mut config = AppConfig::default();
        config.redis.host = "127.0.0.1".to_string();
        config.redis.port = port;
        adjust(&mut config);

        let redis = Self::connect_with_retry(&config, 30).await;

        Self {
            _container: container,
            redis,
        }
    }

    /// Returns the facade.
    pub fn redis(&self) -> &Redis {
        &self.redis
    }

    /// Connects with retry while the container finishes starting.
    async fn connect_with_retry(config: &AppConfig, max_attempts: u32) -> Redis {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match Redis::connect(config).await {
                Ok(redis) => return redis,
                Err(e) => {
                    if attempts >= max_attempts {
                        panic!("Failed to connect to Redis after {} attempts: {}", max_attempts, e);
                    }
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
            }
        }
    }
}
