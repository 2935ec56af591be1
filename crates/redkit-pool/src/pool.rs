//! Redis connection pool management.

use crate::metrics::PoolMetrics;
use crate::Lease;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redkit_config::AppConfig;
use redkit_core::{RedkitError, RedkitResult};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Pool behavior taken from [`redkit_config::PoolConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum connections, idle or borrowed.
    pub max_active: usize,
    /// Maximum idle connections kept for reuse.
    pub max_idle: usize,
    /// PING before handing a connection out.
    pub test_on_borrow: bool,
    /// PING before putting a connection back.
    pub test_on_return: bool,
}

/// Snapshot of the pool's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Configured maximum size.
    pub max_size: usize,
    /// Connections currently owned by the pool, idle or borrowed.
    pub size: usize,
    /// Idle connections ready to be borrowed.
    pub available: usize,
    /// Callers waiting for a connection.
    pub waiting: usize,
}

struct PoolInner {
    pool: Pool,
    settings: PoolSettings,
    address: String,
}

/// Shared Redis connection pool.
///
/// Cheap to clone; every clone hands out connections from the same pool.
#[derive(Clone)]
pub struct RedisPool {
    inner: Arc<PoolInner>,
}

impl RedisPool {
    /// Builds the pool from configuration without opening a connection.
    pub fn new(config: &AppConfig) -> RedkitResult<Self> {
        let address = config.redis.address();
        info!(
            redis = %address,
            max_active = config.pool.max_active,
            max_idle = config.pool.max_idle,
            "Creating Redis connection pool..."
        );

        let timeout = Some(config.redis.timeout());
        let pool = Config::from_url(config.redis.url()?)
            .builder()
            .map_err(|e| RedkitError::configuration(format!("Invalid Redis config: {}", e)))?
            .max_size(config.pool.max_active)
            .wait_timeout(config.pool.max_wait())
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedkitError::configuration(format!("Failed to create pool: {}", e)))?;

        crate::metrics::register_metrics();

        Ok(Self {
            inner: Arc::new(PoolInner {
                pool,
                settings: PoolSettings {
                    max_active: config.pool.max_active,
                    max_idle: config.pool.max_idle,
                    test_on_borrow: config.pool.test_on_borrow,
                    test_on_return: config.pool.test_on_return,
                },
                address,
            }),
        })
    }

    /// Builds the pool and checks that Redis answers.
    pub async fn connect(config: &AppConfig) -> RedkitResult<Self> {
        let pool = Self::new(config)?;
        pool.ping().await?;
        info!(redis = %pool.inner.address, "Redis connection pool created successfully");
        Ok(pool)
    }

    /// Borrows one connection.
    ///
    /// With `test_on_borrow`, a connection that fails PING is evicted and
    /// another one is tried, up to `max_active` times.
    pub async fn checkout(&self) -> RedkitResult<Lease> {
        let settings = self.inner.settings;
        let mut last_error = None;

        for attempt in 1..=settings.max_active.max(1) {
            let mut conn = self.inner.pool.get().await.map_err(|e| {
                error!(redis = %self.inner.address, error = %e, "Failed to get Redis connection");
                PoolMetrics::checkout_failed();
                RedkitError::Pool(e)
            })?;

            if !settings.test_on_borrow {
                return Ok(self.lease(conn));
            }

            match ping(&mut conn).await {
                Ok(()) => return Ok(self.lease(conn)),
                Err(e) => {
                    warn!(attempt, error = %e, "Connection failed validation on borrow");
                    self.evict(conn, "test_on_borrow");
                    last_error = Some(e);
                }
            }
        }

        PoolMetrics::checkout_failed();
        Err(match last_error {
            Some(e) => RedkitError::command("PING", e),
            None => RedkitError::configuration("pool.max_active must be at least 1"),
        })
    }

    /// Sends PING over a pooled connection.
    pub async fn ping(&self) -> RedkitResult<()> {
        let mut lease = self.checkout().await?;
        let result = ping(lease.conn()).await;
        lease.finish("ping", result).await
    }

    /// Returns the pool settings.
    #[must_use]
    pub fn settings(&self) -> PoolSettings {
        self.inner.settings
    }

    /// Returns the pool's current occupancy.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let status = self.inner.pool.status();
        PoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }

    /// Closes the pool. Outstanding leases are dropped when finished.
    pub fn close(&self) {
        info!(redis = %self.inner.address, "Closing Redis connection pool");
        self.inner.pool.close();
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.pool.is_closed()
    }

    fn lease(&self, conn: Connection) -> Lease {
        PoolMetrics::checkout();
        Lease::new(conn, self.clone())
    }

    /// Puts a healthy connection back, unless it fails the return test or
    /// the pool already holds `max_idle` idle connections.
    pub(crate) async fn release(&self, mut conn: Connection) {
        let settings = self.inner.settings;

        if settings.test_on_return {
            if let Err(e) = ping(&mut conn).await {
                warn!(error = %e, "Connection failed validation on return");
                self.evict(conn, "test_on_return");
                return;
            }
        }

        let status = self.status();
        if status.available >= settings.max_idle {
            debug!(available = status.available, "Idle limit reached, closing connection");
            drop(Connection::take(conn));
        } else {
            drop(conn);
        }

        PoolMetrics::pool_status(&self.status());
    }

    /// Detaches a broken connection from the pool and closes it.
    pub(crate) fn evict(&self, conn: Connection, reason: &'static str) {
        debug!(reason, "Evicting Redis connection");
        drop(Connection::take(conn));
        PoolMetrics::evicted(reason);
    }
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.status();
        f.debug_struct("RedisPool")
            .field("address", &self.inner.address)
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

async fn ping(conn: &mut Connection) -> redis::RedisResult<()> {
    redis::cmd("PING").query_async::<String>(conn).await.map(|_| ())
}
