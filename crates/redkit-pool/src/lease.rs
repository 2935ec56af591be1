//! A borrowed connection and the bookkeeping that gives it back.

use crate::metrics::PoolMetrics;
use crate::RedisPool;
use deadpool_redis::Connection;
use redkit_core::{is_connection_failure, RedkitError, RedkitResult};
use tracing::error;

/// One connection checked out of a [`RedisPool`].
///
/// Call [`finish`](Self::finish) with the command's result to release the
/// connection and translate the error. A lease dropped without finishing
/// (an early `?`, a cancelled future) returns its connection to the pool.
pub struct Lease {
    conn: Connection,
    pool: RedisPool,
}

impl Lease {
    pub(crate) fn new(conn: Connection, pool: RedisPool) -> Self {
        Self { conn, pool }
    }

    /// The borrowed connection.
    pub fn conn(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Releases the connection and converts the command result.
    ///
    /// On success the connection goes back to the pool. On a
    /// connection-level failure it is evicted; on any other store error it
    /// is still healthy and goes back. Errors are logged and wrapped with
    /// the operation name.
    pub async fn finish<T>(self, op: &'static str, result: redis::RedisResult<T>) -> RedkitResult<T> {
        let Self { conn, pool } = self;

        match result {
            Ok(value) => {
                pool.release(conn).await;
                Ok(value)
            }
            Err(e) => {
                PoolMetrics::command_failed(op);
                if is_connection_failure(&e) {
                    error!(op, error = %e, "Redis connection failure");
                    pool.evict(conn, "connection_error");
                } else {
                    error!(op, error = %e, "Redis command failed");
                    pool.release(conn).await;
                }
                Err(RedkitError::command(op, e))
            }
        }
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease").field("pool", &self.pool).finish_non_exhaustive()
    }
}
