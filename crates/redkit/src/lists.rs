//! Lists.

use crate::{ttl, Redis};
use redis::{AsyncCommands, RedisResult};
use redkit_core::{require_key, require_non_empty, RedkitResult};

impl Redis {
    /// Appends `values` to the tail of the list at `key`, creating it if needed.
    ///
    /// Several values (and the TTL when `expire > 0`) go out in one MULTI/EXEC
    /// batch. Returns the length of the list afterwards.
    pub async fn rpush<V: AsRef<str>>(&self, key: &str, values: &[V], expire: i64) -> RedkitResult<i64> {
        require_key("rpush", key)?;
        require_non_empty("rpush", "values", values.len())?;

        let mut lease = self.pool.checkout().await?;

        let result: RedisResult<i64> = if values.len() == 1 && ttl(expire).is_none() {
            lease.conn().rpush(key, values[0].as_ref()).await
        } else {
            let mut pipe = redis::pipe();
            pipe.atomic();
            for value in values {
                pipe.rpush(key, value.as_ref());
            }
            if ttl(expire).is_some() {
                pipe.expire(key, expire).ignore();
            }
            pipe.query_async::<Vec<i64>>(lease.conn())
                .await
                .map(|lengths| lengths.last().copied().unwrap_or_default())
        };

        lease.finish("rpush", result).await
    }

    /// Returns the elements between `start` and `end`, inclusive.
    ///
    /// Negative indexes count from the tail, so `lrange(key, 0, -1)` reads
    /// the whole list.
    pub async fn lrange(&self, key: &str, start: isize, end: isize) -> RedkitResult<Vec<String>> {
        require_key("lrange", key)?;

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<Vec<String>> = lease.conn().lrange(key, start, end).await;
        lease.finish("lrange", result).await
    }
}
