//! Atomic counters.

use crate::{ttl, Redis};
use redis::RedisResult;
use redkit_core::{require_key, RedkitResult};

impl Redis {
    /// Increments the integer at `key` by one. The key never expires.
    pub async fn incr(&self, key: &str) -> RedkitResult<i64> {
        self.incr_with_expire(key, 0).await
    }

    /// Increments the integer at `key` by one, refreshing its TTL when `expire > 0`.
    pub async fn incr_with_expire(&self, key: &str, expire: i64) -> RedkitResult<i64> {
        self.step("incr", "INCR", key, expire).await
    }

    /// Decrements the integer at `key` by one. The key never expires.
    pub async fn decr(&self, key: &str) -> RedkitResult<i64> {
        self.decr_with_expire(key, 0).await
    }

    /// Decrements the integer at `key` by one, refreshing its TTL when `expire > 0`.
    pub async fn decr_with_expire(&self, key: &str, expire: i64) -> RedkitResult<i64> {
        self.step("decr", "DECR", key, expire).await
    }

    async fn step(&self, op: &'static str, command: &str, key: &str, expire: i64) -> RedkitResult<i64> {
        require_key(op, key)?;

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<i64> = match ttl(expire) {
            None => redis::cmd(command).arg(key).query_async(lease.conn()).await,
            Some(_) => redis::pipe()
                .atomic()
                .cmd(command)
                .arg(key)
                .expire(key, expire)
                .ignore()
                .query_async::<(i64,)>(lease.conn())
                .await
                .map(|(value,)| value),
        };
        lease.finish(op, result).await
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::{assert_rejected, offline};
    use crate::Redis;
    use redkit_pool::testing::FakeRedis;

    #[tokio::test]
    async fn test_blank_key_rejected() {
        let redis = offline();
        assert_rejected(&redis, redis.incr("").await);
        assert_rejected(&redis, redis.incr_with_expire(" ", 30).await);
        assert_rejected(&redis, redis.decr("").await);
        assert_rejected(&redis, redis.decr_with_expire("\t", 30).await);
    }

    #[tokio::test]
    async fn test_incr_and_decr_send_plain_commands() {
        let server = FakeRedis::start().await.unwrap();
        let redis = Redis::new(&server.config()).unwrap();

        assert_eq!(redis.incr("hits").await.unwrap(), 1);
        assert_eq!(redis.decr("hits").await.unwrap(), -1);

        let commands = server.commands();
        assert!(commands.iter().any(|c| c == "INCR"));
        assert!(commands.iter().any(|c| c == "DECR"));
        assert!(!commands.iter().any(|c| c == "INCRBY" || c == "DECRBY"));
    }
}
