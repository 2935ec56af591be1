//! Key expiry and string values, plain or codec-encoded.

use crate::{ttl, Redis};
use redis::{AsyncCommands, RedisResult};
use redkit_core::codec;
use redkit_core::{require_key, require_keys, require_value, RedkitResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

const SET_OK: &str = "OK";

impl Redis {
    /// Sets a TTL on `key`. Does nothing when `expire <= 0`.
    pub async fn expire(&self, key: &str, expire: i64) -> RedkitResult<()> {
        require_key("expire", key)?;
        if ttl(expire).is_none() {
            return Ok(());
        }

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<bool> = lease.conn().expire(key, expire).await;
        let applied = lease.finish("expire", result).await?;
        debug!(key, expire, applied, "EXPIRE");
        Ok(())
    }

    /// Stores a string, with a TTL when `expire > 0`.
    ///
    /// Returns `true` when Redis acknowledged the write.
    pub async fn set(&self, key: &str, value: &str, expire: i64) -> RedkitResult<bool> {
        require_key("set", key)?;
        require_value("set", value)?;

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<String> = match ttl(expire) {
            Some(secs) => lease.conn().set_ex(key, value, secs).await,
            None => lease.conn().set(key, value).await,
        };
        let reply = lease.finish("set", result).await?;
        Ok(reply == SET_OK)
    }

    /// Stores a string only if `key` does not exist.
    ///
    /// The TTL applies only when the write happened; an existing key keeps
    /// its value and its TTL. Returns `true` when the value was written.
    pub async fn set_nx(&self, key: &str, value: &str, expire: i64) -> RedkitResult<bool> {
        require_key("set_nx", key)?;
        require_value("set_nx", value)?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(secs) = ttl(expire) {
            cmd.arg("EX").arg(secs);
        }

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<Option<String>> = cmd.query_async(lease.conn()).await;
        let reply = lease.finish("set_nx", result).await?;
        Ok(reply.is_some())
    }

    /// Reads a string.
    pub async fn get(&self, key: &str) -> RedkitResult<Option<String>> {
        require_key("get", key)?;

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<Option<String>> = lease.conn().get(key).await;
        let value = lease.finish("get", result).await?;

        match &value {
            Some(_) => debug!(key, "GET hit"),
            None => debug!(key, "GET miss"),
        }
        Ok(value)
    }

    /// Deletes keys, returning how many existed.
    pub async fn del<K: AsRef<str>>(&self, keys: &[K]) -> RedkitResult<u64> {
        require_keys("del", keys)?;
        let keys: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<u64> = lease.conn().del(&keys).await;
        let deleted = lease.finish("del", result).await?;
        debug!(requested = keys.len(), deleted, "DEL");
        Ok(deleted)
    }

    /// Stores any serializable value as an opaque blob.
    pub async fn set_t<T: Serialize + ?Sized>(&self, key: &str, value: &T, expire: i64) -> RedkitResult<bool> {
        require_key("set_t", key)?;
        let bytes = codec::encode(value)?;

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<String> = match ttl(expire) {
            Some(secs) => lease.conn().set_ex(key, bytes, secs).await,
            None => lease.conn().set(key, bytes).await,
        };
        let reply = lease.finish("set_t", result).await?;
        Ok(reply == SET_OK)
    }

    /// Reads a value stored with [`set_t`](Self::set_t).
    ///
    /// A missing key or an empty stored value reads as `None`.
    pub async fn get_t<T: DeserializeOwned>(&self, key: &str) -> RedkitResult<Option<T>> {
        require_key("get_t", key)?;

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<Option<Vec<u8>>> = lease.conn().get(key).await;
        let bytes = lease.finish("get_t", result).await?;

        match bytes {
            Some(bytes) if !bytes.is_empty() => codec::decode(&bytes).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::{assert_rejected, offline};

    #[tokio::test]
    async fn test_blank_key_rejected_before_checkout() {
        let redis = offline();
        assert_rejected(&redis, redis.get("").await);
        assert_rejected(&redis, redis.get("   ").await);
        assert_rejected(&redis, redis.expire("", 10).await);
        assert_rejected(&redis, redis.set("", "v", 0).await);
        assert_rejected(&redis, redis.set_nx(" ", "v", 0).await);
        assert_rejected(&redis, redis.set_t("", &42, 0).await);
        assert_rejected(&redis, redis.get_t::<u32>("").await);
    }

    #[tokio::test]
    async fn test_blank_value_rejected() {
        let redis = offline();
        assert_rejected(&redis, redis.set("k", "", 0).await);
        assert_rejected(&redis, redis.set_nx("k", "  ", 10).await);
    }

    #[tokio::test]
    async fn test_del_rejects_empty_and_blank_keys() {
        let redis = offline();
        let none: [&str; 0] = [];
        assert_rejected(&redis, redis.del(&none).await);
        assert_rejected(&redis, redis.del(&["a", ""]).await);
    }

    #[tokio::test]
    async fn test_expire_without_ttl_skips_store() {
        let redis = offline();
        redis.expire("k", 0).await.unwrap();
        redis.expire("k", -1).await.unwrap();
        assert_eq!(redis.pool().status().size, 0);
    }
}
