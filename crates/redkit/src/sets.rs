//! Sets of strings or codec-encoded values.

use crate::{ttl, Redis};
use redis::{AsyncCommands, RedisResult};
use redkit_core::codec;
use redkit_core::{require_key, require_non_empty, RedkitResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;

impl Redis {
    /// Adds `members` to the set at `key`, creating it if needed.
    ///
    /// All SADDs and the TTL (when `expire > 0`) run in one MULTI/EXEC batch.
    pub async fn sadd<I, M>(&self, key: &str, members: I, expire: i64) -> RedkitResult<bool>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<str>,
    {
        require_key("sadd", key)?;
        let members: Vec<M> = members.into_iter().collect();
        require_non_empty("sadd", "members", members.len())?;

        let encoded = members.iter().map(|m| m.as_ref().as_bytes().to_vec()).collect();
        self.add_members("sadd", key, encoded, expire).await
    }

    /// Adds serializable values to the set at `key`.
    ///
    /// Members are compared by their encoded bytes.
    pub async fn sadd_t<'a, I, T>(&self, key: &str, members: I, expire: i64) -> RedkitResult<bool>
    where
        I: IntoIterator<Item = &'a T>,
        T: Serialize + 'a,
    {
        require_key("sadd_t", key)?;
        let encoded = members
            .into_iter()
            .map(codec::encode)
            .collect::<RedkitResult<Vec<_>>>()?;
        require_non_empty("sadd_t", "members", encoded.len())?;

        self.add_members("sadd_t", key, encoded, expire).await
    }

    /// Returns every member of the set at `key`; empty when the key is missing.
    pub async fn smembers(&self, key: &str) -> RedkitResult<HashSet<String>> {
        require_key("smembers", key)?;

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<HashSet<String>> = lease.conn().smembers(key).await;
        lease.finish("smembers", result).await
    }

    /// Returns every member of a set written with [`sadd_t`](Self::sadd_t).
    pub async fn smembers_t<T>(&self, key: &str) -> RedkitResult<HashSet<T>>
    where
        T: DeserializeOwned + Eq + Hash,
    {
        require_key("smembers_t", key)?;

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<Vec<Vec<u8>>> = lease.conn().smembers(key).await;
        let raw = lease.finish("smembers_t", result).await?;

        raw.iter().map(|bytes| codec::decode(bytes)).collect()
    }

    async fn add_members(&self, op: &'static str, key: &str, members: Vec<Vec<u8>>, expire: i64) -> RedkitResult<bool> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for member in &members {
            pipe.sadd(key, member).ignore();
        }
        if ttl(expire).is_some() {
            pipe.expire(key, expire).ignore();
        }

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<()> = pipe.query_async(lease.conn()).await;
        lease.finish(op, result).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::{assert_rejected, offline};
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_sadd_rejects_blank_key_and_empty_members() {
        let redis = offline();
        assert_rejected(&redis, redis.sadd("", ["a"], 0).await);
        assert_rejected(&redis, redis.sadd("set", HashSet::<String>::new(), 0).await);
    }

    #[tokio::test]
    async fn test_sadd_t_rejects_empty_members() {
        let redis = offline();
        let members: Vec<u32> = Vec::new();
        assert_rejected(&redis, redis.sadd_t("set", &members, 0).await);
    }

    #[tokio::test]
    async fn test_smembers_rejects_blank_key() {
        let redis = offline();
        assert_rejected(&redis, redis.smembers("").await);
        assert_rejected(&redis, redis.smembers_t::<String>(" ").await);
    }
}
