//! Hashes of strings or codec-encoded values.

use crate::{ttl, Redis};
use redis::{AsyncCommands, RedisResult};
use redkit_core::codec;
use redkit_core::{require_key, require_non_empty, RedkitResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

impl Redis {
    /// Writes `fields` into the hash at `key`.
    ///
    /// The fields and the TTL (when `expire > 0`) go out in one MULTI/EXEC batch.
    pub async fn hmset(&self, key: &str, fields: &HashMap<String, String>, expire: i64) -> RedkitResult<bool> {
        require_key("hmset", key)?;
        require_non_empty("hmset", "fields", fields.len())?;

        let items: Vec<(&str, &[u8])> = fields
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_bytes()))
            .collect();
        self.write_fields("hmset", key, &items, expire).await
    }

    /// Writes serializable values into the hash at `key`.
    pub async fn hmset_t<T: Serialize>(&self, key: &str, fields: &HashMap<String, T>, expire: i64) -> RedkitResult<bool> {
        require_key("hmset_t", key)?;
        require_non_empty("hmset_t", "fields", fields.len())?;

        let encoded = fields
            .iter()
            .map(|(field, value)| codec::encode(value).map(|bytes| (field.as_str(), bytes)))
            .collect::<RedkitResult<Vec<_>>>()?;
        let items: Vec<(&str, &[u8])> = encoded
            .iter()
            .map(|(field, value)| (*field, value.as_slice()))
            .collect();
        self.write_fields("hmset_t", key, &items, expire).await
    }

    /// Reads `fields` from the hash at `key`, `None` for each missing field.
    pub async fn hmget<F: AsRef<str>>(&self, key: &str, fields: &[F]) -> RedkitResult<Vec<Option<String>>> {
        self.hmget_with_expire(key, fields, 0).await
    }

    /// Reads `fields` and refreshes the hash's TTL when `expire > 0`.
    pub async fn hmget_with_expire<F: AsRef<str>>(
        &self,
        key: &str,
        fields: &[F],
        expire: i64,
    ) -> RedkitResult<Vec<Option<String>>> {
        require_key("hmget", key)?;
        require_non_empty("hmget", "fields", fields.len())?;
        let fields: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<Vec<Option<String>>> = match ttl(expire) {
            None => redis::cmd("HMGET").arg(key).arg(&fields).query_async(lease.conn()).await,
            Some(_) => redis::pipe()
                .atomic()
                .cmd("HMGET")
                .arg(key)
                .arg(&fields)
                .expire(key, expire)
                .ignore()
                .query_async::<(Vec<Option<String>>,)>(lease.conn())
                .await
                .map(|(values,)| values),
        };
        lease.finish("hmget", result).await
    }

    /// Reads serializable values written with [`hmset_t`](Self::hmset_t).
    pub async fn hmget_t<T: DeserializeOwned, F: AsRef<str>>(&self, key: &str, fields: &[F]) -> RedkitResult<Vec<Option<T>>> {
        require_key("hmget_t", key)?;
        require_non_empty("hmget_t", "fields", fields.len())?;
        let fields: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<Vec<Option<Vec<u8>>>> =
            redis::cmd("HMGET").arg(key).arg(&fields).query_async(lease.conn()).await;
        let raw = lease.finish("hmget_t", result).await?;

        raw.into_iter()
            .map(|bytes| bytes.map(|b| codec::decode(&b)).transpose())
            .collect()
    }

    /// Reads the whole hash at `key`; empty when the key is missing.
    pub async fn hgetall(&self, key: &str) -> RedkitResult<HashMap<String, String>> {
        require_key("hgetall", key)?;

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<HashMap<String, String>> = lease.conn().hgetall(key).await;
        lease.finish("hgetall", result).await
    }

    /// Reads a whole hash written with [`hmset_t`](Self::hmset_t).
    pub async fn hgetall_t<T: DeserializeOwned>(&self, key: &str) -> RedkitResult<HashMap<String, T>> {
        require_key("hgetall_t", key)?;

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<HashMap<String, Vec<u8>>> = lease.conn().hgetall(key).await;
        let raw = lease.finish("hgetall_t", result).await?;

        raw.into_iter()
            .map(|(field, bytes)| codec::decode(&bytes).map(|value| (field, value)))
            .collect()
    }

    async fn write_fields(&self, op: &'static str, key: &str, items: &[(&str, &[u8])], expire: i64) -> RedkitResult<bool> {
        let mut pipe = redis::pipe();
        pipe.atomic().hset_multiple(key, items).ignore();
        if ttl(expire).is_some() {
            pipe.expire(key, expire).ignore();
        }

        let mut lease = self.pool.checkout().await?;
        let result: RedisResult<()> = pipe.query_async(lease.conn()).await;
        lease.finish(op, result).await?;
        Ok(true)
    }
}
