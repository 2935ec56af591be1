//! # Redkit
//!
//! Pooled helper functions over Redis. Each operation validates its
//! arguments, borrows one connection, issues one command (or one MULTI/EXEC
//! batch) and hands the connection back, evicting it when the failure was
//! connection-level.
//!
//! ```no_run
//! # async fn demo() -> redkit::RedkitResult<()> {
//! let redis = redkit::init_from_dir("./config")?;
//! redis.set("greeting", "hello", 60).await?;
//! assert_eq!(redis.get("greeting").await?.as_deref(), Some("hello"));
//! # Ok(())
//! # }
//! ```

mod client;
mod counters;
mod hashes;
mod lists;
mod sets;
mod strings;

pub use client::{global, init, init_from_dir, Redis};
pub use redkit_config::{AppConfig, ConfigLoader, PoolConfig, RedisConfig};
pub use redkit_core::{init_logging, try_init_logging, LogFormat, RedkitError, RedkitResult, TelemetryConfig};
pub use redkit_pool::{PoolStatus, RedisPool};

/// Converts an `expire` argument into a TTL.
///
/// Positive values are seconds; zero or negative means "leave the TTL alone".
pub(crate) fn ttl(expire: i64) -> Option<u64> {
    u64::try_from(expire).ok().filter(|secs| *secs > 0)
}
