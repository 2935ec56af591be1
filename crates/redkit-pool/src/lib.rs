//! # Redkit Pool
//!
//! Builds the shared Redis connection pool once from configuration and hands
//! out [`Lease`]s. A lease is finished exactly once: the connection is either
//! returned healthy or evicted when the store reports a connection-level
//! failure.

mod lease;
pub mod metrics;
mod pool;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use lease::Lease;
pub use pool::{PoolSettings, PoolStatus, RedisPool};
