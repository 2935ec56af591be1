//! # Redkit Config
//!
//! Configuration for the Redis connection pool. Settings are layered from
//! TOML files, a legacy `redis.properties` file and environment variables,
//! read once at startup.

mod app_config;
mod loader;
pub mod properties;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
