//! # Redkit Core
//!
//! Core types shared by every Redkit crate: the unified error type,
//! argument guards applied before any command reaches Redis, the value
//! codec used for opaque values, and logging initialization.

pub mod codec;
pub mod error;
pub mod result;
pub mod telemetry;
pub mod validation;

pub use error::*;
pub use result::*;
pub use telemetry::{init_logging, try_init_logging, LogFormat, TelemetryConfig};
pub use validation::*;
