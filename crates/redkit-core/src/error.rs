//! Unified error type for the Redkit crates.

use deadpool_redis::PoolError;
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for every Redkit operation.
///
/// Errors fall into two groups. Caller mistakes (`InvalidArgument`) are
/// raised before a connection is borrowed. Everything else originates at
/// the pool or the store and carries the underlying error as its source.
#[derive(Error, Debug)]
pub enum RedkitError {
    // ============ Caller Errors ============
    /// Blank key, blank value or empty collection.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ============ Setup Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The process-wide facade was used before `init`.
    #[error("Redis facade is not initialized")]
    NotInitialized,

    // ============ Store Errors ============
    /// A connection could not be checked out of the pool.
    #[error("Redis pool error: {0}")]
    Pool(#[from] PoolError),

    /// The store failed or rejected a command.
    #[error("Redis command '{op}' failed: {source}")]
    Command {
        op: &'static str,
        #[source]
        source: redis::RedisError,
    },

    // ============ Value Errors ============
    /// A value could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),
}

impl RedkitError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::Pool(PoolError::Timeout(_)) => "POOL_TIMEOUT",
            Self::Pool(_) => "POOL_ERROR",
            Self::Command { .. } => "COMMAND_ERROR",
            Self::Codec(_) => "CODEC_ERROR",
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument<T: Into<String>>(message: T) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Wraps a store error raised by the named command.
    #[must_use]
    pub const fn command(op: &'static str, source: redis::RedisError) -> Self {
        Self::Command { op, source }
    }

    /// Checks if this error was raised before contacting the store.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Checks if this error means the connection (or the pool) is unusable.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Pool(_) => true,
            Self::Command { source, .. } => is_connection_failure(source),
            _ => false,
        }
    }
}

/// Returns `true` when a store error says the connection itself is broken.
///
/// Reply errors (`WRONGTYPE`, out-of-range values, ...) leave the connection
/// usable; I/O failures, dropped or refused connections and timeouts do not.
#[must_use]
pub fn is_connection_failure(err: &redis::RedisError) -> bool {
    err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout()
}
