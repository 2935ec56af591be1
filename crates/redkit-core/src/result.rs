//! Result type aliases for Redkit.

use crate::RedkitError;

/// A specialized `Result` type for Redkit operations.
pub type RedkitResult<T> = Result<T, RedkitError>;
