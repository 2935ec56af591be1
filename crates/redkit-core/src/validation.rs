//! Argument guards applied before a command is sent.
//!
//! Every guard takes the name of the calling operation so the resulting
//! error reads like `set: key must not be blank`.

use crate::{RedkitError, RedkitResult};

/// Rejects empty or whitespace-only keys.
pub fn require_key(op: &str, key: &str) -> RedkitResult<()> {
    if rules::not_blank(key) {
        Ok(())
    } else {
        Err(RedkitError::invalid_argument(format!("{op}: key must not be blank")))
    }
}

/// Rejects empty or whitespace-only string values.
pub fn require_value(op: &str, value: &str) -> RedkitResult<()> {
    if rules::not_blank(value) {
        Ok(())
    } else {
        Err(RedkitError::invalid_argument(format!("{op}: value must not be blank")))
    }
}

/// Rejects an empty key list, or a list holding any blank key.
pub fn require_keys<K: AsRef<str>>(op: &str, keys: &[K]) -> RedkitResult<()> {
    require_non_empty(op, "keys", keys.len())?;
    keys.iter().try_for_each(|key| require_key(op, key.as_ref()))
}

/// Rejects empty collections.
pub fn require_non_empty(op: &str, what: &str, len: usize) -> RedkitResult<()> {
    if len == 0 {
        return Err(RedkitError::invalid_argument(format!("{op}: {what} must not be empty")));
    }
    Ok(())
}

/// Common validation predicates.
pub mod rules {
    /// A string is not blank when something remains after trimming.
    #[must_use]
    pub fn not_blank(value: &str) -> bool {
        !value.trim().is_empty()
    }
}
