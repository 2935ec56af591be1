//! Metrics for connection pool monitoring.
//!
//! Recording is a no-op until the application installs a `metrics` recorder.

use crate::PoolStatus;
use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Metric names for the connection pool.
pub mod names {
    /// Total successful checkouts.
    pub const CHECKOUTS_TOTAL: &str = "redkit_pool_checkouts_total";
    /// Total failed checkouts.
    pub const CHECKOUT_FAILURES_TOTAL: &str = "redkit_pool_checkout_failures_total";
    /// Total connections evicted instead of returned.
    pub const EVICTIONS_TOTAL: &str = "redkit_pool_evictions_total";
    /// Total commands that returned an error.
    pub const COMMAND_FAILURES_TOTAL: &str = "redkit_command_failures_total";

    /// Current pool size.
    pub const POOL_SIZE: &str = "redkit_pool_size";
    /// Current idle connections.
    pub const POOL_AVAILABLE: &str = "redkit_pool_available";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CHECKOUTS_TOTAL, "Total number of connections checked out");
    describe_counter!(
        names::CHECKOUT_FAILURES_TOTAL,
        "Total number of failed connection checkouts"
    );
    describe_counter!(
        names::EVICTIONS_TOTAL,
        "Total number of connections evicted from the pool"
    );
    describe_counter!(
        names::COMMAND_FAILURES_TOTAL,
        "Total number of Redis commands that failed"
    );
    describe_gauge!(names::POOL_SIZE, "Redis connection pool size");
    describe_gauge!(names::POOL_AVAILABLE, "Idle connections in the Redis pool");
}

/// Pool metrics recorder.
#[derive(Clone)]
pub struct PoolMetrics;

impl PoolMetrics {
    /// Record a successful checkout.
    pub fn checkout() {
        counter!(names::CHECKOUTS_TOTAL).increment(1);
    }

    /// Record a failed checkout.
    pub fn checkout_failed() {
        counter!(names::CHECKOUT_FAILURES_TOTAL).increment(1);
    }

    /// Record an evicted connection.
    pub fn evicted(reason: &'static str) {
        counter!(names::EVICTIONS_TOTAL, "reason" => reason).increment(1);
    }

    /// Record a failed command.
    pub fn command_failed(op: &'static str) {
        counter!(names::COMMAND_FAILURES_TOTAL, "op" => op).increment(1);
    }

    /// Record the pool's current occupancy.
    #[allow(clippy::cast_precision_loss)]
    pub fn pool_status(status: &PoolStatus) {
        gauge!(names::POOL_SIZE).set(status.size as f64);
        gauge!(names::POOL_AVAILABLE).set(status.available as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        register_metrics();
        PoolMetrics::checkout();
        PoolMetrics::evicted("connection_error");
        PoolMetrics::command_failed("get");
        PoolMetrics::pool_status(&PoolStatus {
            max_size: 8,
            size: 1,
            available: 1,
            waiting: 0,
        });
    }
}
