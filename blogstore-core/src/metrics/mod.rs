//! Metrics for post operations
//!
//! Records through the `metrics` facade. Installing a recorder/exporter is
//! left to the host binary; without one every call is a no-op.

use crate::core_post::ErrorKind;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

pub const OPERATIONS_TOTAL: &str = "post.operations.total";
pub const OPERATIONS_REJECTED: &str = "post.operations.rejected";
pub const OPERATIONS_FAILED: &str = "post.operations.failed";
pub const POSTS_CREATED: &str = "post.created";
pub const POSTS_DELETED: &str = "post.deleted";
pub const EDITORS_CHANGED: &str = "post.editors.changed";
pub const OPERATION_DURATION: &str = "post.operation.duration_ms";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(OPERATIONS_TOTAL, "Total post operations attempted");
    describe_counter!(
        OPERATIONS_REJECTED,
        "Post operations rejected by a check before any write"
    );
    describe_counter!(
        OPERATIONS_FAILED,
        "Post operations aborted by the storage substrate"
    );
    describe_counter!(POSTS_CREATED, "Posts created");
    describe_counter!(POSTS_DELETED, "Posts deleted");
    describe_counter!(EDITORS_CHANGED, "Editor additions and removals");
    describe_histogram!(
        OPERATION_DURATION,
        "Post operation duration in milliseconds"
    );
}

/// Count an attempted operation
pub fn record_operation(operation: &'static str) {
    counter!(OPERATIONS_TOTAL, "operation" => operation).increment(1);
}

/// Counter an operation ending in `kind` is recorded under
pub fn error_counter(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Storage => OPERATIONS_FAILED,
        _ => OPERATIONS_REJECTED,
    }
}

/// Count an operation that ended in error. Rejections carry the error kind.
pub fn record_error(operation: &'static str, kind: ErrorKind) {
    match error_counter(kind) {
        OPERATIONS_FAILED => counter!(OPERATIONS_FAILED, "operation" => operation).increment(1),
        name => counter!(name, "operation" => operation, "kind" => kind.as_str()).increment(1),
    }
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

/// Timer for measuring operation duration
pub struct Timer {
    operation: &'static str,
    start: Instant,
}

impl Timer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        let elapsed = self.start.elapsed();
        histogram!(OPERATION_DURATION, "operation" => self.operation)
            .record(elapsed.as_secs_f64() * 1000.0);
    }
}
