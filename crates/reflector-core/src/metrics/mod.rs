//! Metrics collection abstraction for the reflection engine.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are injected via [`crate::ReflectContext`].
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, ReconcileOutcome};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
