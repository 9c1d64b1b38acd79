//! Metrics abstraction for supervisor control operations.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are
//! injected into [`crate::MonitOperator`] and [`crate::RetryPolicy`].
mod backend;
pub use backend::{CommandOutcome, MetricsBackend, MetricsHandle};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
