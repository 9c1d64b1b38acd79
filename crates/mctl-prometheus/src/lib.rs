//! Prometheus implementation of [`mctl_core::MetricsBackend`].
//!
//! ```rust
//! use std::sync::Arc;
//! use mctl_core::MetricsHandle;
//! use mctl_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: MetricsHandle = Arc::new(metrics.clone());
//! // pass `handle` to MonitOperator::new, serve `metrics.gather()` on /metrics
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `mctl_commands_total{action, outcome}` - Counter
//! - `mctl_reloads_total` - Counter
//! - `mctl_retries_total{operation}` - Counter
mod backend;
pub use backend::PrometheusMetrics;
