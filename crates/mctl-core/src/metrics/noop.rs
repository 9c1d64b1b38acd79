use crate::metrics::backend::{CommandOutcome, MetricsBackend};

/// Metrics backend that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_command(&self, _: &str, _: CommandOutcome) {}

    #[inline(always)]
    fn record_reload(&self) {}

    #[inline(always)]
    fn record_retry(&self, _: &str) {}
}
