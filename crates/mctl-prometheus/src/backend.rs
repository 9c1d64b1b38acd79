use std::sync::Arc;

use prometheus::{IntCounter, IntCounterVec, Opts, Registry, proto::MetricFamily};

use mctl_core::{CommandOutcome, MetricsBackend};

const NAMESPACE: &str = "mctl";

/// Prometheus metrics backend.
///
/// Label values are bounded: `action` is a supervisor verb, `outcome` is
/// `success | not_found | failure`, `operation` is a retry policy name.
#[derive(Clone)]
pub struct PrometheusMetrics {
    commands: IntCounterVec,
    reloads: IntCounter,
    retries: IntCounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register the counters in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let commands = IntCounterVec::new(
            Opts::new("commands_total", "Control commands sent to the supervisor").namespace(NAMESPACE),
            &["action", "outcome"],
        )?;
        registry.register(Box::new(commands.clone()))?;

        let reloads = IntCounter::with_opts(
            Opts::new("reloads_total", "Supervisor reloads actually issued").namespace(NAMESPACE),
        )?;
        registry.register(Box::new(reloads.clone()))?;

        let retries = IntCounterVec::new(
            Opts::new("retries_total", "Retries of failed operations").namespace(NAMESPACE),
            &["operation"],
        )?;
        registry.register(Box::new(retries.clone()))?;

        Ok(Self {
            commands,
            reloads,
            retries,
            registry,
        })
    }

    /// Create a backend with its own registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metrics for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_command(&self, action: &str, outcome: CommandOutcome) {
        self.commands
            .with_label_values(&[action, outcome.as_label()])
            .inc();
    }

    fn record_reload(&self) {
        self.reloads.inc();
    }

    fn record_retry(&self, operation: &str) {
        self.retries.with_label_values(&[operation]).inc();
    }
}
