use std::{fmt, future::Future, time::Instant as StdInstant};

use tokio::time::Instant;
use tracing::{debug, error, warn};

use mctl_model::RetryBudget;

use super::{Attempts, Decision};
use crate::metrics::MetricsHandle;

/// Retry wrapper parameterized by an error-classification predicate.
///
/// `retry_on` decides which errors are worth another attempt; anything it
/// rejects propagates immediately without sleeping.
///
/// ```rust
/// # use mctl_core::{OperatorError, RetryPolicy};
/// # use mctl_model::RetryBudget;
/// let policy = RetryPolicy::new("send_command", RetryBudget::default(), OperatorError::is_retryable);
/// ```
#[derive(Clone)]
pub struct RetryPolicy<P> {
    operation: &'static str,
    budget: RetryBudget,
    retry_on: P,
    metrics: Option<MetricsHandle>,
}

impl<P> RetryPolicy<P> {
    /// Create a policy.
    ///
    /// `operation`: name used in logs and metrics
    /// `budget`: time / attempt budget and backoff curve
    /// `retry_on`: returns `true` for errors that should be retried
    pub fn new(operation: &'static str, budget: RetryBudget, retry_on: P) -> Self {
        Self {
            operation,
            budget,
            retry_on,
            metrics: None,
        }
    }

    /// Count every retry in the given metrics backend.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn budget(&self) -> &RetryBudget {
        &self.budget
    }

    fn classify<E>(&self, attempts: &mut Attempts<'_>, err: &E, elapsed: std::time::Duration) -> Decision
    where
        P: Fn(&E) -> bool,
        E: fmt::Display,
    {
        if !(self.retry_on)(err) {
            debug!(operation = self.operation, error = %err, "error is not retryable");
            return Decision::GiveUp;
        }
        match attempts.on_failure(elapsed) {
            Decision::GiveUp => {
                error!(
                    operation = self.operation,
                    attempts = attempts.retries() + 1,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "giving up retrying",
                );
                Decision::GiveUp
            }
            Decision::Retry(delay) => {
                warn!(
                    operation = self.operation,
                    attempt = attempts.retries(),
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retry scheduled after failure",
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_retry(self.operation);
                }
                Decision::Retry(delay)
            }
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the budget is spent.
    ///
    /// Suspends only the calling task between attempts.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        P: Fn(&E) -> bool,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let mut attempts = Attempts::new(&self.budget);
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            match self.classify(&mut attempts, &err, start.elapsed()) {
                Decision::GiveUp => return Err(err),
                Decision::Retry(delay) => tokio::time::sleep(delay).await,
            }
        }
    }

    /// Blocking flavor of [`RetryPolicy::run`]; sleeps the calling thread.
    ///
    /// Must not be called from an async runtime worker.
    pub fn run_blocking<T, E, F>(&self, mut op: F) -> Result<T, E>
    where
        P: Fn(&E) -> bool,
        E: fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let start = StdInstant::now();
        let mut attempts = Attempts::new(&self.budget);
        loop {
            let err = match op() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            match self.classify(&mut attempts, &err, start.elapsed()) {
                Decision::GiveUp => return Err(err),
                Decision::Retry(delay) => std::thread::sleep(delay),
            }
        }
    }
}

impl<P> fmt::Debug for RetryPolicy<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("operation", &self.operation)
            .field("budget", &self.budget)
            .finish()
    }
}
