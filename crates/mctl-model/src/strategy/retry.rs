use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    TimeoutMs,
    error::{ModelError, ModelResult},
};

/// Time and attempt budget for retrying a fallible operation.
///
/// The retry loop starts from `first_ms` and multiplies the interval by
/// `factor` before every sleep, so the first sleep is `first_ms * factor`.
/// Intervals never exceed `max_ms` when it is set. Retrying stops once the
/// elapsed time reaches `timeout_ms` or, if set, after `max_retries` retries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryBudget {
    pub timeout_ms: TimeoutMs,
    pub first_ms: u64,
    pub factor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            first_ms: 200,
            factor: 2.0,
            max_ms: Some(300_000),
            max_retries: None,
        }
    }
}

impl RetryBudget {
    /// Budget used by the command-line wrapper: 60s total, first sleep 1s.
    pub fn cli() -> Self {
        Self {
            first_ms: 500,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_first(mut self, first: Duration) -> Self {
        self.first_ms = first.as_millis() as u64;
        self
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_max(mut self, max: Option<Duration>) -> Self {
        self.max_ms = max.map(|d| d.as_millis() as u64);
        self
    }

    pub fn with_max_retries(mut self, retries: Option<u32>) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn first(&self) -> Duration {
        Duration::from_millis(self.first_ms)
    }

    pub fn max(&self) -> Option<Duration> {
        self.max_ms.map(Duration::from_millis)
    }

    /// Reject factors that are negative or not finite.
    pub fn validate(&self) -> ModelResult<()> {
        if !self.factor.is_finite() || self.factor < 0.0 {
            return Err(ModelError::InvalidBudget(format!("factor must be finite and non-negative, got {}", self.factor)));
        }
        Ok(())
    }

    /// Next sleep interval given the previous one.
    ///
    /// Saturates at `max_ms`, or at [`Duration::MAX`] when uncapped.
    pub fn next_interval(&self, prev: Duration) -> Duration {
        let cap = self.max().unwrap_or(Duration::MAX);
        let secs = prev.as_secs_f64() * self.factor.max(0.0);
        Duration::try_from_secs_f64(secs).map_or(cap, |next| next.min(cap))
    }
}
