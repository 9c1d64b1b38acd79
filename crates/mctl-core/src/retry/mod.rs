//! Retry with exponential backoff inside a wall-clock budget.
//!
//! [`RetryPolicy`] wraps a fallible operation explicitly at the call site:
//! - [`RetryPolicy::run`] suspends the calling task between attempts (tokio timer);
//! - [`RetryPolicy::run_blocking`] sleeps the calling thread.
//!
//! Both flavors share [`Attempts`], so the backoff curve and the give-up rule
//! are identical regardless of where the policy is used.
mod policy;
pub use policy::RetryPolicy;

use std::time::Duration;

use mctl_model::RetryBudget;

/// Outcome of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    /// Sleep for the given interval, then try again.
    Retry(Duration),
    /// Budget exhausted; propagate the error.
    GiveUp,
}

/// Per-invocation retry bookkeeping.
#[derive(Debug)]
pub(crate) struct Attempts<'a> {
    budget: &'a RetryBudget,
    retries: u32,
    interval: Duration,
}

impl<'a> Attempts<'a> {
    pub(crate) fn new(budget: &'a RetryBudget) -> Self {
        Self {
            budget,
            retries: 0,
            interval: budget.first(),
        }
    }

    /// Number of retries scheduled so far.
    pub(crate) fn retries(&self) -> u32 {
        self.retries
    }

    /// Decide what to do after a retryable failure observed `elapsed` after the first attempt.
    pub(crate) fn on_failure(&mut self, elapsed: Duration) -> Decision {
        if elapsed >= self.budget.timeout() {
            return Decision::GiveUp;
        }
        if let Some(max) = self.budget.max_retries {
            if self.retries >= max {
                return Decision::GiveUp;
            }
        }
        self.retries += 1;
        self.interval = self.budget.next_interval(self.interval);
        Decision::Retry(self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_follow_budget_curve() {
        let budget = RetryBudget::default();
        let mut attempts = Attempts::new(&budget);

        let mut delays = Vec::new();
        for _ in 0..3 {
            match attempts.on_failure(Duration::ZERO) {
                Decision::Retry(d) => delays.push(d.as_millis()),
                Decision::GiveUp => panic!("budget should not be exhausted"),
            }
        }
        assert_eq!(delays, vec![400, 800, 1600]);
        assert_eq!(attempts.retries(), 3);
    }

    #[test]
    fn gives_up_once_timeout_elapsed() {
        let budget = RetryBudget::default().with_timeout(Duration::from_secs(10));
        let mut attempts = Attempts::new(&budget);

        assert!(matches!(attempts.on_failure(Duration::from_secs(9)), Decision::Retry(_)));
        assert_eq!(attempts.on_failure(Duration::from_secs(10)), Decision::GiveUp);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let budget = RetryBudget::default().with_max_retries(Some(2));
        let mut attempts = Attempts::new(&budget);

        assert!(matches!(attempts.on_failure(Duration::ZERO), Decision::Retry(_)));
        assert!(matches!(attempts.on_failure(Duration::ZERO), Decision::Retry(_)));
        assert_eq!(attempts.on_failure(Duration::ZERO), Decision::GiveUp);
    }
}
