use std::time::Duration;

use taskvisor::{BackoffPolicy, ControllerAdmission, ControllerSpec, JitterPolicy, RestartPolicy, TaskRef, TaskSpec};

/// How a periodic background task is rerun.
///
/// After a success the task sleeps `every`; after a failure it backs off from
/// `retry_first` doubling up to `retry_max`.
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule {
    pub every: Duration,
    pub timeout: Option<Duration>,
    pub retry_first: Duration,
    pub retry_max: Duration,
}

impl Schedule {
    /// Rerun every `every`, retrying failures after 1s up to `every`.
    pub fn every(every: Duration) -> Self {
        Self {
            every,
            timeout: None,
            retry_first: Duration::from_secs(1).min(every),
            retry_max: every,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, first: Duration, max: Duration) -> Self {
        self.retry_first = first;
        self.retry_max = max.max(first);
        self
    }

    pub(crate) fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            success_delay: Some(self.every),
            first: self.retry_first,
            max: self.retry_max,
            jitter: JitterPolicy::None,
            factor: 2.0,
        }
    }
}

/// Wrap `task` into a controller spec rerun forever on `schedule`.
///
/// A resubmission with the same task name replaces the running one.
pub(crate) fn to_controller_spec(task: TaskRef, schedule: &Schedule) -> ControllerSpec {
    ControllerSpec {
        admission: ControllerAdmission::Replace,
        task_spec: TaskSpec::new(task, RestartPolicy::Always, schedule.backoff(), schedule.timeout),
    }
}
