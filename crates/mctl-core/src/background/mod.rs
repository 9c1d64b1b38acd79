//! Supervised periodic work.
//!
//! [`BackgroundTasks`] owns a taskvisor supervisor with its controller
//! enabled; task bodies are plain [`taskvisor::TaskRef`]s rerun on a
//! [`Schedule`].
mod schedule;
pub use schedule::Schedule;

use std::sync::Arc;

use taskvisor::{Config as SupervisorConfig, ControllerConfig, Supervisor, TaskRef};
use tracing::{debug, error, info, instrument};

use crate::error::OperatorError;
use schedule::to_controller_spec;

/// Handle to the background task supervisor.
#[derive(Clone)]
pub struct BackgroundTasks {
    sup: Arc<Supervisor>,
}

impl BackgroundTasks {
    /// Build the supervisor, start its run loop and wait until it accepts tasks.
    pub async fn start() -> Self {
        let sup = Supervisor::builder(SupervisorConfig::default())
            .with_subscribers(Vec::new())
            .with_controller(ControllerConfig::default())
            .build();

        let runner = Arc::clone(&sup);
        tokio::spawn(async move {
            if let Err(e) = runner.run(Vec::new()).await {
                error!(error = %e, "background supervisor exited");
            }
        });
        sup.wait_ready().await;
        info!("background supervisor ready");
        Self { sup }
    }

    /// Run `task` forever on `schedule`.
    #[instrument(level = "debug", skip(self, task), fields(every = ?schedule.every))]
    pub async fn submit(&self, task: TaskRef, schedule: &Schedule) -> Result<(), OperatorError> {
        debug!("submitting periodic task");
        self.sup
            .submit(to_controller_spec(task, schedule))
            .await
            .map_err(|e| OperatorError::Background(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use taskvisor::{TaskError, TaskFn};
    use tokio_util::sync::CancellationToken;

    #[tokio::test(flavor = "multi_thread")]
    async fn periodic_task_is_rerun_after_success() {
        let runs = Arc::new(AtomicU32::new(0));
        let task = {
            let runs = Arc::clone(&runs);
            TaskFn::arc("test-periodic", move |_ctx: CancellationToken| {
                let runs = Arc::clone(&runs);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), TaskError>(())
                }
            })
        };

        let tasks = BackgroundTasks::start().await;
        tasks
            .submit(task, &Schedule::every(Duration::from_millis(50)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(runs.load(Ordering::SeqCst) >= 2, "runs: {}", runs.load(Ordering::SeqCst));
    }
}
