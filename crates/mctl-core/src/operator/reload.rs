use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::{
    task::{AbortHandle, JoinHandle},
    time::Instant,
};

use crate::error::OperatorError;

/// Cloneable handle every coalesced caller awaits.
pub(super) type ReloadFuture = Shared<BoxFuture<'static, Result<(), OperatorError>>>;

/// Coalescing state for supervisor reloads.
///
/// At most one reload task exists at a time; callers arriving while it runs
/// attach to its shared future instead of spawning another.
pub(super) struct ReloadWindow {
    last_reload: Instant,
    in_flight: Option<InFlight>,
}

struct InFlight {
    task: AbortHandle,
    fut: ReloadFuture,
}

impl ReloadWindow {
    pub(super) fn new() -> Self {
        Self {
            last_reload: Instant::now(),
            in_flight: None,
        }
    }

    pub(super) fn last_reload(&self) -> Instant {
        self.last_reload
    }

    pub(super) fn mark(&mut self, at: Instant) {
        self.last_reload = at;
    }

    /// Attach to the running reload, or start one with `spawn`.
    ///
    /// Must be called with the window locked; check and replace happen without yielding.
    /// Returns the shared future and whether a new task was started.
    pub(super) fn join_or_start<F>(&mut self, spawn: F) -> (ReloadFuture, bool)
    where
        F: FnOnce() -> JoinHandle<Result<(), OperatorError>>,
    {
        if let Some(current) = &self.in_flight {
            if !current.task.is_finished() {
                return (current.fut.clone(), false);
            }
        }

        let handle = spawn();
        let task = handle.abort_handle();
        let fut = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(OperatorError::Internal(format!("reload task failed: {e}"))))
        }
        .boxed()
        .shared();

        self.in_flight = Some(InFlight {
            task,
            fut: fut.clone(),
        });
        (fut, true)
    }
}
