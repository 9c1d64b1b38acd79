//! Periodic refresh of the cached local offset (DST transitions).
//!
//! The task body runs once per invocation; the task supervisor reruns it
//! every [`TZ_SYNC_INTERVAL`].
use std::time::Duration;

use taskvisor::{TaskError, TaskFn, TaskRef};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::logger::object::sync_local_offset;

/// Delay between two offset refreshes.
pub const TZ_SYNC_INTERVAL: Duration = Duration::from_secs(3600);

/// Bound on a single refresh.
pub const TZ_SYNC_TIMEOUT: Duration = Duration::from_secs(60);

/// Name of the timezone-sync task.
pub const TZ_SYNC_TASK_NAME: &str = "mctl-logger-tz-sync";

/// Build the timezone-sync task body.
///
/// Submit it with a periodic schedule of [`TZ_SYNC_INTERVAL`].
pub fn timezone_sync() -> TaskRef {
    TaskFn::arc(TZ_SYNC_TASK_NAME, |ctx: CancellationToken| async move { sync_once(&ctx) })
}

fn sync_once(ctx: &CancellationToken) -> Result<(), TaskError> {
    if ctx.is_cancelled() {
        return Err(TaskError::Canceled);
    }
    match sync_local_offset() {
        Ok(Some(offset)) => debug!(%offset, "local offset updated"),
        Ok(None) => debug!("local offset unchanged"),
        Err(e) => {
            return Err(TaskError::Fail {
                reason: format!("failed to detect local offset: {e}"),
            });
        }
    }
    Ok(())
}
