use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Observed state of a single supervisor watch.
///
/// Derived from the raw `monitor` / `status` pair reported by the supervisor,
/// see [`derive_state`]. `Missing` is never produced by parsing; callers use it
/// when a lookup finds no entry for the requested name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    /// The supervisor has no entry with this name.
    Missing,
    /// Monitoring is initializing (any `monitor` value other than 0 or 1).
    Pending,
    /// Monitored and healthy.
    Running,
    /// Monitored but the status bitmap reports a failure.
    Stopped,
    /// Known to the supervisor but not monitored.
    Unmonitored,
}

impl ProcessState {
    /// Every state except `Missing`.
    pub const PRESENT: [ProcessState; 4] = [
        ProcessState::Running,
        ProcessState::Unmonitored,
        ProcessState::Pending,
        ProcessState::Stopped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Missing => "missing",
            ProcessState::Pending => "pending",
            ProcessState::Running => "running",
            ProcessState::Stopped => "stopped",
            ProcessState::Unmonitored => "unmonitored",
        }
    }

    /// Returns `true` if the supervisor has an entry for the process.
    #[inline]
    pub fn is_present(&self) -> bool {
        !matches!(self, ProcessState::Missing)
    }
}

/// Map the supervisor's raw `(monitored, status)` pair to a [`ProcessState`].
///
/// - `monitored == 0` is `Unmonitored`;
/// - `monitored == 1` is `Running` when `status == 0`, `Stopped` otherwise;
/// - any other `monitored` value is `Pending`.
pub fn derive_state(monitored: i64, status: i64) -> ProcessState {
    match (monitored, status) {
        (0, _) => ProcessState::Unmonitored,
        (1, 0) => ProcessState::Running,
        (1, _) => ProcessState::Stopped,
        _ => ProcessState::Pending,
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessState {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "missing" => Ok(ProcessState::Missing),
            "pending" => Ok(ProcessState::Pending),
            "running" => Ok(ProcessState::Running),
            "stopped" => Ok(ProcessState::Stopped),
            "unmonitored" => Ok(ProcessState::Unmonitored),
            other => Err(ModelError::UnknownState(other.to_string())),
        }
    }
}
