use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Command accepted by the supervisor's per-process control endpoint.
///
/// Sent as the `action` form field of `POST /<process>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitAction {
    Start,
    Stop,
    Restart,
    Monitor,
    Unmonitor,
}

impl MonitAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitAction::Start => "start",
            MonitAction::Stop => "stop",
            MonitAction::Restart => "restart",
            MonitAction::Monitor => "monitor",
            MonitAction::Unmonitor => "unmonitor",
        }
    }
}

impl fmt::Display for MonitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitAction {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(MonitAction::Start),
            "stop" => Ok(MonitAction::Stop),
            "restart" => Ok(MonitAction::Restart),
            "monitor" => Ok(MonitAction::Monitor),
            "unmonitor" => Ok(MonitAction::Unmonitor),
            other => Err(ModelError::UnknownAction(other.to_string())),
        }
    }
}
