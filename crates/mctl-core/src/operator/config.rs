use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use mctl_model::{DEFAULT_MONIT_BIN, DEFAULT_MONIT_ENDPOINT, ModelResult, RetryBudget};

/// Static settings of a [`super::MonitOperator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorConfig {
    /// Base URL of the supervisor HTTP API.
    pub endpoint: String,
    /// Control binary used for reloads.
    pub monit_bin: PathBuf,
    /// Minimum spacing between two issued reloads.
    pub reload_cooldown_ms: u64,
    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,
    pub status_retry: RetryBudget,
    pub command_retry: RetryBudget,
    pub reload_retry: RetryBudget,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MONIT_ENDPOINT.to_string(),
            monit_bin: PathBuf::from(DEFAULT_MONIT_BIN),
            reload_cooldown_ms: 1_000,
            request_timeout_ms: 10_000,
            status_retry: RetryBudget::default(),
            command_retry: RetryBudget::default(),
            reload_retry: RetryBudget::default(),
        }
    }
}

impl OperatorConfig {
    pub fn reload_cooldown(&self) -> Duration {
        Duration::from_millis(self.reload_cooldown_ms)
    }

    /// Check every retry budget.
    pub fn validate(&self) -> ModelResult<()> {
        self.status_retry.validate()?;
        self.command_retry.validate()?;
        self.reload_retry.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: OperatorConfig = serde_json::from_str(
            r#"{"endpoint": "http://127.0.0.1:9999", "commandRetry": {"maxRetries": 5}}"#,
        )
        .unwrap();

        assert_eq!(cfg.endpoint, "http://127.0.0.1:9999");
        assert_eq!(cfg.monit_bin, PathBuf::from("/usr/bin/monit"));
        assert_eq!(cfg.reload_cooldown(), Duration::from_secs(1));
        assert_eq!(cfg.command_retry.max_retries, Some(5));
        assert_eq!(cfg.command_retry.timeout_ms, 60_000);
    }
}
