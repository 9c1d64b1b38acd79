use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use mctl_core::OperatorConfig;
use mctl_exec::CliConfig;
use mctl_model::ProcessDescriptor;
use mctl_observe::LoggerConfig;

/// Variable naming the agent configuration file.
pub const ENV_AGENT_CONFIG: &str = "MCTL_AGENT_CONFIG";

/// What happens to managed processes when the agent exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownMode {
    /// Leave them to the supervisor.
    #[default]
    Keep,
    /// Stop monitoring them; processes keep running.
    Unmonitor,
    /// Stop every configured group through the command line.
    Stop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    pub logger: LoggerConfig,
    pub operator: OperatorConfig,
    pub cli: CliConfig,
    /// Directory the supervisor includes entries from.
    pub config_dir: PathBuf,
    /// Entry files are named `<prefix>-<watch>.cfg`.
    pub config_prefix: String,
    pub processes: Vec<ProcessDescriptor>,
    /// Deadline for a process to reach running at startup.
    pub ensure_timeout_secs: u64,
    pub reconcile_interval_secs: u64,
    /// Serve `/metrics` on this address when set.
    pub metrics_addr: Option<SocketAddr>,
    pub shutdown: ShutdownMode,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            logger: LoggerConfig::default(),
            operator: OperatorConfig::default(),
            cli: CliConfig::default(),
            config_dir: PathBuf::from("/etc/monit/conf.d"),
            config_prefix: "mctl".to_string(),
            processes: Vec::new(),
            ensure_timeout_secs: 180,
            reconcile_interval_secs: 30,
            metrics_addr: None,
            shutdown: ShutdownMode::default(),
        }
    }
}

impl AgentConfig {
    /// Load the file named by `MCTL_AGENT_CONFIG`, or defaults when unset.
    ///
    /// Logger settings from the environment override the file.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var_os(ENV_AGENT_CONFIG) {
            Some(path) => Self::from_path(Path::new(&path))?,
            None => Self::default(),
        };
        cfg.logger = cfg.logger.overlay(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let cfg: Self = serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Retry budgets and descriptors must be valid and watch names unique.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.operator.validate().context("operator")?;
        self.cli.retry.validate().context("cli")?;

        let mut seen = std::collections::HashSet::new();
        for p in &self.processes {
            p.validate().with_context(|| format!("process {}", p.full_name()))?;
            anyhow::ensure!(seen.insert(p.full_name()), "duplicate process {}", p.full_name());
        }
        Ok(())
    }

    pub fn ensure_timeout(&self) -> Duration {
        Duration::from_secs(self.ensure_timeout_secs)
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "configDir": "/tmp/mctl",
        "processes": [
            {
                "name": "app___guestbook",
                "port": 8080,
                "startCommand": "/opt/appserver/run --port 8080",
                "stopCommand": "/bin/kill -TERM 1",
                "pidfile": "/var/run/guestbook-8080.pid",
                "maxMemoryMb": 400
            }
        ],
        "shutdown": "unmonitor",
        "operator": { "reloadCooldownMs": 2000 }
    }"#;

    #[test]
    fn loads_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let cfg = AgentConfig::from_path(&path).unwrap();
        assert_eq!(cfg.config_dir, PathBuf::from("/tmp/mctl"));
        assert_eq!(cfg.config_prefix, "mctl");
        assert_eq!(cfg.processes[0].full_name(), "app___guestbook-8080");
        assert_eq!(cfg.processes[0].group, "mctl");
        assert_eq!(cfg.shutdown, ShutdownMode::Unmonitor);
        assert_eq!(cfg.operator.reload_cooldown_ms, 2000);
        assert_eq!(cfg.reconcile_interval(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_duplicate_watches() {
        let mut cfg: AgentConfig = serde_json::from_str(SAMPLE).unwrap();
        cfg.processes.push(cfg.processes[0].clone());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_negative_backoff_factor() {
        let mut cfg: AgentConfig = serde_json::from_str(r#"{"operator": {"statusRetry": {"factor": -2.0}}}"#).unwrap();
        assert!(cfg.validate().is_err());

        cfg.operator.status_retry.factor = 1.5;
        cfg.cli.retry.factor = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_invalid_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        std::fs::write(&path, SAMPLE.replace("/bin/kill -TERM 1", "")).unwrap();
        assert!(AgentConfig::from_path(&path).is_err());
    }
}
