use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use mctl_core::RetryPolicy;
use mctl_model::{DEFAULT_MONIT_BIN, RetryBudget};

use crate::{
    error::ExecError,
    runner::{CommandRunner, SystemRunner},
    security::is_watch_secure,
};

/// Settings of the blocking command-line wrapper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CliConfig {
    pub monit_bin: PathBuf,
    pub retry: RetryBudget,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            monit_bin: PathBuf::from(DEFAULT_MONIT_BIN),
            retry: RetryBudget::cli(),
        }
    }
}

/// Blocking wrapper around the supervisor's command line.
///
/// Every call blocks the current thread until the subprocess exits and may
/// sleep between retries; call it from a blocking worker, never from an
/// async runtime thread. Results are plain booleans: failures are logged here
/// and the caller only decides whether a failed step is fatal.
#[derive(Debug, Clone)]
pub struct MonitCli<R = SystemRunner> {
    config: CliConfig,
    runner: R,
}

impl MonitCli<SystemRunner> {
    pub fn new(config: CliConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> MonitCli<R> {
    /// Create a wrapper executing commands through `runner`.
    pub fn with_runner(config: CliConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Reload, then monitor and start `watch`.
    ///
    /// `true` only if every step succeeded; a failed step skips the remaining ones.
    pub fn start(&self, watch: &str, is_group: bool) -> bool {
        if !Self::secure(watch) {
            return false;
        }

        info!("reloading supervisor");
        if !self.safe_run(&["reload"]) {
            return false;
        }

        info!(watch, is_group, "starting watch");
        self.safe_run(&scoped("monitor", watch, is_group)) && self.safe_run(&scoped("start", watch, is_group))
    }

    /// Stop `watch` (or the group named `watch`).
    pub fn stop(&self, watch: &str, is_group: bool) -> bool {
        if !Self::secure(watch) {
            return false;
        }

        info!(watch, is_group, "stopping watch");
        self.safe_run(&scoped("stop", watch, is_group))
    }

    /// Restart every process in the group named `watch`.
    pub fn restart(&self, watch: &str) -> bool {
        if !Self::secure(watch) {
            return false;
        }

        info!(watch, "restarting watch group");
        self.safe_run(&scoped("restart", watch, true))
    }

    /// Ask the supervisor to re-read its configuration, without coalescing.
    pub fn reload(&self) -> bool {
        self.safe_run(&["reload"])
    }

    fn secure(watch: &str) -> bool {
        let ok = is_watch_secure(watch);
        if !ok {
            error!(error = %ExecError::InsecureWatch(watch.to_string()), "rejected watch");
        }
        ok
    }

    fn safe_run(&self, args: &[&str]) -> bool {
        match self.run(args) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "supervisor command failed");
                false
            }
        }
    }

    /// Run one control command, retrying transient failures within the configured budget.
    fn run(&self, args: &[&str]) -> Result<(), ExecError> {
        let bin = &self.config.monit_bin;
        RetryPolicy::new("monit_cli", self.config.retry.clone(), ExecError::is_transient).run_blocking(
            || {
                let command = format!("{} {}", bin.display(), args.join(" "));
                match self.runner.status(bin, args) {
                    Ok(Some(0)) => Ok(()),
                    Ok(Some(code)) => Err(ExecError::NonZeroStatus {
                        command,
                        status: code.to_string(),
                    }),
                    Ok(None) => Err(ExecError::NonZeroStatus {
                        command,
                        status: "terminated by signal".into(),
                    }),
                    Err(source) => Err(ExecError::Spawn { command, source }),
                }
            },
        )
    }
}

fn scoped<'a>(verb: &'a str, watch: &'a str, is_group: bool) -> Vec<&'a str> {
    if is_group {
        vec![verb, "-g", watch]
    } else {
        vec![verb, watch]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        collections::VecDeque,
        path::Path,
        sync::Mutex,
        time::Duration,
    };

    /// Records invocations and replays scripted exit codes (0 once exhausted).
    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<Vec<String>>>,
        codes: Mutex<VecDeque<i32>>,
    }

    impl Recording {
        fn failing(codes: &[i32]) -> Self {
            Self {
                codes: Mutex::new(codes.iter().copied().collect()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for &Recording {
        fn status(&self, _: &Path, args: &[&str]) -> std::io::Result<Option<i32>> {
            self.calls
                .lock()
                .unwrap()
                .push(args.iter().map(|a| a.to_string()).collect());
            Ok(Some(self.codes.lock().unwrap().pop_front().unwrap_or(0)))
        }
    }

    fn fast() -> CliConfig {
        CliConfig {
            retry: RetryBudget::default()
                .with_timeout(Duration::from_millis(200))
                .with_first(Duration::from_millis(1))
                .with_factor(1.0),
            ..CliConfig::default()
        }
    }

    fn argv(calls: &[&[&str]]) -> Vec<Vec<String>> {
        calls
            .iter()
            .map(|c| c.iter().map(|a| a.to_string()).collect())
            .collect()
    }

    #[test]
    fn start_group_reloads_monitors_and_starts() {
        let runner = Recording::default();
        let cli = MonitCli::with_runner(fast(), &runner);

        assert!(cli.start("app___guestbook", true));
        assert_eq!(
            runner.calls(),
            argv(&[
                &["reload"],
                &["monitor", "-g", "app___guestbook"],
                &["start", "-g", "app___guestbook"],
            ])
        );
    }

    #[test]
    fn stop_single_watch_is_not_group_scoped() {
        let runner = Recording::default();
        let cli = MonitCli::with_runner(fast(), &runner);

        assert!(cli.stop("app___guestbook-8080", false));
        assert_eq!(runner.calls(), argv(&[&["stop", "app___guestbook-8080"]]));
    }

    #[test]
    fn restart_is_always_group_scoped() {
        let runner = Recording::default();
        let cli = MonitCli::with_runner(fast(), &runner);

        assert!(cli.restart("mctl"));
        assert_eq!(runner.calls(), argv(&[&["restart", "-g", "mctl"]]));
    }

    #[test]
    fn insecure_watch_spawns_nothing() {
        let runner = Recording::default();
        let cli = MonitCli::with_runner(fast(), &runner);

        assert!(!cli.start("; rm -rf /", true));
        assert!(!cli.stop("; rm -rf /", false));
        assert!(!cli.restart("$(reboot)"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn busy_supervisor_is_retried() {
        let runner = Recording::failing(&[1, 1]);
        let cli = MonitCli::with_runner(fast(), &runner);

        assert!(cli.reload());
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn failed_reload_aborts_start() {
        let runner = Recording::failing(&[1; 10_000]);
        let cli = MonitCli::with_runner(fast(), &runner);

        assert!(!cli.start("mctl", true));
        assert!(runner.calls().iter().all(|c| c == &["reload"]));
    }

    #[test]
    fn failed_monitor_fails_start() {
        struct MonitorFails(Mutex<Vec<String>>);

        impl CommandRunner for &MonitorFails {
            fn status(&self, _: &Path, args: &[&str]) -> std::io::Result<Option<i32>> {
                self.0.lock().unwrap().push(args[0].to_string());
                Ok(Some(if args[0] == "monitor" { 1 } else { 0 }))
            }
        }

        let runner = MonitorFails(Mutex::new(Vec::new()));
        let cli = MonitCli::with_runner(fast(), &runner);

        assert!(!cli.start("app___guestbook", true));
        let verbs = runner.0.lock().unwrap().clone();
        assert!(verbs.iter().filter(|v| *v == "monitor").count() > 1, "monitor is retried");
        assert!(!verbs.iter().any(|v| v == "start"), "start must not run after a failed monitor");
    }

    #[test]
    fn config_defaults_match_cli_budget() {
        let cfg: CliConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.monit_bin, PathBuf::from("/usr/bin/monit"));
        assert_eq!(cfg.retry, RetryBudget::cli());
    }
}
