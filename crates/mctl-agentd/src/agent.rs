use std::{collections::BTreeSet, sync::Arc, time::Duration};

use futures_util::future::join_all;
use taskvisor::{TaskError, TaskFn, TaskRef};
use tokio::{sync::Mutex, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use mctl_core::{MonitOperator, OperatorError};
use mctl_exec::{ConfigWriter, MonitCli};
use mctl_model::{MonitAction, ProcessDescriptor, ProcessState};

use crate::config::{AgentConfig, ShutdownMode};

/// Name of the periodic reconcile task.
pub const RECONCILE_TASK_NAME: &str = "mctl-reconcile";

/// Keeps the configured processes registered and running.
pub struct Agent {
    operator: MonitOperator,
    writer: ConfigWriter,
    cli: MonitCli,
    processes: Vec<ProcessDescriptor>,
    ensure_timeout: Duration,
    reconcile_every: Duration,
    shutdown: ShutdownMode,
    /// Set once shutdown starts; reconcile passes become no-ops.
    stopping: CancellationToken,
    /// Held for a whole reconcile pass and by shutdown.
    pass: Mutex<()>,
}

impl Agent {
    pub fn new(cfg: &AgentConfig, operator: MonitOperator) -> Self {
        Self {
            operator,
            writer: ConfigWriter::new(&cfg.config_dir, cfg.config_prefix.clone()),
            cli: MonitCli::new(cfg.cli.clone()),
            processes: cfg.processes.clone(),
            ensure_timeout: cfg.ensure_timeout(),
            reconcile_every: cfg.reconcile_interval(),
            shutdown: cfg.shutdown,
            stopping: CancellationToken::new(),
            pass: Mutex::new(()),
        }
    }

    pub fn reconcile_every(&self) -> Duration {
        self.reconcile_every
    }

    /// Write every entry file, reload once, then start each process and wait for it to run.
    ///
    /// The start right after the reload tolerates a process the supervisor has
    /// not registered yet. A process that misses its deadline is logged; it is
    /// picked up again by the reconcile task.
    #[instrument(level = "debug", skip(self), fields(processes = self.processes.len()))]
    pub async fn bootstrap(&self) -> anyhow::Result<()> {
        for p in &self.processes {
            let path = self.writer.write(p)?;
            debug!(process = %p.full_name(), path = %path.display(), "entry written");
        }
        self.operator.reload().await?;

        let waits = self.processes.iter().map(|p| async move {
            let name = p.full_name();
            let started = async {
                self.operator.send_command_retry_process(&name, MonitAction::Start).await?;
                self.operator.ensure_running(&name).await
            };
            match timeout(self.ensure_timeout, started).await {
                Ok(Ok(())) => info!(process = %name, "process running"),
                Ok(Err(e)) => error!(process = %name, error = %e, "failed to start process"),
                Err(_) => warn!(process = %name, timeout = ?self.ensure_timeout, "process did not reach running in time"),
            }
        });
        join_all(waits).await;
        Ok(())
    }

    /// One pass over the status document.
    ///
    /// Unmonitored processes are started again; missing ones are re-registered.
    /// Returns the number of corrective actions taken.
    #[instrument(level = "debug", skip(self))]
    pub async fn reconcile_once(&self) -> Result<usize, OperatorError> {
        let _pass = self.pass.lock().await;
        if self.stopping.is_cancelled() {
            return Ok(0);
        }
        let entries = self.operator.get_entries().await?;
        let mut actions = 0;
        let mut reload = false;

        for p in &self.processes {
            let name = p.full_name();
            match entries.get(&name).copied().unwrap_or(ProcessState::Missing) {
                ProcessState::Unmonitored => {
                    info!(process = %name, "process unmonitored, starting");
                    match self.operator.send_command(&name, MonitAction::Start).await {
                        Ok(()) => actions += 1,
                        Err(e) => warn!(process = %name, error = %e, "start failed"),
                    }
                }
                ProcessState::Missing => {
                    warn!(process = %name, "process not registered, rewriting entry");
                    match self.writer.write(p) {
                        Ok(_) => reload = true,
                        Err(e) => error!(process = %name, error = %e, "failed to write entry"),
                    }
                }
                _ => {}
            }
        }

        if reload {
            self.operator.reload().await?;
            actions += 1;
        }
        Ok(actions)
    }

    /// Task body running one reconcile pass per invocation.
    ///
    /// Submit it with a periodic schedule of [`Agent::reconcile_every`].
    pub fn reconcile_task(self: &Arc<Self>) -> TaskRef {
        let agent = Arc::clone(self);
        TaskFn::arc(RECONCILE_TASK_NAME, move |ctx: CancellationToken| {
            let agent = Arc::clone(&agent);
            async move { agent.reconcile_tick(&ctx).await }
        })
    }

    async fn reconcile_tick(&self, ctx: &CancellationToken) -> Result<(), TaskError> {
        tokio::select! {
            _ = ctx.cancelled() => Err(TaskError::Canceled),
            out = self.reconcile_once() => match out {
                Ok(actions) => {
                    debug!(actions, "reconcile pass done");
                    Ok(())
                }
                Err(e) => Err(TaskError::Fail {
                    reason: format!("reconcile failed: {e}"),
                }),
            },
        }
    }

    /// Stop reconciling, wait for a running pass, then apply the configured shutdown mode.
    #[instrument(level = "debug", skip(self), fields(mode = ?self.shutdown))]
    pub async fn shutdown(&self) {
        self.stopping.cancel();
        let _pass = self.pass.lock().await;

        match self.shutdown {
            ShutdownMode::Keep => {}
            ShutdownMode::Unmonitor => {
                for p in &self.processes {
                    let name = p.full_name();
                    if let Err(e) = self.operator.unmonitor(&name).await {
                        warn!(process = %name, error = %e, "unmonitor failed");
                    }
                }
            }
            ShutdownMode::Stop => {
                let groups: BTreeSet<String> = self.processes.iter().map(|p| p.group.clone()).collect();
                let cli = self.cli.clone();
                let stopped = tokio::task::spawn_blocking(move || {
                    groups.into_iter().filter(|g| !cli.stop(g, true)).count()
                })
                .await;
                match stopped {
                    Ok(0) => info!("all groups stopped"),
                    Ok(failed) => warn!(failed, "some groups failed to stop"),
                    Err(e) => error!(error = %e, "stop worker panicked"),
                }
            }
        }
    }
}
