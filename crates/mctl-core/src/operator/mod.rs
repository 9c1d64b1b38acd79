//! Asynchronous façade over the supervisor's HTTP control API.
//!
//! [`MonitOperator`] owns one reload coalescer per supervisor endpoint and is
//! cheap to clone; every clone shares that state. All operations suspend only
//! on I/O and timers.
mod config;
pub use config::OperatorConfig;

mod reload;
use reload::ReloadWindow;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::time::{Instant, sleep, sleep_until, timeout};
use tracing::{debug, info, instrument, trace};

use mctl_model::{MonitAction, ProcessState, RetryBudget};

use crate::{
    error::OperatorError,
    metrics::{CommandOutcome, MetricsHandle},
    retry::RetryPolicy,
    status::parse_entries,
    transport::{HttpTransport, MonitTransport},
};

/// First sleep of the status polling loop.
const POLL_INITIAL: Duration = Duration::from_millis(100);
/// Upper bound of the status polling interval.
const POLL_MAX: Duration = Duration::from_secs(5);
const POLL_FACTOR: f64 = 1.5;
/// Waits shorter than this are logged at trace only.
const POLL_QUIET: Duration = Duration::from_secs(1);

/// Bound on a single observation inside [`MonitOperator::ensure_running`].
const ENSURE_ATTEMPT: Duration = Duration::from_secs(5);
/// Pause between two observations inside [`MonitOperator::ensure_running`].
const ENSURE_SETTLE: Duration = Duration::from_secs(1);

/// Retry bound for `unmonitor`, used while shutting down.
const UNMONITOR_RETRIES: u32 = 5;

/// Handle to the supervisor control plane.
#[derive(Clone)]
pub struct MonitOperator {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn MonitTransport>,
    config: OperatorConfig,
    metrics: MetricsHandle,
    reload: Mutex<ReloadWindow>,
}

impl MonitOperator {
    /// Create an operator over an explicit transport.
    ///
    /// `config`: retry budgets and reload cooldown
    /// `transport`: single-attempt access to the supervisor
    /// `metrics`: command / reload / retry counters
    pub fn new(config: OperatorConfig, transport: Arc<dyn MonitTransport>, metrics: MetricsHandle) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                metrics,
                reload: Mutex::new(ReloadWindow::new()),
            }),
        }
    }

    /// Create an operator talking HTTP to `config.endpoint`.
    pub fn http(config: OperatorConfig, metrics: MetricsHandle) -> Result<Self, OperatorError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, Arc::new(transport), metrics))
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.inner.config
    }

    /// Fetch and parse the status document into `name -> state`.
    ///
    /// Every result is a fresh snapshot; nothing is cached between calls.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_entries(&self) -> Result<HashMap<String, ProcessState>, OperatorError> {
        let transport = &self.inner.transport;
        let entries = self
            .policy("get_entries", self.inner.config.status_retry.clone(), OperatorError::is_retryable)
            .run(|| async {
                let document = transport.fetch_status().await?;
                parse_entries(&document)
            })
            .await?;

        trace!(count = entries.len(), "status snapshot parsed");
        Ok(entries.into_iter().map(|e| (e.name, e.state)).collect())
    }

    /// Send `action` to `process`, retrying everything except [`OperatorError::ProcessNotFound`].
    #[instrument(level = "debug", skip(self), fields(process = %process, action = %action))]
    pub async fn send_command(&self, process: &str, action: MonitAction) -> Result<(), OperatorError> {
        let budget = self.inner.config.command_retry.clone();
        self.command(process, action, budget, OperatorError::is_retryable)
            .await
    }

    /// Like [`MonitOperator::send_command`], but also retries through 404.
    ///
    /// For use right after a reload, while the supervisor may not have registered the process yet.
    #[instrument(level = "debug", skip(self), fields(process = %process, action = %action))]
    pub async fn send_command_retry_process(
        &self,
        process: &str,
        action: MonitAction,
    ) -> Result<(), OperatorError> {
        let budget = self.inner.config.command_retry.clone();
        self.command(process, action, budget, |_: &OperatorError| true)
            .await
    }

    /// Stop monitoring `process` with a small retry count; used on shutdown.
    #[instrument(level = "debug", skip(self), fields(process = %process))]
    pub async fn unmonitor(&self, process: &str) -> Result<(), OperatorError> {
        let budget = self
            .inner
            .config
            .command_retry
            .clone()
            .with_max_retries(Some(UNMONITOR_RETRIES));
        self.command(process, MonitAction::Unmonitor, budget, OperatorError::is_retryable)
            .await
    }

    /// Ask the supervisor to re-read its configuration.
    ///
    /// Concurrent callers share one underlying reload. Issued reloads are spaced
    /// at least `reload_cooldown` apart.
    #[instrument(level = "debug", skip(self))]
    pub async fn reload(&self) -> Result<(), OperatorError> {
        let (fut, started) = {
            let mut window = self.inner.window();
            window.join_or_start(|| {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move { inner.run_reload().await })
            })
        };

        if started {
            debug!("reload task started");
        } else {
            debug!("joined in-flight reload");
        }
        fut.await
    }

    /// Poll until `process` reaches one of `acceptable`, returning the observed state.
    ///
    /// A process absent from the status document counts as [`ProcessState::Missing`].
    /// There is no internal deadline; wrap the call in a timeout when one is needed.
    #[instrument(level = "debug", skip(self, acceptable), fields(process = %process))]
    pub async fn wait_for_status(
        &self,
        process: &str,
        acceptable: &[ProcessState],
    ) -> Result<ProcessState, OperatorError> {
        let start = Instant::now();
        let mut backoff = POLL_INITIAL;

        loop {
            let entries = self.get_entries().await?;
            let state = entries
                .get(process)
                .copied()
                .unwrap_or(ProcessState::Missing);
            if acceptable.contains(&state) {
                return Ok(state);
            }

            let waited = start.elapsed();
            if waited > POLL_QUIET {
                info!(
                    state = %state,
                    waited_ms = waited.as_millis() as u64,
                    next_poll_ms = backoff.as_millis() as u64,
                    "waiting for process state"
                );
            } else {
                trace!(state = %state, "process not in acceptable state yet");
            }

            sleep(backoff).await;
            backoff = backoff.mul_f64(POLL_FACTOR).min(POLL_MAX);
        }
    }

    /// Drive `process` toward [`ProcessState::Running`].
    ///
    /// An unmonitored process is sent `start`; pending, stopped or missing ones
    /// are only re-observed. Loops until `Running` is seen.
    #[instrument(level = "debug", skip(self), fields(process = %process))]
    pub async fn ensure_running(&self, process: &str) -> Result<(), OperatorError> {
        loop {
            match timeout(ENSURE_ATTEMPT, self.wait_for_status(process, &ProcessState::PRESENT)).await {
                Ok(Ok(ProcessState::Running)) => {
                    info!("process is running");
                    return Ok(());
                }
                Ok(Ok(ProcessState::Unmonitored)) => {
                    info!("process is unmonitored, sending start");
                    self.send_command(process, MonitAction::Start).await?;
                }
                Ok(Ok(state)) => debug!(state = %state, "process is not running yet"),
                Ok(Err(e)) => return Err(e),
                Err(_) => debug!(
                    timeout_ms = ENSURE_ATTEMPT.as_millis() as u64,
                    "process did not appear in status"
                ),
            }
            sleep(ENSURE_SETTLE).await;
        }
    }

    async fn command<P>(
        &self,
        process: &str,
        action: MonitAction,
        budget: RetryBudget,
        retry_on: P,
    ) -> Result<(), OperatorError>
    where
        P: Fn(&OperatorError) -> bool,
    {
        let transport = &self.inner.transport;
        let result = self
            .policy("send_command", budget, retry_on)
            .run(|| transport.post_action(process, action))
            .await;

        let outcome = match &result {
            Ok(()) => CommandOutcome::Success,
            Err(e) if e.is_not_found() => CommandOutcome::NotFound,
            Err(_) => CommandOutcome::Failure,
        };
        self.inner.metrics.record_command(action.as_str(), outcome);

        if result.is_ok() {
            info!(process, action = %action, "command accepted");
        }
        result
    }

    fn policy<P>(&self, operation: &'static str, budget: RetryBudget, retry_on: P) -> RetryPolicy<P> {
        RetryPolicy::new(operation, budget, retry_on).with_metrics(self.inner.metrics.clone())
    }
}

impl Inner {
    fn window(&self) -> MutexGuard<'_, ReloadWindow> {
        self.reload.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Body of the reload task. Each attempt honors the cooldown.
    async fn run_reload(&self) -> Result<(), OperatorError> {
        let cooldown = self.config.reload_cooldown();
        let this = self;

        RetryPolicy::new("reload", self.config.reload_retry.clone(), OperatorError::is_command_failure)
            .with_metrics(self.metrics.clone())
            .run(move || async move {
                let not_before = this.window().last_reload() + cooldown;
                sleep_until(not_before).await;
                this.window().mark(Instant::now());

                this.metrics.record_reload();
                info!("reloading supervisor configuration");
                this.transport.reload().await
            })
            .await
    }
}

impl std::fmt::Debug for MonitOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitOperator")
            .field("config", &self.inner.config)
            .finish()
    }
}
