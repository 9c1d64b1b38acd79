use std::sync::Arc;

/// Result of a single control command, for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The supervisor accepted the command.
    Success,
    /// The supervisor does not know the process (HTTP 404).
    NotFound,
    /// Any other failure after the retry budget was spent.
    Failure,
}

impl CommandOutcome {
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            CommandOutcome::Success => "success",
            CommandOutcome::NotFound => "not_found",
            CommandOutcome::Failure => "failure",
        }
    }
}

/// Backend metrics collection interface.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record the final outcome of a control command.
    ///
    /// # Arguments
    /// - `action`: command name (`start`, `stop`, ...)
    /// - `outcome`: how the command ended
    fn record_command(&self, action: &str, outcome: CommandOutcome);
    /// Record one reload actually issued to the supervisor.
    ///
    /// Coalesced callers joining an in-flight reload are not counted.
    fn record_reload(&self);
    /// Record one retry of a failed operation.
    ///
    /// # Arguments
    /// - `operation`: retry policy name (`get_entries`, `send_command`, `reload`, ...)
    fn record_retry(&self, operation: &str);
}

/// Shared handle to a metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
