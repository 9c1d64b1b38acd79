use thiserror::Error;

/// Failures surfaced by the supervisor operator.
///
/// The variant set is closed so retry predicates can match on it directly.
/// `Clone` lets every caller joined on a coalesced reload observe the same outcome.
#[derive(Debug, Clone, Error)]
pub enum OperatorError {
    #[error("process not found: {0} is not monitored")]
    ProcessNotFound(String),

    #[error("supervisor is not accepting commands: {0}")]
    Unavailable(String),

    #[error("supervisor returned HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed status document: {0}")]
    MalformedStatus(String),

    #[error("command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("io error: {0}")]
    Io(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("background task rejected: {0}")]
    Background(String),
}

impl OperatorError {
    /// Default retry predicate: everything except `ProcessNotFound`.
    ///
    /// A 404 means the watch is not registered; retrying the same request
    /// cannot fix that.
    pub fn is_retryable(&self) -> bool {
        !self.is_not_found()
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, OperatorError::ProcessNotFound(_))
    }

    /// Retry predicate for subprocess invocations: only a failed command run.
    pub fn is_command_failure(&self) -> bool {
        matches!(self, OperatorError::CommandFailed { .. })
    }
}

impl From<std::io::Error> for OperatorError {
    fn from(e: std::io::Error) -> Self {
        OperatorError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for OperatorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            return OperatorError::Unavailable(e.to_string());
        }
        match e.status() {
            Some(status) => OperatorError::Http {
                status: status.as_u16(),
                reason: e.to_string(),
            },
            None => OperatorError::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OperatorError;

    #[test]
    fn not_found_is_the_only_non_retryable_error() {
        assert!(!OperatorError::ProcessNotFound("ghost".into()).is_retryable());
        assert!(OperatorError::Unavailable("refused".into()).is_retryable());
        assert!(OperatorError::Transport("reset".into()).is_retryable());
        assert!(OperatorError::Http { status: 500, reason: "boom".into() }.is_retryable());
        assert!(OperatorError::MalformedStatus("eof".into()).is_retryable());
    }

    #[test]
    fn command_failure_predicate() {
        let failed = OperatorError::CommandFailed {
            command: "monit reload".into(),
            reason: "exit status 1".into(),
        };
        assert!(failed.is_command_failure());
        assert!(!OperatorError::Io("enoent".into()).is_command_failure());
    }

    #[test]
    fn display_names_the_process() {
        let err = OperatorError::ProcessNotFound("ghost-proc".into());
        assert_eq!(err.to_string(), "process not found: ghost-proc is not monitored");
    }
}
