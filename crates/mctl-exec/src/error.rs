use thiserror::Error;

use mctl_model::ModelError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("watch string [{0}] is a possible security violation")]
    InsecureWatch(String),

    #[error("command `{command}` returned non-zero status: {status}")]
    NonZeroStatus { command: String, status: String },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    InvalidDescriptor(#[from] ModelError),
}

impl ExecError {
    /// Failures worth another attempt: the control binary may be busy or briefly absent.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExecError::NonZeroStatus { .. } | ExecError::Spawn { .. })
    }
}
