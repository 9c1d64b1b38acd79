use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown process state: {0}")]
    UnknownState(String),

    #[error("unknown monit action: {0}")]
    UnknownAction(String),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid retry budget: {0}")]
    InvalidBudget(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
