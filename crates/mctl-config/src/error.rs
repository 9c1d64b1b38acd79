use thiserror::Error;

/// Failures reported by a [`crate::ConfigStore`].
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("connection to the config store lost")]
    ConnectionLoss,

    #[error("no node at {0}")]
    NoNode(String),

    #[error("config store error: {0}")]
    Other(String),
}

impl StoreError {
    #[inline]
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, StoreError::ConnectionLoss)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("deployment configuration is inaccessible")]
    ConfigInaccessible,

    #[error(transparent)]
    Store(#[from] StoreError),
}
