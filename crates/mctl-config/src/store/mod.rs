//! Seam over the hierarchical config store (ZooKeeper-like).
mod memory;
pub use memory::MemoryStore;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::error::StoreError;

/// Session state of the store connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    /// Temporarily disconnected; the session may still recover.
    Suspended,
    /// Session expired.
    Lost,
}

impl ConnectionState {
    /// `true` when local data can no longer be trusted as current.
    #[inline]
    pub fn is_degraded(&self) -> bool {
        !matches!(self, ConnectionState::Connected)
    }
}

/// Hierarchical key-value store with change notification.
///
/// Watches deliver the current value first, then every change, until the
/// receiver is dropped.
#[async_trait]
pub trait ConfigStore: Send + Sync + 'static {
    /// Create `path` and any missing ancestors.
    async fn ensure_path(&self, path: &str) -> Result<(), StoreError>;

    /// Payload of `path`, `None` if the node does not exist.
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Names of the direct children of `path`.
    async fn children(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Child listings of `path`.
    async fn watch_children(&self, path: &str) -> Result<mpsc::UnboundedReceiver<Vec<String>>, StoreError>;

    /// Payloads of `path`; `None` means the node was deleted.
    async fn watch_data(&self, path: &str) -> Result<mpsc::UnboundedReceiver<Option<Vec<u8>>>, StoreError>;

    /// Connection state updates.
    fn connection_state(&self) -> watch::Receiver<ConnectionState>;
}

/// Join a parent path and a child name.
pub(crate) fn child_path(parent: &str, name: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), name)
}
