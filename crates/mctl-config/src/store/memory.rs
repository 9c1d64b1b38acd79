use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tracing::trace;

use super::{ConfigStore, ConnectionState};
use crate::error::StoreError;

/// In-process [`ConfigStore`].
///
/// Operations fail with [`StoreError::ConnectionLoss`] while the simulated
/// connection is not [`ConnectionState::Connected`].
pub struct MemoryStore {
    state: Mutex<Nodes>,
    connection: watch::Sender<ConnectionState>,
}

#[derive(Default)]
struct Nodes {
    data: BTreeMap<String, Vec<u8>>,
    child_watchers: HashMap<String, Vec<mpsc::UnboundedSender<Vec<String>>>>,
    data_watchers: HashMap<String, Vec<mpsc::UnboundedSender<Option<Vec<u8>>>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Nodes::default()),
            connection: watch::Sender::new(ConnectionState::Connected),
        }
    }

    /// Create or replace the payload of `path`, creating ancestors as needed.
    pub fn set_data(&self, path: &str, payload: impl Into<Vec<u8>>) {
        let payload = payload.into();
        let mut nodes = self.nodes();
        nodes.create_ancestors(path);

        let created = nodes.data.insert(path.to_string(), payload.clone()).is_none();
        trace!(path, created, "node written");

        nodes.notify_data(path, Some(payload));
        if created {
            if let Some(parent) = parent_of(path) {
                nodes.notify_children(parent);
            }
        }
    }

    /// Delete `path` and everything below it.
    pub fn delete(&self, path: &str) {
        let mut nodes = self.nodes();
        let prefix = format!("{path}/");
        let removed: Vec<String> = nodes
            .data
            .keys()
            .filter(|k| *k == path || k.starts_with(&prefix))
            .cloned()
            .collect();
        if removed.is_empty() {
            return;
        }
        for key in &removed {
            nodes.data.remove(key);
            nodes.notify_data(key, None);
        }
        if let Some(parent) = parent_of(path) {
            nodes.notify_children(parent);
        }
    }

    /// Drop every data watch registered on `path`, as a session expiry would.
    pub fn drop_watches(&self, path: &str) {
        self.nodes().data_watchers.remove(path);
    }

    /// Simulate a session transition.
    pub fn set_connection_state(&self, state: ConnectionState) {
        self.connection.send_replace(state);
    }

    fn nodes(&self) -> MutexGuard<'_, Nodes> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_connected(&self) -> Result<(), StoreError> {
        if self.connection.borrow().is_degraded() {
            return Err(StoreError::ConnectionLoss);
        }
        Ok(())
    }
}

impl Nodes {
    fn create_ancestors(&mut self, path: &str) {
        let mut current = parent_of(path);
        while let Some(p) = current {
            if p.is_empty() {
                break;
            }
            if !self.data.contains_key(p) {
                self.data.insert(p.to_string(), Vec::new());
                if let Some(grand) = parent_of(p) {
                    self.notify_children(grand);
                }
            }
            current = parent_of(p);
        }
    }

    fn children_of(&self, path: &str) -> Vec<String> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.data
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(str::to_string)
            .collect()
    }

    fn notify_children(&mut self, path: &str) {
        let listing = self.children_of(path);
        if let Some(watchers) = self.child_watchers.get_mut(path) {
            watchers.retain(|tx| tx.send(listing.clone()).is_ok());
        }
    }

    fn notify_data(&mut self, path: &str, payload: Option<Vec<u8>>) {
        if let Some(watchers) = self.data_watchers.get_mut(path) {
            watchers.retain(|tx| tx.send(payload.clone()).is_ok());
        }
    }
}

fn parent_of(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn ensure_path(&self, path: &str) -> Result<(), StoreError> {
        self.check_connected()?;
        let mut nodes = self.nodes();
        if !nodes.data.contains_key(path) {
            nodes.create_ancestors(path);
            nodes.data.insert(path.to_string(), Vec::new());
            if let Some(parent) = parent_of(path) {
                nodes.notify_children(parent);
            }
        }
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_connected()?;
        Ok(self.nodes().data.get(path).cloned())
    }

    async fn children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.check_connected()?;
        let nodes = self.nodes();
        if !nodes.data.contains_key(path) {
            return Err(StoreError::NoNode(path.to_string()));
        }
        Ok(nodes.children_of(path))
    }

    async fn watch_children(&self, path: &str) -> Result<mpsc::UnboundedReceiver<Vec<String>>, StoreError> {
        self.check_connected()?;
        let mut nodes = self.nodes();
        if !nodes.data.contains_key(path) {
            return Err(StoreError::NoNode(path.to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(nodes.children_of(path));
        nodes.child_watchers.entry(path.to_string()).or_default().push(tx);
        Ok(rx)
    }

    async fn watch_data(&self, path: &str) -> Result<mpsc::UnboundedReceiver<Option<Vec<u8>>>, StoreError> {
        self.check_connected()?;
        let mut nodes = self.nodes();
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(nodes.data.get(path).cloned());
        nodes.data_watchers.entry(path.to_string()).or_default().push(tx);
        Ok(rx)
    }

    fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn watches_deliver_current_value_then_changes() {
        let store = MemoryStore::new();
        store.ensure_path("/mctl/config").await.unwrap();

        let mut children = store.watch_children("/mctl/config").await.unwrap();
        assert_eq!(children.recv().await.unwrap(), Vec::<String>::new());

        let mut data = store.watch_data("/mctl/config/db").await.unwrap();
        assert_eq!(data.recv().await.unwrap(), None);

        store.set_data("/mctl/config/db", r#"{"replicas": 3}"#);
        assert_eq!(children.recv().await.unwrap(), vec!["db".to_string()]);
        assert_eq!(data.recv().await.unwrap().as_deref(), Some(br#"{"replicas": 3}"#.as_slice()));

        store.delete("/mctl/config/db");
        assert_eq!(data.recv().await.unwrap(), None);
        assert!(children.recv().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn operations_fail_while_disconnected() {
        let store = MemoryStore::new();
        store.set_connection_state(ConnectionState::Suspended);
        assert!(matches!(store.ensure_path("/a").await, Err(StoreError::ConnectionLoss)));

        store.set_connection_state(ConnectionState::Connected);
        store.ensure_path("/a/b").await.unwrap();
        assert_eq!(store.children("/a").await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn listing_only_reports_direct_children() {
        let store = MemoryStore::new();
        store.set_data("/root/a", "{}");
        store.set_data("/root/a/nested", "{}");
        store.set_data("/root/b", "{}");
        assert_eq!(store.children("/root").await.unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
