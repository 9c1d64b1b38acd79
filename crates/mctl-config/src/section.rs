use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{error::StoreError, store::ConfigStore};

/// What a data watch does after handling one payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchControl {
    Continue,
    /// Stop watching; only an explicit re-arm starts a new watch.
    Stop,
}

/// Local copy of one configuration node.
///
/// `data` is only ever replaced by a successfully parsed JSON object; invalid
/// payloads keep the previous value.
#[derive(Debug)]
pub struct DeploymentConfigSection {
    name: String,
    path: String,
    state: Mutex<SectionState>,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct SectionState {
    data: Map<String, Value>,
    watch_active: bool,
}

impl DeploymentConfigSection {
    pub(crate) fn new(name: impl Into<String>, path: impl Into<String>, parent: &CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            path: path.into(),
            state: Mutex::new(SectionState::default()),
            cancel: parent.child_token(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the last good payload.
    pub fn data(&self) -> Map<String, Value> {
        self.state().data.clone()
    }

    pub fn is_watch_active(&self) -> bool {
        self.state().watch_active
    }

    /// Apply one payload delivered by the data watch.
    ///
    /// `None` (node deleted) deactivates the watch. A payload that is not a JSON
    /// object is logged and ignored.
    pub fn on_data(&self, payload: Option<&[u8]>) -> WatchControl {
        let Some(bytes) = payload else {
            info!(section = %self.name, "section node deleted, stopping watch");
            self.state().watch_active = false;
            return WatchControl::Stop;
        };

        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(data)) => {
                debug!(section = %self.name, keys = data.len(), "section updated");
                self.state().data = data;
            }
            Ok(other) => {
                error!(section = %self.name, kind = json_kind(&other), "section payload is not an object, keeping previous data");
            }
            Err(e) => {
                error!(section = %self.name, error = %e, "invalid section payload, keeping previous data");
            }
        }
        WatchControl::Continue
    }

    /// Start the data watch.
    ///
    /// The first payload is applied before returning; later ones are applied by
    /// a background task until the node is deleted, the watch closes, or the
    /// section is cancelled.
    pub(crate) async fn arm(self: &Arc<Self>, store: &Arc<dyn ConfigStore>) -> Result<(), StoreError> {
        let mut rx = store.watch_data(&self.path).await?;
        self.state().watch_active = true;

        let first = rx.recv().await;
        if first.is_none() || self.on_data(first.flatten().as_deref()) == WatchControl::Stop {
            self.state().watch_active = false;
            return Ok(());
        }

        let section = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = section.cancel.cancelled() => break,
                    payload = rx.recv() => match payload {
                        Some(payload) => {
                            if section.on_data(payload.as_deref()) == WatchControl::Stop {
                                break;
                            }
                        }
                        None => {
                            warn!(section = %section.name, "data watch closed");
                            section.state().watch_active = false;
                            break;
                        }
                    },
                }
            }
        });
        Ok(())
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
        self.state().watch_active = false;
    }

    fn state(&self) -> MutexGuard<'_, SectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn section() -> Arc<DeploymentConfigSection> {
        DeploymentConfigSection::new("datastore", "/mctl/config/datastore", &CancellationToken::new())
    }

    #[test]
    fn malformed_payload_keeps_previous_data() {
        let s = section();
        assert_eq!(s.on_data(Some(br#"{"replicas": 3}"#)), WatchControl::Continue);

        assert_eq!(s.on_data(Some(b"{not json")), WatchControl::Continue);
        assert_eq!(s.on_data(Some(b"[1, 2]")), WatchControl::Continue);
        assert_eq!(s.data().get("replicas"), Some(&json!(3)));

        s.on_data(Some(br#"{"hosts": ["a", "b"]}"#));
        let data = s.data();
        assert_eq!(data.get("hosts"), Some(&json!(["a", "b"])));
        assert!(data.get("replicas").is_none(), "data is replaced, not merged");
    }

    #[test]
    fn deletion_stops_the_watch() {
        let s = section();
        s.state().watch_active = true;

        assert_eq!(s.on_data(None), WatchControl::Stop);
        assert!(!s.is_watch_active());
    }
}
