use std::{collections::HashMap, sync::Arc};

use serde_json::{Map, Value};
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use mctl_core::RetryPolicy;
use mctl_model::RetryBudget;

use crate::{
    error::{ConfigError, StoreError},
    section::DeploymentConfigSection,
    store::{ConfigStore, ConnectionState, child_path},
};

/// Whether the local mirror reflects the latest child listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
}

/// Mirror of every section below a root node.
///
/// Background tasks follow the child listing and the store connection until
/// [`DeploymentConfig::stop`] is called.
#[derive(Clone)]
pub struct DeploymentConfig {
    inner: Arc<Shared>,
}

struct Shared {
    store: Arc<dyn ConfigStore>,
    root: String,
    sections: Mutex<HashMap<String, Arc<DeploymentConfigSection>>>,
    state: watch::Sender<LoadState>,
    cancel: CancellationToken,
}

impl DeploymentConfig {
    /// Create `root` if needed, load the current sections and start following changes.
    ///
    /// Connection loss while creating `root` is retried within the default budget.
    #[instrument(level = "debug", skip(store, root), fields(root = %root.as_ref()))]
    pub async fn start(store: Arc<dyn ConfigStore>, root: impl AsRef<str>) -> Result<Self, ConfigError> {
        let root = root.as_ref().to_string();

        RetryPolicy::new("ensure_path", RetryBudget::default(), StoreError::is_connection_loss)
            .run(|| store.ensure_path(&root))
            .await?;
        let mut listings = store.watch_children(&root).await?;

        let config = Self {
            inner: Arc::new(Shared {
                store,
                root,
                sections: Mutex::new(HashMap::new()),
                state: watch::Sender::new(LoadState::Loading),
                cancel: CancellationToken::new(),
            }),
        };

        if let Some(children) = listings.recv().await {
            config.update_sections(&children).await;
        }

        let follower = config.clone();
        tokio::spawn(async move {
            let cancel = follower.inner.cancel.clone();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    listing = listings.recv() => match listing {
                        Some(children) => follower.update_sections(&children).await,
                        None => {
                            warn!("children watch closed");
                            break;
                        }
                    },
                }
            }
        });

        let listener = config.clone();
        tokio::spawn(async move { listener.follow_connection().await });

        info!(root = %config.inner.root, "deployment config started");
        Ok(config)
    }

    /// Reconcile the section table with a child listing.
    ///
    /// Sections no longer listed are dropped, new ones are created and armed,
    /// and tombstoned sections that reappeared are re-armed. The mirror is only
    /// marked loaded while the store is connected.
    #[instrument(level = "debug", skip(self, children), fields(count = children.len()))]
    pub async fn update_sections(&self, children: &[String]) {
        let mut sections = self.inner.sections.lock().await;
        self.inner.state.send_replace(LoadState::Loading);

        sections.retain(|name, section| {
            let keep = children.contains(name);
            if !keep {
                info!(section = %name, "section removed");
                section.cancel();
            }
            keep
        });

        for name in children {
            let section = match sections.get(name) {
                Some(section) if section.is_watch_active() => continue,
                Some(section) => {
                    info!(section = %name, "re-arming section watch");
                    Arc::clone(section)
                }
                None => {
                    debug!(section = %name, "tracking new section");
                    let path = child_path(&self.inner.root, name);
                    let section = DeploymentConfigSection::new(name.as_str(), path, &self.inner.cancel);
                    sections.insert(name.clone(), Arc::clone(&section));
                    section
                }
            };
            if let Err(e) = section.arm(&self.inner.store).await {
                error!(section = %name, error = %e, "failed to watch section");
            }
        }

        let degraded = self.inner.store.connection_state().borrow().is_degraded();
        if degraded {
            warn!("store degraded during refresh, mirror stays loading");
            return;
        }
        self.inner.state.send_replace(LoadState::Loaded);
    }

    /// Data of section `name`, or an empty map if it is not tracked.
    ///
    /// Waits while the mirror is loading and the store is connected. Fails with
    /// [`ConfigError::ConfigInaccessible`] if the mirror is still not loaded after that.
    pub async fn get_config(&self, name: &str) -> Result<Map<String, Value>, ConfigError> {
        let mut state = self.inner.state.subscribe();
        let mut connection = self.inner.store.connection_state();

        loop {
            if *state.borrow_and_update() == LoadState::Loaded {
                break;
            }
            if connection.borrow_and_update().is_degraded() {
                break;
            }
            tokio::select! {
                changed = state.changed() => if changed.is_err() { break },
                changed = connection.changed() => if changed.is_err() { break },
            }
        }

        let sections = self.inner.sections.lock().await;
        if self.state() != LoadState::Loaded {
            return Err(ConfigError::ConfigInaccessible);
        }
        Ok(sections.get(name).map(|s| s.data()).unwrap_or_default())
    }

    pub fn state(&self) -> LoadState {
        *self.inner.state.borrow()
    }

    /// Stop every background watch.
    pub fn stop(&self) {
        self.inner.cancel.cancel();
        info!(root = %self.inner.root, "deployment config stopped");
    }

    /// Mark the mirror untrusted while disconnected; reload the listing on reconnect.
    async fn follow_connection(&self) {
        let mut connection = self.inner.store.connection_state();
        loop {
            tokio::select! {
                _ = self.inner.cancel.cancelled() => break,
                changed = connection.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let current = *connection.borrow_and_update();
            match current {
                ConnectionState::Lost | ConnectionState::Suspended => {
                    warn!(state = ?current, "config store connection degraded");
                    let _sections = self.inner.sections.lock().await;
                    self.inner.state.send_replace(LoadState::Loading);
                }
                ConnectionState::Connected => {
                    info!("config store connection restored, reloading sections");
                    match self.inner.store.children(&self.inner.root).await {
                        Ok(children) => self.update_sections(&children).await,
                        Err(e) => error!(error = %e, "failed to list sections after reconnect"),
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for DeploymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentConfig")
            .field("root", &self.inner.root)
            .field("state", &self.state())
            .finish()
    }
}
