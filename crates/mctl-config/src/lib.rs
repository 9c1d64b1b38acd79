//! Local mirror of shared deployment configuration.
//!
//! [`DeploymentConfig`] watches the children of a root node in a hierarchical
//! store and keeps one [`DeploymentConfigSection`] per child, each holding the
//! last good JSON object found in that node.
mod error;
pub use error::{ConfigError, StoreError};

mod store;
pub use store::{ConfigStore, ConnectionState, MemoryStore};

mod section;
pub use section::{DeploymentConfigSection, WatchControl};

mod deployment;
pub use deployment::{DeploymentConfig, LoadState};
