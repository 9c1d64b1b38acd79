mod domain;
pub use domain::{DEFAULT_GROUP, DEFAULT_MONIT_BIN, DEFAULT_MONIT_ENDPOINT};
pub use domain::{Env, KeyValue, TimeoutMs};

mod error;
pub use error::{ModelError, ModelResult};

mod action;
pub use action::MonitAction;

mod state;
pub use state::{ProcessEntry, ProcessState, derive_state};

mod spec;
pub use spec::ProcessDescriptor;

mod strategy;
pub use strategy::RetryBudget;
