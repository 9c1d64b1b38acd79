mod kv;
pub use kv::KeyValue;

mod env;
pub use env::Env;

mod constants;
pub use constants::{DEFAULT_GROUP, DEFAULT_MONIT_BIN, DEFAULT_MONIT_ENDPOINT};

/// Timeout value in milliseconds.
///
/// Used in retry budgets and agent settings where an explicit time limit is required.
pub type TimeoutMs = u64;
