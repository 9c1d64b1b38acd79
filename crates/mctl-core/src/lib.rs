pub mod background;
pub mod error;
pub mod metrics;
pub mod operator;
pub mod retry;
pub mod status;
pub mod transport;

pub use background::{BackgroundTasks, Schedule};
pub use error::OperatorError;
pub use metrics::{CommandOutcome, MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};
pub use operator::{MonitOperator, OperatorConfig};
pub use retry::RetryPolicy;
pub use status::parse_entries;
pub use transport::{HttpTransport, MonitTransport};

pub mod prelude {
    pub use crate::error::OperatorError;
    pub use crate::operator::{MonitOperator, OperatorConfig};
    pub use crate::retry::RetryPolicy;
    pub use crate::transport::{HttpTransport, MonitTransport};
}
