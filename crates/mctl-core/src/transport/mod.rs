//! Transport seam between [`crate::MonitOperator`] and the supervisor.
//!
//! The operator only reasons about retries, coalescing and state; how bytes
//! reach the supervisor is behind [`MonitTransport`]. [`HttpTransport`] talks to
//! the real HTTP API and runs the control binary for reloads.
mod http;
pub use http::HttpTransport;

use async_trait::async_trait;

use mctl_model::MonitAction;

use crate::error::OperatorError;

/// Raw, single-attempt access to the supervisor.
///
/// Implementations must not retry; retry policy belongs to the operator.
#[async_trait]
pub trait MonitTransport: Send + Sync + 'static {
    /// Fetch the XML status document.
    async fn fetch_status(&self) -> Result<String, OperatorError>;

    /// Send `action` to the per-process control endpoint.
    ///
    /// Must map "unknown process" to [`OperatorError::ProcessNotFound`].
    async fn post_action(&self, process: &str, action: MonitAction) -> Result<(), OperatorError>;

    /// Ask the supervisor to re-read its configuration.
    ///
    /// A failed invocation must be reported as [`OperatorError::CommandFailed`].
    async fn reload(&self) -> Result<(), OperatorError>;
}
