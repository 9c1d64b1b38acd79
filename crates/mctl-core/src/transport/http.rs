use std::{path::PathBuf, process::Stdio, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header};
use tokio::process::Command;
use tracing::{debug, trace};
use uuid::Uuid;

use mctl_model::MonitAction;

use super::MonitTransport;
use crate::{error::OperatorError, operator::OperatorConfig};

/// [`MonitTransport`] over the supervisor's HTTP API and control binary.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    status_url: Url,
    monit_bin: PathBuf,
    client: Client,
}

impl HttpTransport {
    /// Build a transport for the endpoint and binary named in `cfg`.
    pub fn new(cfg: &OperatorConfig) -> Result<Self, OperatorError> {
        let endpoint = Url::parse(&cfg.endpoint)
            .map_err(|e| OperatorError::Internal(format!("invalid endpoint {}: {e}", cfg.endpoint)))?;
        let mut status_url = endpoint
            .join("_status")
            .map_err(|e| OperatorError::Internal(e.to_string()))?;
        status_url.set_query(Some("format=xml"));

        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .no_proxy()
            .build()
            .map_err(|e| OperatorError::Internal(format!("failed to build http client: {e}")))?;

        Ok(Self {
            endpoint,
            status_url,
            monit_bin: cfg.monit_bin.clone(),
            client,
        })
    }

    /// Control URL for a single process; the name is percent-encoded as one path segment.
    fn process_url(&self, process: &str) -> Result<Url, OperatorError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| OperatorError::Internal(format!("endpoint {} cannot be a base", self.endpoint)))?
            .pop_if_empty()
            .push(process);
        Ok(url)
    }
}

#[async_trait]
impl MonitTransport for HttpTransport {
    async fn fetch_status(&self) -> Result<String, OperatorError> {
        trace!(url = %self.status_url, "fetching supervisor status");
        let response = self.client.get(self.status_url.clone()).send().await?;
        let body = response.error_for_status()?.text().await?;
        Ok(body)
    }

    async fn post_action(&self, process: &str, action: MonitAction) -> Result<(), OperatorError> {
        let url = self.process_url(process)?;
        let token = Uuid::new_v4().to_string();
        debug!(process, action = %action, "posting control command");

        let response = self
            .client
            .post(url)
            .header(header::COOKIE, format!("securitytoken={token}"))
            .form(&[("action", action.as_str()), ("securitytoken", token.as_str())])
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(OperatorError::ProcessNotFound(process.to_string())),
            StatusCode::SERVICE_UNAVAILABLE => Err(OperatorError::Unavailable(format!(
                "{action} {process} rejected with 503"
            ))),
            s => Err(OperatorError::Http {
                status: s.as_u16(),
                reason: format!("{action} {process}"),
            }),
        }
    }

    async fn reload(&self) -> Result<(), OperatorError> {
        debug!(bin = %self.monit_bin.display(), "running supervisor reload");
        let status = Command::new(&self.monit_bin)
            .arg("reload")
            .stdin(Stdio::null())
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(OperatorError::CommandFailed {
                command: format!("{} reload", self.monit_bin.display()),
                reason: status.to_string(),
            })
        }
    }
}
