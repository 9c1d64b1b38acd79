mod agent;
mod config;
mod metrics;

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mctl_core::{BackgroundTasks, MetricsHandle, MonitOperator, Schedule};
use mctl_observe::{TZ_SYNC_INTERVAL, TZ_SYNC_TIMEOUT, init_local_offset, init_logger, timezone_sync};
use mctl_prometheus::PrometheusMetrics;

use crate::{agent::Agent, config::AgentConfig};

fn main() -> anyhow::Result<()> {
    // 0) local offset must be read before any worker thread exists
    init_local_offset();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building runtime")?
        .block_on(run())
}

async fn run() -> anyhow::Result<()> {
    // 1) config + logger
    let cfg = AgentConfig::load()?;
    init_logger(&cfg.logger)?;
    info!(processes = cfg.processes.len(), endpoint = %cfg.operator.endpoint, "mctl-agentd starting");

    // 2) background supervisor + internal timezone-sync
    let tasks = BackgroundTasks::start().await;
    let tz_schedule = Schedule::every(TZ_SYNC_INTERVAL)
        .with_timeout(TZ_SYNC_TIMEOUT)
        .with_retry(TZ_SYNC_TIMEOUT, TZ_SYNC_TIMEOUT);
    tasks.submit(timezone_sync(), &tz_schedule).await?;

    // 3) metrics
    let cancel = CancellationToken::new();
    let prometheus = Arc::new(PrometheusMetrics::new()?);
    let metrics_task = cfg.metrics_addr.map(|addr| {
        let prometheus = Arc::clone(&prometheus);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = metrics::serve(addr, prometheus, cancel).await {
                error!(error = %e, "metrics endpoint failed");
            }
        })
    });
    let handle: MetricsHandle = prometheus;

    // 4) operator + agent
    let operator = MonitOperator::http(cfg.operator.clone(), handle)?;
    let agent = Arc::new(Agent::new(&cfg, operator));

    // 5) bootstrap, then reconcile periodically until interrupted
    agent.bootstrap().await?;
    tasks
        .submit(agent.reconcile_task(), &Schedule::every(agent.reconcile_every()))
        .await?;

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("shutdown requested");

    // 6) shutdown
    agent.shutdown().await;
    cancel.cancel();
    if let Some(task) = metrics_task {
        let _ = task.await;
    }

    info!("mctl-agentd stopped");
    Ok(())
}
