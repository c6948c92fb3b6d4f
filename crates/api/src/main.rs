//! Lead Alert Engine - Main Entry Point

use std::sync::Arc;

use alert_core::EngineConfig;
use alert_service::AlertService;
use alert_store::AlertStore;
use api::{init_logging, run_server, AppState};
use notify::LogGateway;
use response_metrics::MetricsSink;
use team_directory::InMemoryDirectory;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Lead Alert Engine v{} ===", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::load()?;
    info!(
        sla_seconds = config.sla_seconds,
        tiers = config.policy.tiers.len(),
        workers = config.workers,
        "configuration loaded"
    );
    let bind_addr = config.bind_addr.clone();

    let directory = Arc::new(InMemoryDirectory::new());
    let service = Arc::new(AlertService::new(
        Arc::new(AlertStore::new()),
        directory.clone(),
        Arc::new(LogGateway),
        Arc::new(MetricsSink::new()),
        config,
    )?);
    service.start().await;

    let state = Arc::new(AppState::new(Arc::clone(&service), directory));
    let result = run_server(&bind_addr, state).await;

    service.shutdown().await;
    result
}
