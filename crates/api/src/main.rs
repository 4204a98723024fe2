//! Device Monitor - Main Entry Point

use api::{init_logging, run_server, AppState, ServerConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    init_logging(&config)?;

    info!("=== Device Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let mut state = AppState::new(config);
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Metrics disabled: {}", e),
    }

    run_server(state).await
}
