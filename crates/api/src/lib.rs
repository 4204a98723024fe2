//! Device Monitor API Server
//!
//! REST API over the device registry: record ingestion, queries, pruning
//! and file backup/restore.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use snapshot::{restore_from_path, SnapshotError};
use std::str::FromStr;
use std::sync::Arc;
use storage::RegistryStore;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod error;
pub mod retention;
pub mod routes;
pub mod settings;

use data_validator::Validator;
pub use error::ApiError;
pub use settings::{RetentionConfig, ServerConfig};

/// Application state shared across handlers
pub struct AppState {
    /// Device registry
    pub store: Arc<RegistryStore>,
    /// Request validator
    pub validator: Validator,
    /// Server configuration
    pub config: ServerConfig,
    /// Prometheus handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state with an empty registry
    pub fn new(config: ServerConfig) -> Self {
        Self {
            store: Arc::new(RegistryStore::new()),
            validator: Validator::new(config.validation.clone()),
            config,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
    pub device_count: usize,
    pub record_count: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/api/devices",
            post(routes::devices::add_device).get(routes::devices::list_devices),
        )
        .route("/api/devices/backup", post(routes::backup::backup))
        .route("/api/devices/restore", post(routes::backup::restore))
        .route(
            "/api/devices/:device_id/logs",
            get(routes::devices::get_device_logs),
        )
        .route("/api/devices/:device_id", delete(routes::devices::prune_records))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        device_count: state.store.device_count(),
        record_count: state.store.record_count(),
    })
}

/// Prometheus metrics handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(config: &ServerConfig) -> anyhow::Result<()> {
    let level = Level::from_str(&config.log_level).unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Restore the registry from the configured backup, if one exists
pub async fn restore_on_startup(state: &AppState) -> anyhow::Result<()> {
    let path = &state.config.backup_path;
    match restore_from_path(&state.store, path).await {
        Ok(summary) => {
            info!(
                "Startup restore loaded {} devices from {}",
                summary.devices, path
            );
            Ok(())
        }
        Err(SnapshotError::NotFound(_)) => {
            warn!("No backup at {}, starting with an empty registry", path);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Run the server until Ctrl-C
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let state = Arc::new(state);
    if state.config.restore_on_startup {
        restore_on_startup(&state).await?;
    }

    let retention = retention::spawn_retention(Arc::clone(&state.store), &state.config.retention);

    let addr = state.config.bind_addr.clone();
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = retention {
        handle.abort();
    }
    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
