//! Device Routes

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use data_validator::RecordInput;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::{error::ApiError, AppState};
use storage::DeviceRecord;

/// Query parameters for record pruning
#[derive(Debug, Deserialize)]
pub struct PruneQuery {
    /// Records that ended before this instant are removed
    #[serde(rename = "olderThan")]
    pub older_than: Option<String>,
}

/// Response for record pruning
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneResponse {
    pub device_id: String,
    pub older_than: DateTime<Utc>,
    pub removed: usize,
}

/// Register a device record
pub async fn add_device(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecordInput>, JsonRejection>,
) -> Result<Json<DeviceRecord>, ApiError> {
    let Json(input) = payload?;
    let record = state.validator.validate_record(input)?;

    state.store.add_record(record.clone());
    metrics::counter!("device_records_added_total").increment(1);
    info!(
        "Device record added. ID: {}, Name: {}",
        record.id, record.name
    );

    Ok(Json(record))
}

/// List one representative record per device
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<Vec<DeviceRecord>> {
    let devices = state.store.list_devices();
    info!("Retrieved {} devices", devices.len());
    Json(devices)
}

/// Get all records of a device
pub async fn get_device_logs(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<Vec<DeviceRecord>>, ApiError> {
    state.validator.validate_device_id(&device_id)?;

    let records = state.store.get_records(&device_id);
    if records.is_empty() {
        return Err(ApiError::DeviceNotFound(device_id));
    }

    info!(
        "Retrieved {} records for device with ID: {}",
        records.len(),
        device_id
    );
    Ok(Json(records))
}

/// Remove records of a device that ended before `olderThan`
pub async fn prune_records(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    Query(params): Query<PruneQuery>,
) -> Result<Json<PruneResponse>, ApiError> {
    state.validator.validate_device_id(&device_id)?;
    let older_than = state
        .validator
        .parse_threshold(params.older_than.as_deref())?;

    let removed = state.store.prune_older_than(&device_id, older_than);
    metrics::counter!("device_records_pruned_total").increment(removed as u64);
    info!(
        "Pruned {} records older than {} for device with ID: {}",
        removed, older_than, device_id
    );

    Ok(Json(PruneResponse {
        device_id,
        older_than,
        removed,
    }))
}
