//! Backup Routes

use axum::{
    extract::{Query, State},
    Json,
};
use data_validator::ValidationError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::{error::ApiError, AppState, ServerConfig};
use snapshot::{backup_to_path, restore_from_path};

/// Query parameters for backup and restore
///
/// `filepath` is opened with the server's own permissions. Unless
/// `confine_backups` is set, any path the process can reach is accepted.
#[derive(Debug, Deserialize)]
pub struct BackupQuery {
    /// Snapshot file; the configured default when absent
    pub filepath: Option<String>,
}

/// Response for backup and restore
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupResponse {
    pub path: String,
    pub devices: usize,
    pub records: usize,
}

fn resolve_path(config: &ServerConfig, filepath: Option<String>) -> Result<PathBuf, ApiError> {
    let Some(requested) = filepath.filter(|p| !p.trim().is_empty()) else {
        return Ok(PathBuf::from(&config.backup_path));
    };
    if !config.confine_backups {
        return Ok(PathBuf::from(requested));
    }

    let mut components = Path::new(&requested).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => {
            let dir = Path::new(&config.backup_path)
                .parent()
                .unwrap_or_else(|| Path::new(""));
            Ok(dir.join(name))
        }
        _ => Err(ApiError::Validation(ValidationError::InvalidFormat(format!(
            "filepath must be a plain file name: {}",
            requested
        )))),
    }
}

/// Save the whole registry to a file
pub async fn backup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BackupQuery>,
) -> Result<Json<BackupResponse>, ApiError> {
    let path = resolve_path(&state.config, params.filepath)?;
    let summary = backup_to_path(&state.store, &path)
        .await
        .map_err(ApiError::Backup)?;
    metrics::counter!("device_backups_total").increment(1);

    Ok(Json(BackupResponse {
        path: path.display().to_string(),
        devices: summary.devices,
        records: summary.records,
    }))
}

/// Replace the registry with the contents of a backup file
pub async fn restore(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BackupQuery>,
) -> Result<Json<BackupResponse>, ApiError> {
    let path = resolve_path(&state.config, params.filepath)?;
    let summary = restore_from_path(&state.store, &path)
        .await
        .map_err(ApiError::Restore)?;
    metrics::counter!("device_restores_total").increment(1);

    Ok(Json(BackupResponse {
        path: path.display().to_string(),
        devices: summary.devices,
        records: summary.records,
    }))
}
