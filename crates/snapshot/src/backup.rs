//! Backup and Restore
//!
//! File I/O runs on tokio's blocking pool; the registry itself is only
//! touched through its own atomic operations.

use crate::{read_from_path, write_to_path, SnapshotError};
use std::path::PathBuf;
use storage::{RegistrySnapshot, RegistryStore};
use tracing::info;

/// Size of a snapshot that was written or installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub devices: usize,
    pub records: usize,
}

impl SnapshotSummary {
    fn of(snapshot: &RegistrySnapshot) -> Self {
        Self {
            devices: snapshot.len(),
            records: snapshot.values().map(Vec::len).sum(),
        }
    }
}

/// Write a consistent copy of the registry to `path`
pub async fn backup_to_path(
    store: &RegistryStore,
    path: impl Into<PathBuf>,
) -> Result<SnapshotSummary, SnapshotError> {
    let path = path.into();
    let snapshot = store.snapshot();
    let summary = SnapshotSummary::of(&snapshot);

    let target = path.clone();
    tokio::task::spawn_blocking(move || write_to_path(&snapshot, &target))
        .await
        .map_err(|e| SnapshotError::Task(e.to_string()))??;

    info!(
        "Backed up {} devices ({} records) to {}",
        summary.devices,
        summary.records,
        path.display()
    );
    Ok(summary)
}

/// Replace the registry with the snapshot stored at `path`.
///
/// The registry is left untouched unless the file was read and decoded
/// successfully.
pub async fn restore_from_path(
    store: &RegistryStore,
    path: impl Into<PathBuf>,
) -> Result<SnapshotSummary, SnapshotError> {
    let path = path.into();

    let source = path.clone();
    let snapshot = tokio::task::spawn_blocking(move || read_from_path(&source))
        .await
        .map_err(|e| SnapshotError::Task(e.to_string()))??;

    let summary = SnapshotSummary::of(&snapshot);
    store.replace_all(snapshot);

    info!(
        "Restored {} devices ({} records) from {}",
        summary.devices,
        summary.records,
        path.display()
    );
    Ok(summary)
}
