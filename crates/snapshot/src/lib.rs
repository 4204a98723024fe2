//! Registry Snapshots
//!
//! Encodes the whole device registry as JSON, persists it to a file and
//! restores it back. The file is a single object mapping each device id to
//! its ordered list of records.

mod backup;
mod codec;
mod file;

pub use backup::{backup_to_path, restore_from_path, SnapshotSummary};
pub use codec::{decode, encode};
pub use file::{read_from_path, write_to_path};

use std::path::PathBuf;
use thiserror::Error;

/// Snapshot errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Malformed snapshot: {0}")]
    Malformed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Snapshot task failed: {0}")]
    Task(String),
}
