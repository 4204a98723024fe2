//! Snapshot Files

use crate::{decode, encode, SnapshotError};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use storage::RegistrySnapshot;
use tracing::{debug, warn};

/// Encode `snapshot` and write it to `path`, replacing any previous file.
///
/// Data goes to a sibling `.tmp` file first and is renamed into place, so
/// the target is either the old or the new snapshot, never a partial one.
pub fn write_to_path(snapshot: &RegistrySnapshot, path: &Path) -> Result<(), SnapshotError> {
    let bytes = encode(snapshot)?;
    let tmp = tmp_path(path);

    let written = write_file(&tmp, &bytes).and_then(|()| {
        fs::rename(&tmp, path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    });

    if written.is_err() {
        if let Err(e) = fs::remove_file(&tmp) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove temporary snapshot {}: {}", tmp.display(), e);
            }
        }
    } else {
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    }
    written
}

/// Read and decode the snapshot stored at `path`
pub fn read_from_path(path: &Path) -> Result<RegistrySnapshot, SnapshotError> {
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            SnapshotError::NotFound(path.to_path_buf())
        } else {
            SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    decode(&bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    let io_err = |source: std::io::Error| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
