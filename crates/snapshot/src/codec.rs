//! JSON Codec

use crate::SnapshotError;
use storage::RegistrySnapshot;

/// Encode a registry snapshot as pretty-printed JSON.
///
/// Keys come out sorted and each device keeps its record order, so equal
/// snapshots always encode to identical bytes.
pub fn encode(snapshot: &RegistrySnapshot) -> Result<Vec<u8>, SnapshotError> {
    serde_json::to_vec_pretty(snapshot).map_err(|e| SnapshotError::Serialization(e.to_string()))
}

/// Decode bytes produced by [`encode`]
pub fn decode(bytes: &[u8]) -> Result<RegistrySnapshot, SnapshotError> {
    let snapshot: RegistrySnapshot =
        serde_json::from_slice(bytes).map_err(|e| SnapshotError::Malformed(e.to_string()))?;

    for (key, records) in &snapshot {
        if let Some(stray) = records.iter().find(|record| &record.id != key) {
            return Err(SnapshotError::Malformed(format!(
                "record with id {:?} filed under device {:?}",
                stray.id, key
            )));
        }
    }

    Ok(snapshot)
}
