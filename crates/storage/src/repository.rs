//! Registry Store Implementation

use crate::DeviceRecord;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Deep copy of the registry, keyed by device id in sorted order
pub type RegistrySnapshot = BTreeMap<String, Vec<DeviceRecord>>;

/// Registry of device records (in-memory)
///
/// All operations go through a single registry-wide lock: appends, prunes
/// and reads of the same id never interleave, and `replace_all` is a full
/// barrier. A key is present only while it owns at least one record.
pub struct RegistryStore {
    devices: RwLock<HashMap<String, Vec<DeviceRecord>>>,
}

impl RegistryStore {
    /// Create an empty registry
    pub fn new() -> Self {
        info!("Creating in-memory device registry");
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }

    // A panicking writer leaves the map structurally valid, so poisoning is
    // recovered rather than surfaced.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<DeviceRecord>>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<DeviceRecord>>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record to its device's sequence, creating the device if needed
    pub fn add_record(&self, record: DeviceRecord) {
        let mut devices = self.write();
        let records = devices.entry(record.id.clone()).or_insert_with(|| {
            info!("Added new device with ID: {}", record.id);
            Vec::new()
        });
        debug!("Added record for device with ID: {}", record.id);
        records.push(record);
    }

    /// One representative record per device, in no particular order.
    ///
    /// The representative is the first record stored for each id.
    pub fn list_devices(&self) -> Vec<DeviceRecord> {
        let devices = self.read();
        debug!("Listing {} devices", devices.len());
        devices
            .values()
            .filter_map(|records| records.first().cloned())
            .collect()
    }

    /// All records for a device in insertion order; empty when unknown
    pub fn get_records(&self, id: &str) -> Vec<DeviceRecord> {
        match self.read().get(id) {
            Some(records) => {
                debug!("Found {} records for device with ID: {}", records.len(), id);
                records.clone()
            }
            None => {
                debug!("No records found for device with ID: {}", id);
                Vec::new()
            }
        }
    }

    /// Remove records of `id` that ended strictly before `threshold`.
    ///
    /// Drops the device entirely once its last record is gone. Returns the
    /// number of removed records; unknown ids remove nothing.
    pub fn prune_older_than(&self, id: &str, threshold: DateTime<Utc>) -> usize {
        let mut devices = self.write();
        let Some(records) = devices.get_mut(id) else {
            warn!("No device with ID: {} to prune records from", id);
            return 0;
        };

        let removed = prune_records(records, threshold);
        if removed > 0 {
            info!("Removed {} records for device with ID: {}", removed, id);
        } else {
            debug!("No records to remove for device with ID: {}", id);
        }

        if records.is_empty() {
            devices.remove(id);
            info!("Device with ID {} has no records left and was removed", id);
        }
        removed
    }

    /// Apply [`prune_older_than`](Self::prune_older_than) to every device at once
    pub fn prune_all_older_than(&self, threshold: DateTime<Utc>) -> usize {
        let mut devices = self.write();
        let mut removed = 0;
        devices.retain(|_, records| {
            removed += prune_records(records, threshold);
            !records.is_empty()
        });
        if removed > 0 {
            info!("Removed {} records older than {} across all devices", removed, threshold);
        }
        removed
    }

    /// Discard all current entries and install `snapshot` in their place
    pub fn replace_all(&self, snapshot: RegistrySnapshot) {
        let incoming: HashMap<_, _> = snapshot
            .into_iter()
            .filter(|(_, records)| !records.is_empty())
            .collect();

        let mut devices = self.write();
        info!(
            "Replacing registry: {} devices -> {} devices",
            devices.len(),
            incoming.len()
        );
        *devices = incoming;
    }

    /// Read-consistent copy of the whole registry
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.read()
            .iter()
            .map(|(id, records)| (id.clone(), records.clone()))
            .collect()
    }

    /// Number of distinct devices
    pub fn device_count(&self) -> usize {
        self.read().len()
    }

    /// Total number of records across all devices
    pub fn record_count(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }
}

impl Default for RegistryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn prune_records(records: &mut Vec<DeviceRecord>, threshold: DateTime<Utc>) -> usize {
    let before = records.len();
    records.retain(|record| !record.is_older_than(threshold));
    before - records.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn record(id: &str, end_time: DateTime<Utc>) -> DeviceRecord {
        DeviceRecord {
            id: id.to_string(),
            name: "Sensor".to_string(),
            start_time: Some(date(2023, 12, 1)),
            end_time: Some(end_time),
            version: "1.0".to_string(),
        }
    }

    #[test]
    fn test_add_and_retrieve() {
        let store = RegistryStore::new();
        let added = record("dev1", date(2024, 1, 1));

        store.add_record(added.clone());

        assert_eq!(store.get_records("dev1"), vec![added]);
        let devices = store.list_devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "dev1");
    }

    #[test]
    fn test_add_appends_instead_of_upserting() {
        let store = RegistryStore::new();
        let first = record("dev1", date(2024, 1, 1));
        let second = record("dev1", date(2024, 6, 1));

        store.add_record(first.clone());
        store.add_record(second.clone());

        assert_eq!(store.get_records("dev1"), vec![first.clone(), second]);
        assert_eq!(store.list_devices(), vec![first]);
        assert_eq!(store.record_count(), 2);
        assert_eq!(store.device_count(), 1);
    }

    #[test]
    fn test_list_devices_one_per_id() {
        let store = RegistryStore::new();
        for id in ["a", "b", "c"] {
            store.add_record(record(id, date(2024, 1, 1)));
            store.add_record(record(id, date(2024, 2, 1)));
        }

        let mut ids: Vec<_> = store.list_devices().into_iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unknown_device_is_empty() {
        let store = RegistryStore::new();
        assert!(store.get_records("missing").is_empty());
    }

    #[test]
    fn test_prune_keeps_newer_records() {
        let store = RegistryStore::new();
        store.add_record(record("dev1", date(2024, 1, 1)));
        store.add_record(record("dev1", date(2024, 6, 1)));

        let removed = store.prune_older_than("dev1", date(2024, 3, 1));

        assert_eq!(removed, 1);
        let remaining = store.get_records("dev1");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].end_time, Some(date(2024, 6, 1)));
    }

    #[test]
    fn test_prune_keeps_equal_end_time() {
        let store = RegistryStore::new();
        store.add_record(record("dev1", date(2024, 3, 1)));

        assert_eq!(store.prune_older_than("dev1", date(2024, 3, 1)), 0);
        assert_eq!(store.get_records("dev1").len(), 1);
    }

    #[test]
    fn test_prune_to_empty_removes_device() {
        let store = RegistryStore::new();
        store.add_record(record("dev1", date(2024, 1, 1)));
        store.add_record(record("dev2", date(2024, 1, 1)));

        assert_eq!(store.prune_older_than("dev1", date(2025, 1, 1)), 1);

        assert!(store.get_records("dev1").is_empty());
        assert!(store.list_devices().iter().all(|r| r.id != "dev1"));
        assert!(!store.snapshot().contains_key("dev1"));
        assert_eq!(store.device_count(), 1);
    }

    #[test]
    fn test_prune_unknown_device_is_noop() {
        let store = RegistryStore::new();
        store.add_record(record("dev1", date(2024, 1, 1)));

        assert_eq!(store.prune_older_than("missing", date(2025, 1, 1)), 0);
        assert_eq!(store.record_count(), 1);
    }

    #[test]
    fn test_prune_removes_records_without_end_time() {
        let store = RegistryStore::new();
        let mut open = record("dev1", date(2024, 1, 1));
        open.end_time = None;
        store.add_record(open);
        store.add_record(record("dev1", date(2024, 6, 1)));

        assert_eq!(store.prune_older_than("dev1", date(2000, 1, 1)), 1);
        assert_eq!(store.get_records("dev1")[0].end_time, Some(date(2024, 6, 1)));
    }

    #[test]
    fn test_prune_all_older_than() {
        let store = RegistryStore::new();
        store.add_record(record("old", date(2023, 1, 1)));
        store.add_record(record("mixed", date(2023, 1, 1)));
        store.add_record(record("mixed", date(2024, 6, 1)));
        store.add_record(record("new", date(2024, 6, 1)));

        let removed = store.prune_all_older_than(date(2024, 1, 1));

        assert_eq!(removed, 2);
        assert_eq!(store.device_count(), 2);
        assert!(store.get_records("old").is_empty());
        assert_eq!(store.get_records("mixed").len(), 1);
    }

    #[test]
    fn test_replace_all_discards_previous_entries() {
        let store = RegistryStore::new();
        store.add_record(record("stale", date(2024, 1, 1)));

        let mut snapshot = RegistrySnapshot::new();
        snapshot.insert("fresh".to_string(), vec![record("fresh", date(2024, 2, 1))]);
        snapshot.insert("empty".to_string(), Vec::new());
        store.replace_all(snapshot);

        assert!(store.get_records("stale").is_empty());
        assert_eq!(store.get_records("fresh").len(), 1);
        assert_eq!(store.device_count(), 1);
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let store = RegistryStore::new();
        store.add_record(record("dev1", date(2024, 1, 1)));

        let snapshot = store.snapshot();
        store.add_record(record("dev1", date(2024, 2, 1)));
        store.prune_older_than("dev1", date(2030, 1, 1));

        assert_eq!(snapshot["dev1"].len(), 1);
        assert_eq!(store.device_count(), 0);
    }

    #[test]
    fn test_concurrent_appends_all_land() {
        let store = Arc::new(RegistryStore::new());
        let threads = 8;
        let per_thread = 250;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        store.add_record(record("shared", date(2024, 1, 1)));
                        store.add_record(record(&format!("own-{}", t), date(2024, 1, 1 + i % 28)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_records("shared").len(), threads * per_thread as usize);
        for t in 0..threads {
            assert_eq!(store.get_records(&format!("own-{}", t)).len(), per_thread as usize);
        }
    }

    #[test]
    fn test_readers_never_see_partial_prune() {
        let store = Arc::new(RegistryStore::new());
        for _ in 0..500 {
            store.add_record(record("dev1", date(2023, 1, 1)));
            store.add_record(record("dev1", date(2025, 1, 1)));
        }

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let len = store.get_records("dev1").len();
                    assert!(len == 1000 || len == 500, "observed partial prune: {}", len);
                }
            })
        };
        store.prune_older_than("dev1", date(2024, 1, 1));
        reader.join().unwrap();

        assert_eq!(store.get_records("dev1").len(), 500);
    }

    proptest! {
        #[test]
        fn prop_record_count_matches_adds(counts in proptest::collection::vec(0usize..20, 1..6)) {
            let store = RegistryStore::new();
            for (i, count) in counts.iter().enumerate() {
                for _ in 0..*count {
                    store.add_record(record(&format!("dev{}", i), date(2024, 1, 1)));
                }
            }

            for (i, count) in counts.iter().enumerate() {
                prop_assert_eq!(store.get_records(&format!("dev{}", i)).len(), *count);
            }
            prop_assert_eq!(store.device_count(), counts.iter().filter(|c| **c > 0).count());
        }

        #[test]
        fn prop_prune_splits_on_threshold(days in proptest::collection::vec(1u32..29, 1..30), cut in 1u32..29) {
            let store = RegistryStore::new();
            for day in &days {
                store.add_record(record("dev1", date(2024, 2, *day)));
            }
            let threshold = date(2024, 2, cut);

            let removed = store.prune_older_than("dev1", threshold);
            let remaining = store.get_records("dev1");

            prop_assert_eq!(removed, days.iter().filter(|d| **d < cut).count());
            prop_assert!(remaining.iter().all(|r| !r.is_older_than(threshold)));
            prop_assert_eq!(remaining.is_empty(), store.list_devices().is_empty());
        }
    }
}
