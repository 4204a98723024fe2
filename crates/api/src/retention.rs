//! Background retention task

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use storage::RegistryStore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::settings::RetentionConfig;

/// Spawn the periodic pruning loop.
///
/// Returns `None` when no maximum age is configured.
pub fn spawn_retention(store: Arc<RegistryStore>, policy: &RetentionConfig) -> Option<JoinHandle<()>> {
    let max_age = policy.max_age()?;
    let period = policy.interval();
    info!(
        "Retention enabled: pruning records older than {}s every {}s",
        max_age.num_seconds(),
        period.as_secs()
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let Some(threshold) = prune_threshold(Utc::now(), max_age) else {
                warn!(
                    "Retention max age of {}s reaches past the earliest representable time, skipping pass",
                    max_age.num_seconds()
                );
                continue;
            };
            let removed = store.prune_all_older_than(threshold);
            if removed > 0 {
                metrics::counter!("device_records_pruned_total").increment(removed as u64);
            }
            debug!("Retention pass removed {} records", removed);
        }
    }))
}

/// Cutoff for a retention pass; `None` when `now - max_age` is out of range
fn prune_threshold(now: DateTime<Utc>, max_age: Duration) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(max_age)
}
