//! Device Record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reported session for a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// Identifier of the owning device
    pub id: String,
    /// Display label
    pub name: String,
    /// Session start, absent when the agent did not report one
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Session end, absent while the session is in progress
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Firmware/software version tag
    pub version: String,
}

impl DeviceRecord {
    /// Whether this record ended strictly before `threshold`.
    ///
    /// A record without an end time sorts before every timestamp.
    pub fn is_older_than(&self, threshold: DateTime<Utc>) -> bool {
        self.end_time.map_or(true, |end| end < threshold)
    }
}
