//! Validator for Device Input

use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use storage::DeviceRecord;
use tracing::debug;

/// Naive formats accepted for thresholds, interpreted as UTC
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation configuration
///
/// Length limits are opt-in; by default only a blank id is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum device id length (characters)
    pub max_id_length: Option<usize>,
    /// Maximum name and version length (characters)
    pub max_label_length: Option<usize>,
}

/// Device record as submitted by an agent, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub version: Option<String>,
}

/// Validator for device records and prune thresholds
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a device id: present, not blank, within length limit
    pub fn validate_device_id(&self, id: &str) -> Result<(), ValidationError> {
        if id.trim().is_empty() {
            return Err(ValidationError::MissingField("id"));
        }
        self.validate_length("id", id, self.config.max_id_length)
    }

    fn validate_length(
        &self,
        field: &'static str,
        value: &str,
        max: Option<usize>,
    ) -> Result<(), ValidationError> {
        let Some(max) = max else {
            return Ok(());
        };
        let length = value.chars().count();
        if length > max {
            Err(ValidationError::TooLong { field, length, max })
        } else {
            Ok(())
        }
    }

    /// Validate submitted input and build the record to store.
    ///
    /// Only the id is required; missing labels become empty strings and
    /// missing timestamps stay absent.
    pub fn validate_record(&self, input: RecordInput) -> Result<DeviceRecord, ValidationError> {
        let id = input.id.ok_or(ValidationError::MissingField("id"))?;
        self.validate_device_id(&id)?;

        let name = input.name.unwrap_or_default();
        self.validate_length("name", &name, self.config.max_label_length)?;
        let version = input.version.unwrap_or_default();
        self.validate_length("version", &version, self.config.max_label_length)?;

        Ok(DeviceRecord {
            id,
            name,
            start_time: input.start_time,
            end_time: input.end_time,
            version,
        })
    }

    /// Parse a prune threshold.
    ///
    /// Accepts RFC 3339, a naive date-time or a bare date; naive values are
    /// taken as UTC and a bare date as its midnight.
    pub fn parse_threshold(&self, raw: Option<&str>) -> Result<DateTime<Utc>, ValidationError> {
        let raw = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingField("olderThan"))?;

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&Utc));
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(Utc.from_utc_datetime(&naive));
            }
        }

        if let Some(midnight) = NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(Utc.from_utc_datetime(&midnight));
        }

        debug!("Rejected threshold {:?}", raw);
        Err(ValidationError::InvalidFormat(format!(
            "olderThan is not a valid timestamp: {}",
            raw
        )))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
