//! Storage Layer
//!
//! In-memory registry mapping device identifiers to their ordered
//! telemetry records.

mod record;
mod repository;

pub use record::DeviceRecord;
pub use repository::{RegistrySnapshot, RegistryStore};
