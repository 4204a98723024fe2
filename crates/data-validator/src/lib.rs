//! Request Validation
//!
//! Turns raw caller input into store-ready device records and prune
//! thresholds, rejecting blank ids and malformed timestamps before they
//! reach the registry.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{RecordInput, ValidationConfig, Validator};
