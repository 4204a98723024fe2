//! Validation Error Types

use thiserror::Error;

/// Errors during input validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Missing or blank required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field longer than allowed
    #[error("{field} is {length} characters long, maximum is {max}")]
    TooLong {
        field: &'static str,
        length: usize,
        max: usize,
    },

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}
