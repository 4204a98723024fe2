//! Route handlers

pub mod backup;
pub mod devices;
