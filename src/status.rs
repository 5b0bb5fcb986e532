//! Per-operation submission status, stored in each job's document

/// Ordered status levels
pub mod level;
/// Read and write the status entry of a job document
pub mod store;

pub use level::StatusLevel;
pub use store::{is_active, StatusDocument, StatusStore};
