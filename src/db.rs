//! Job state-points and documents are stored in a SQLite database

/// Connect to a SQLite database
pub mod open;
/// Job handles and content-derived ids
pub mod job;
/// The job-store interface the rest of the crate talks to
pub mod store;

pub use job::Job;
pub use store::{JobStore, SqliteStore};
