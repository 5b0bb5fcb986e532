//! Submission core of a workflow driver for batch-queue clusters
//!
//! Jobs carry a state-point and a status document. Operations on jobs are checked for
//! eligibility, grouped into submissions, rendered into job scripts and handed to the
//! scheduler, while each operation's status is tracked in its job's document.

use std::path::PathBuf;

pub mod error;

/// Jobs and their documents live in a SQLite database
pub mod db;

/// Ordered status levels and their storage
pub mod status;

/// Policy approval plus the blocking rule
pub mod eligibility;

/// Submit several operations as one scheduler job
pub mod bundle;

/// Job script text and processor accounting
pub mod script;

/// Per-project policy hooks
pub mod project;

pub mod scheduler;

/// SLURM client and header template
pub mod slurm;

pub mod submit;

pub mod report;

pub use error::{FlowError, Result};

/// Project root directory: job database, bundle files and rendered scripts
pub struct WorkingDirectory {
    pub path: PathBuf,
}
