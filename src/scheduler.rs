//! Interface to a batch-queue scheduler

use chrono::Duration;

use crate::error::Result;
use crate::status::StatusLevel;

/// A job as reported by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterJob {
    name: String,
    status: StatusLevel,
}

impl ClusterJob {
    pub fn new(name: &str, status: StatusLevel) -> ClusterJob {
        ClusterJob { name: name.to_string(), status }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> StatusLevel {
        self.status
    }
}

/// One rendered script on its way to the scheduler
#[derive(Debug, Clone)]
pub struct Submission<'a> {
    pub script: &'a str,
    /// Operation session id, or bundle id when several sessions share the script
    pub name: &'a str,
    pub np: u32,
    pub walltime: Option<Duration>,
    pub pretend: bool,
    /// Scheduler ids this submission has to wait for
    pub after: &'a [String],
    pub hold: bool,
}

pub trait Scheduler {
    /// Jobs the scheduler currently knows about, possibly belonging to this project
    fn jobs(&self) -> Result<Vec<ClusterJob>>;

    /// Submit a script and return the scheduler's id for it
    ///
    /// With `pretend` set nothing is submitted, but an id is still returned.
    fn submit(&self, submission: &Submission) -> Result<String>;
}
