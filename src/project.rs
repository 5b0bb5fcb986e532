//! Per-project policy: which operations a job needs and how to run them
//!
//! Implement [`Project`] to describe a workflow. Only `name` and `root` are required; the
//! defaults give no eligibility answer (which stops a submission), no labels, no next
//! operation, an empty header and a single-processor `python scripts/run.py` command.

use std::path::Path;

use chrono::Duration;

use crate::db::Job;
use crate::eligibility::Eligibility;
use crate::error::Result;
use crate::script::{JobScript, MpiWrapper};

/// A project driven by one shell command template
pub mod command;

pub use command::CommandProject;

/// Everything known about a submission when its header is written
#[derive(Debug, Clone)]
pub struct HeaderContext<'a> {
    pub project: &'a str,
    pub walltime: Option<Duration>,
    pub serial: bool,
    pub bundle: Option<usize>,
    pub after: &'a [String],
    pub hold: bool,
}

pub trait Project {
    /// Project identity, also the prefix of bundle file names
    fn name(&self) -> &str;

    /// Directory holding bundle files and rendered scripts
    fn root(&self) -> &Path;

    fn eligible(&self, _job: &Job, _operation: &str) -> Eligibility {
        Eligibility::Undefined
    }

    /// Labels describing how far along the job is, e.g. "done"
    fn classify(&self, _job: &Job) -> Vec<String> {
        Vec::new()
    }

    fn next_operation(&self, _job: &Job) -> Option<String> {
        None
    }

    fn mpi_wrapper(&self) -> Option<&MpiWrapper> {
        None
    }

    /// Written once per script, before any operation block
    fn write_header(&self, _script: &mut JobScript, _context: &HeaderContext) -> Result<()> {
        Ok(())
    }

    /// Write the block for one operation and return its processor count
    ///
    /// Commands must honour `parallel`. Returning `Ok(None)` aborts the submission.
    fn write_user(
        &self,
        script: &mut JobScript,
        job: &Job,
        operation: &str,
        parallel: bool,
        mpi: Option<&MpiWrapper>,
    ) -> Result<Option<u32>> {
        script.write_statepoint(job)?;
        let cmd = format!("python scripts/run.py {operation} {job}");
        script.write_cmd(&cmd, parallel, 1, mpi).map(Some)
    }
}
