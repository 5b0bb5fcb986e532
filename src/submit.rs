//! Submission pipeline: candidates -> eligibility -> units -> scripts -> scheduler
//!
//! Candidates are checked lazily, one at a time, so statuses written for earlier units are
//! seen by later eligibility checks. Every session of a unit is marked `submitted` (or
//! `registered` when pretending) before the scheduler is called: a crash after that point
//! leaves the session blocked rather than risking a second submission. Nothing is rolled back
//! when a later step fails.

use std::collections::HashSet;

use chrono::Duration;
use log::{debug, info};

use crate::bundle::{chunks, Bundles};
use crate::db::job::StatePoint;
use crate::db::{Job, JobStore};
use crate::eligibility::is_eligible;
use crate::error::{FlowError, Result};
use crate::project::{HeaderContext, Project};
use crate::scheduler::{Scheduler, Submission};
use crate::script::{Composition, JobScript};
use crate::status::store::session_id;
use crate::status::{StatusLevel, StatusStore};

/// Default walltime for the command line interface
pub const DEFAULT_WALLTIME_HRS: i64 = 12;

/// A (job, operation) pair waiting to be submitted
pub type Candidate = (Job, String);

#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub walltime: Option<Duration>,
    /// Sessions per submission; `Some(0)` bundles everything that is eligible
    pub bundle: Option<usize>,
    /// Run bundled operations one after another, and chain unbundled submissions
    pub serial: bool,
    /// Colon-separated scheduler ids every submission has to wait for
    pub after: Option<String>,
    /// Submit at most this many sessions
    pub num: Option<usize>,
    pub pretend: bool,
    /// Skip eligibility checks
    pub force: bool,
    pub hold: bool,
}

/// What one invocation handed to the scheduler
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SubmitSummary {
    pub sessions: Vec<String>,
    pub scheduler_ids: Vec<String>,
}

pub struct Submitter<'a> {
    project: &'a dyn Project,
    store: &'a dyn JobStore,
    scheduler: &'a dyn Scheduler,
}

impl<'a> Submitter<'a> {
    pub fn new(project: &'a dyn Project, store: &'a dyn JobStore, scheduler: &'a dyn Scheduler) -> Submitter<'a> {
        Submitter { project, store, scheduler }
    }

    /// Pair jobs with operations
    ///
    /// Jobs are the given ids, or every job matching `filter`. The operation is the given one,
    /// or each job's next operation; jobs without a next operation are left out.
    pub fn to_submit(&self, job_ids: Option<&[String]>, operation: Option<&str>, filter: Option<&StatePoint>) -> Result<Vec<Candidate>> {
        let jobs = match job_ids {
            Some(ids) => ids.iter().map(|id| self.store.open_job(id)).collect::<Result<Vec<Job>>>()?,
            None => self.store.find_jobs(filter)?,
        };

        let candidates = jobs
            .into_iter()
            .filter_map(|job| {
                let operation = match operation {
                    Some(operation) => Some(operation.to_string()),
                    None => self.project.next_operation(&job),
                };
                match operation {
                    Some(operation) => Some((job, operation)),
                    None => {
                        debug!("No next operation for job {job}");
                        None
                    }
                }
            })
            .collect();
        Ok(candidates)
    }

    pub fn submit_jobs(&self, to_submit: Vec<Candidate>, options: &SubmitOptions) -> Result<SubmitSummary> {
        let status = StatusStore::new(self.store);
        // sessions already handed out in this run; a bundle is filled before its statuses are written
        let mut taken = HashSet::new();
        let eligible = to_submit.into_iter().filter_map(|(job, operation)| {
            if !taken.insert(session_id(&job, &operation)) {
                debug!("Skipping repeated operation {operation} of job {job}");
                return None;
            }
            if options.force {
                return Some(Ok((job, operation)));
            }
            match is_eligible(self.project, &status, &job, &operation) {
                Ok(true) => Some(Ok((job, operation))),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            }
        });
        let capped = eligible.take(options.num.unwrap_or(usize::MAX));

        let mut after: Vec<String> = options
            .after
            .iter()
            .flat_map(|after| after.split(':'))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        let mut summary = SubmitSummary::default();

        match options.bundle {
            Some(size) => {
                let size = if size == 0 { None } else { Some(size) };
                for unit in chunks(capped, size) {
                    let unit = unit.into_iter().collect::<Result<Vec<Candidate>>>()?;
                    self.submit_unit(&status, unit, options, &after, &mut summary)?;
                }
            }
            None => {
                for candidate in capped {
                    self.submit_unit(&status, vec![candidate?], options, &after, &mut summary)?;
                    // serial submissions each wait for the previous one
                    if options.serial {
                        after.extend(summary.scheduler_ids.last().cloned());
                    }
                }
            }
        }

        info!("Submitted {} sessions in {} submissions", summary.sessions.len(), summary.scheduler_ids.len());
        Ok(summary)
    }

    /// [`Submitter::to_submit`] followed by [`Submitter::submit_jobs`]
    pub fn submit(
        &self,
        job_ids: Option<&[String]>,
        operation: Option<&str>,
        filter: Option<&StatePoint>,
        options: &SubmitOptions,
    ) -> Result<SubmitSummary> {
        let to_submit = self.to_submit(job_ids, operation, filter)?;
        self.submit_jobs(to_submit, options)
    }

    /// Render, mark and submit one non-empty unit of distinct sessions
    fn submit_unit(
        &self,
        status: &StatusStore,
        unit: Vec<Candidate>,
        options: &SubmitOptions,
        after: &[String],
        summary: &mut SubmitSummary,
    ) -> Result<()> {
        let parallel = !options.serial && options.bundle.is_some();
        let composition = match options.serial {
            true => Composition::Serial,
            false => Composition::Parallel,
        };

        let mut script = JobScript::new();
        let header = HeaderContext {
            project: self.project.name(),
            walltime: options.walltime,
            serial: options.serial,
            bundle: options.bundle,
            after,
            hold: options.hold,
        };
        self.project.write_header(&mut script, &header)?;

        let mut sessions: Vec<String> = Vec::with_capacity(unit.len());
        for (job, operation) in &unit {
            let session = session_id(job, operation);
            script.enter(&session);
            let np = self
                .project
                .write_user(&mut script, job, operation, parallel, self.project.mpi_wrapper())?
                .ok_or_else(|| FlowError::UndeterminedProcessorCount {
                    job: job.id().to_string(),
                    operation: operation.clone(),
                })?;
            script.account(np);
            sessions.push(session);
        }
        script.finish();

        let level = match options.pretend {
            true => StatusLevel::Registered,
            false => StatusLevel::Submitted,
        };
        for ((job, _), session) in unit.iter().zip(&sessions) {
            status.set(job, session, level)?;
        }

        let name = match sessions.as_slice() {
            [session] => session.clone(),
            _ => Bundles::new(self.project.name(), self.project.root()).store(&sessions)?,
        };
        let submission = Submission {
            script: script.content(),
            name: &name,
            np: script.processors(composition),
            walltime: options.walltime,
            pretend: options.pretend,
            after,
            hold: options.hold,
        };
        let scheduler_id = self.scheduler.submit(&submission)?;
        info!("Submitted {name} as {scheduler_id}");

        summary.sessions.extend(sessions);
        summary.scheduler_ids.push(scheduler_id);
        Ok(())
    }
}
