//! Status reports: per-job snapshots, scheduler reconciliation, overview and detailed tables

use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};
use serde::Serialize;

use crate::bundle::Bundles;
use crate::db::job::StatePoint;
use crate::db::{Job, JobStore};
use crate::error::Result;
use crate::project::Project;
use crate::scheduler::Scheduler;
use crate::status::store::highest;
use crate::status::{is_active, StatusDocument, StatusLevel, StatusStore};

/// Render aligned plain text tables
pub mod table;
/// Label counts and progress bars
pub mod overview;
/// One row per job
pub mod detailed;

/// Snapshot of one job's progress
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusRecord {
    pub job_id: String,
    pub active: bool,
    pub labels: Vec<String>,
    pub operation: Option<String>,
    pub submission_status: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    pub filter: Option<StatePoint>,
    pub detailed: bool,
    pub parameters: Vec<String>,
    pub skip_active: bool,
}

pub struct Reporter<'a> {
    project: &'a dyn Project,
    store: &'a dyn JobStore,
}

impl<'a> Reporter<'a> {
    pub fn new(project: &'a dyn Project, store: &'a dyn JobStore) -> Reporter<'a> {
        Reporter { project, store }
    }

    pub fn job_status(&self, job: &Job) -> Result<JobStatusRecord> {
        let status = StatusStore::new(self.store).get(job)?;
        let mut labels = self.project.classify(job);
        labels.sort();
        labels.dedup();

        Ok(JobStatusRecord {
            job_id: job.id().to_string(),
            active: is_active(&status),
            labels,
            operation: self.project.next_operation(job),
            submission_status: vec![highest(&status).name().to_string()],
        })
    }

    /// Scheduler jobs by name, with bundles expanded into their sessions
    pub fn fetch_scheduler_jobs(&self, scheduler: &dyn Scheduler) -> Result<HashMap<String, StatusLevel>> {
        let bundles = Bundles::new(self.project.name(), self.project.root());
        let jobs = bundles.expand(scheduler.jobs()?)?;
        Ok(jobs.into_iter().map(|job| (job.name().to_string(), job.status())).collect())
    }

    /// Bring one job's status document in line with what the scheduler reports
    ///
    /// Sessions the scheduler knows take its level, except that an `unknown` report leaves a
    /// blocked session as it is. Sessions that were submitted but are no longer in the queue become
    /// `inactive`, which makes them eligible again.
    pub fn update_status(&self, job: &Job, scheduler_jobs: &HashMap<String, StatusLevel>) -> Result<()> {
        let status = StatusStore::new(self.store);
        let mut changes = StatusDocument::new();
        for (session, level) in status.get(job)? {
            let reported = scheduler_jobs.get(&session).map(|reported| match reported {
                StatusLevel::Unknown if level >= StatusLevel::Submitted => level,
                reported => *reported,
            });
            match reported {
                Some(reported) if reported != level => {
                    changes.insert(session, reported);
                }
                None if level >= StatusLevel::Submitted => {
                    changes.insert(session, StatusLevel::Inactive);
                }
                _ => {}
            }
        }

        if !changes.is_empty() {
            debug!("Updating {} sessions of job {job}", changes.len());
            status.set_many(job, &changes)?;
        }
        Ok(())
    }

    pub fn update_stati(&self, scheduler: &dyn Scheduler, jobs: &[Job], err: &mut dyn Write) -> Result<()> {
        writeln!(err, "Query scheduler...")?;
        let scheduler_jobs = self.fetch_scheduler_jobs(scheduler)?;
        info!("Scheduler reports {} sessions", scheduler_jobs.len());
        writeln!(err, "Determine job stati...")?;
        for job in jobs {
            self.update_status(job, &scheduler_jobs)?;
        }
        writeln!(err, "Done.")?;
        Ok(())
    }

    pub fn print_status(
        &self,
        scheduler: Option<&dyn Scheduler>,
        options: &StatusOptions,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Vec<JobStatusRecord>> {
        let jobs = self.store.find_jobs(options.filter.as_ref())?;
        if let Some(scheduler) = scheduler {
            self.update_stati(scheduler, &jobs, err)?;
        }
        let stati = jobs.iter().map(|job| self.job_status(job)).collect::<Result<Vec<JobStatusRecord>>>()?;

        writeln!(out, "\nStatus project '{}':", self.project.name())?;
        overview::print_overview(&stati, out)?;
        if options.detailed {
            writeln!(out)?;
            writeln!(out, "Detailed view:")?;
            detailed::print_detailed(self.store, &stati, &options.parameters, options.skip_active, out)?;
        }
        Ok(stati)
    }
}
