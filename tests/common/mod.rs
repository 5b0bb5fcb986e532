#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use jobflow::db::{Job, SqliteStore};
use jobflow::eligibility::Eligibility;
use jobflow::error::{FlowError, Result};
use jobflow::project::Project;
use jobflow::scheduler::{ClusterJob, Scheduler, Submission};
use jobflow::script::{mpirun, JobScript, MpiWrapper};

/// Project whose operations need as many processors as the state-point's `np`
pub struct TestProject {
    root: PathBuf,
    pub policy: Eligibility,
    pub done: Vec<String>,
    pub with_mpi: bool,
    pub forget_np: bool,
}

impl TestProject {
    pub fn new(root: &Path) -> TestProject {
        TestProject {
            root: root.to_path_buf(),
            policy: Eligibility::Eligible,
            done: Vec::new(),
            with_mpi: true,
            forget_np: false,
        }
    }
}

impl Project for TestProject {
    fn name(&self) -> &str {
        "demo"
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn eligible(&self, _job: &Job, _operation: &str) -> Eligibility {
        self.policy
    }

    fn classify(&self, job: &Job) -> Vec<String> {
        match self.done.iter().any(|id| id == job.id()) {
            true => vec!["done".to_string(), "started".to_string(), "done".to_string()],
            false => vec!["started".to_string()],
        }
    }

    fn next_operation(&self, _job: &Job) -> Option<String> {
        Some("run".to_string())
    }

    fn mpi_wrapper(&self) -> Option<&MpiWrapper> {
        let wrap: &MpiWrapper = &mpirun;
        self.with_mpi.then_some(wrap)
    }

    fn write_user(
        &self,
        script: &mut JobScript,
        job: &Job,
        operation: &str,
        parallel: bool,
        mpi: Option<&MpiWrapper>,
    ) -> Result<Option<u32>> {
        script.write_statepoint(job)?;
        let np = job.statepoint().get("np").and_then(Value::as_u64).unwrap_or(1) as u32;
        let np = script.write_cmd(&format!("./run {operation} {job}"), parallel, np, mpi)?;
        match self.forget_np {
            true => Ok(None),
            false => Ok(Some(np)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub script: String,
    pub name: String,
    pub np: u32,
    pub pretend: bool,
    pub after: Vec<String>,
}

/// Scheduler that remembers submissions and reports a configurable queue
#[derive(Default)]
pub struct MockScheduler {
    pub submitted: RefCell<Vec<Recorded>>,
    pub queue: RefCell<Vec<ClusterJob>>,
    pub fail: bool,
}

impl Scheduler for MockScheduler {
    fn jobs(&self) -> Result<Vec<ClusterJob>> {
        Ok(self.queue.borrow().clone())
    }

    fn submit(&self, submission: &Submission) -> Result<String> {
        if self.fail {
            return Err(FlowError::Scheduler("queue is down".to_string()));
        }
        let mut submitted = self.submitted.borrow_mut();
        submitted.push(Recorded {
            script: submission.script.to_string(),
            name: submission.name.to_string(),
            np: submission.np,
            pretend: submission.pretend,
            after: submission.after.to_vec(),
        });
        Ok(format!("{}", 1000 + submitted.len()))
    }
}

pub fn add_job(store: &SqliteStore, statepoint: Value) -> Job {
    store.insert_job(statepoint.as_object().cloned().unwrap()).unwrap()
}

pub fn add_jobs(store: &SqliteStore, nps: &[u32]) -> Vec<Job> {
    nps.iter().enumerate().map(|(i, np)| add_job(store, json!({"i": i, "np": np}))).collect()
}
