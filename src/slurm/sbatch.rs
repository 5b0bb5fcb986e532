use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use crate::error::{FlowError, Result};
use crate::scheduler::{ClusterJob, Scheduler, Submission};
use crate::slurm::format_walltime;
use crate::status::StatusLevel;

/// SLURM client driven through the sbatch and squeue executables
///
/// Rendered scripts are written to `<root>/scripts/<name>.sh` before they are submitted, so
/// they can be inspected afterwards.
pub struct Slurm {
    root: PathBuf,
    user: Option<String>,
    sbatch: PathBuf,
    squeue: PathBuf,
}

impl Slurm {
    pub fn new(root: &Path) -> Slurm {
        Slurm {
            root: root.to_path_buf(),
            user: None,
            sbatch: PathBuf::from("sbatch"),
            squeue: PathBuf::from("squeue"),
        }
    }

    /// Only list jobs of this user
    pub fn with_user(mut self, user: &str) -> Slurm {
        self.user = Some(user.to_string());
        self
    }

    pub fn with_executables(mut self, sbatch: &Path, squeue: &Path) -> Slurm {
        self.sbatch = sbatch.to_path_buf();
        self.squeue = squeue.to_path_buf();
        self
    }

    fn write_script(&self, submission: &Submission) -> Result<PathBuf> {
        let dir = self.root.join("scripts");
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.sh", submission.name));
        info!("Writing job script to {}", path.display());
        fs::write(&path, submission.script)?;
        Ok(path)
    }
}

impl Scheduler for Slurm {
    fn jobs(&self) -> Result<Vec<ClusterJob>> {
        let mut squeue = Command::new(&self.squeue);
        let cmd = squeue.args(["--noheader", "--format=%j %t"]);
        if let Some(user) = &self.user {
            cmd.arg(format!("--user={user}"));
        }
        info!("Running squeue process");
        info!("{:?}", &cmd);
        let output = cmd.output()?;
        if !output.status.success() {
            return Err(FlowError::Scheduler(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }

        Ok(parse_squeue(&String::from_utf8_lossy(&output.stdout)))
    }

    fn submit(&self, submission: &Submission) -> Result<String> {
        if submission.pretend {
            info!("--pretend set, not submitting {}", submission.name);
            println!("{}", submission.script);
            return Ok(format!("pretend-{}", submission.name));
        }

        let path = self.write_script(submission)?;
        let arguments = sbatch_arguments(submission, &path);

        let mut sbatch = Command::new(&self.sbatch);
        let cmd = sbatch.args(&arguments);
        info!("Running sbatch process");
        info!("{:?}", &cmd);
        let output = cmd.output()?;
        if !output.status.success() {
            return Err(FlowError::Scheduler(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }

        parse_job_id(&String::from_utf8_lossy(&output.stdout))
    }
}

fn sbatch_arguments(submission: &Submission, script: &Path) -> Vec<String> {
    let mut arguments = vec![
        "--parsable".to_string(),
        format!("--job-name={}", submission.name),
        format!("--ntasks={}", submission.np.max(1)),
    ];
    if let Some(walltime) = &submission.walltime {
        arguments.push(format!("--time={}", format_walltime(walltime)));
    }
    if !submission.after.is_empty() {
        arguments.push(format!("--dependency=afterok:{}", submission.after.join(":")));
    }
    if submission.hold {
        arguments.push("--hold".to_string());
    }
    arguments.push(script.display().to_string());
    arguments
}

/// `sbatch --parsable` prints `jobid` or `jobid;cluster`
fn parse_job_id(stdout: &str) -> Result<String> {
    match stdout.trim().split(';').next() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(FlowError::Scheduler(format!("Can't read job id from sbatch output: {stdout:?}"))),
    }
}

fn parse_squeue(stdout: &str) -> Vec<ClusterJob> {
    stdout
        .lines()
        .filter_map(|line| match line.trim().rsplit_once(' ') {
            Some((name, state)) => Some(ClusterJob::new(name.trim(), squeue_state(state))),
            None => {
                if !line.trim().is_empty() {
                    warn!("Skipping unreadable squeue line: {line}");
                }
                None
            }
        })
        .collect()
}

/// Map squeue's compact state codes onto status levels
///
/// A job squeue still lists is never reported below `queued` unless it finished.
fn squeue_state(code: &str) -> StatusLevel {
    match code {
        "PD" | "RF" => StatusLevel::Queued,
        "R" | "CG" | "CF" | "SO" | "SI" => StatusLevel::Active,
        "S" | "ST" | "RH" | "RQ" | "RS" | "RD" | "SE" => StatusLevel::Held,
        "F" | "NF" | "TO" | "OOM" | "BF" | "DL" | "PR" => StatusLevel::Error,
        "CD" | "CA" | "RV" => StatusLevel::Inactive,
        _ => {
            warn!("Unexpected squeue state {code:?}, treating it as queued");
            StatusLevel::Queued
        }
    }
}
