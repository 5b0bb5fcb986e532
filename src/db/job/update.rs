use log::{debug, info};
use rusqlite::Connection;

use crate::db::job::{Document, Job, StatePoint};
use crate::error::{FlowError, Result};

/// Insert a job, or return the existing one if the state-point is already known
pub fn insert_job(conn: &Connection, statepoint: StatePoint) -> Result<Job> {
    let job = Job::new(statepoint);
    let json = serde_json::to_string(job.statepoint())?;
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO job (id, statepoint) VALUES (?1, ?2)",
        (job.id(), &json),
    )?;

    match inserted {
        0 => debug!("Job {job} already exists"),
        _ => info!("Adding job {job} to db"),
    }
    Ok(job)
}

/// Replace the whole document of a job
pub fn update_document(conn: &Connection, id: &str, document: &Document) -> Result<()> {
    let json = serde_json::to_string(document)?;
    debug!("Updating document of {id}");
    let updated = conn.execute("UPDATE job SET document = (?1) WHERE id = (?2)", (&json, id))?;

    match updated {
        0 => Err(FlowError::JobNotFound(id.to_string())),
        _ => Ok(()),
    }
}
