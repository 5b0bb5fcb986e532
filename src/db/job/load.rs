use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};

use crate::db::job::{Document, Job, StatePoint};
use crate::error::{FlowError, Result};

pub fn load_job(conn: &Connection, id: &str) -> Result<Job> {
    let statepoint: Option<String> = conn
        .query_row("SELECT statepoint FROM job WHERE id = (?1)", [id], |row| row.get(0))
        .optional()?;

    match statepoint {
        Some(json) => Ok(Job::new(serde_json::from_str::<StatePoint>(&json)?)),
        None => Err(FlowError::JobNotFound(id.to_string())),
    }
}

pub fn load_jobs(conn: &Connection, filter: Option<&StatePoint>) -> Result<Vec<Job>> {
    let mut stmt = conn.prepare("SELECT statepoint FROM job ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut jobs: Vec<Job> = Vec::new();
    for row in rows {
        let job = Job::new(serde_json::from_str::<StatePoint>(&row?)?);
        match filter {
            Some(filter) if !job.matches(filter) => debug!("Job {job} does not match filter"),
            _ => jobs.push(job),
        }
    }

    info!("Loaded {} jobs from db", jobs.len());
    Ok(jobs)
}

pub fn load_document(conn: &Connection, id: &str) -> Result<Document> {
    let document: Option<String> = conn
        .query_row("SELECT document FROM job WHERE id = (?1)", [id], |row| row.get(0))
        .optional()?;

    match document {
        Some(json) => Ok(serde_json::from_str::<Document>(&json)?),
        None => Err(FlowError::JobNotFound(id.to_string())),
    }
}
