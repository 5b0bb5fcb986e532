use rusqlite::Connection;

use crate::db::job::{load, update, Document, Job, StatePoint};
use crate::db::open::{open_db, open_in_memory};
use crate::error::Result;
use crate::WorkingDirectory;

/// Access to jobs and their documents
///
/// Documents are always read and written whole: there is no partial update.
pub trait JobStore {
    fn open_job(&self, id: &str) -> Result<Job>;
    fn find_jobs(&self, filter: Option<&StatePoint>) -> Result<Vec<Job>>;
    fn document(&self, job: &Job) -> Result<Document>;
    fn write_document(&self, job: &Job, document: &Document) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(wd: &WorkingDirectory) -> Result<SqliteStore> {
        Ok(SqliteStore { conn: open_db(wd)? })
    }

    pub fn in_memory() -> Result<SqliteStore> {
        Ok(SqliteStore { conn: open_in_memory()? })
    }

    pub fn insert_job(&self, statepoint: StatePoint) -> Result<Job> {
        update::insert_job(&self.conn, statepoint)
    }
}

impl JobStore for SqliteStore {
    fn open_job(&self, id: &str) -> Result<Job> {
        load::load_job(&self.conn, id)
    }

    fn find_jobs(&self, filter: Option<&StatePoint>) -> Result<Vec<Job>> {
        load::load_jobs(&self.conn, filter)
    }

    fn document(&self, job: &Job) -> Result<Document> {
        load::load_document(&self.conn, job.id())
    }

    fn write_document(&self, job: &Job, document: &Document) -> Result<()> {
        update::update_document(&self.conn, job.id(), document)
    }
}
