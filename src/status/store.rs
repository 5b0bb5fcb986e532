use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::db::{Job, JobStore};
use crate::error::Result;
use crate::status::StatusLevel;

/// Key of the status mapping inside a job document
static STATUS_KEY: &str = "status";

/// Operation session id -> status level
pub type StatusDocument = BTreeMap<String, StatusLevel>;

/// Unique id of one (job, operation) combination
pub fn session_id(job: &Job, operation: &str) -> String {
    format!("{job}-{operation}")
}

/// True if any session of the job is past `Inactive`
pub fn is_active(status: &StatusDocument) -> bool {
    status.values().any(|level| *level > StatusLevel::Inactive)
}

/// Highest recorded level, `Unknown` if nothing is recorded
pub fn highest(status: &StatusDocument) -> StatusLevel {
    status.values().copied().max().unwrap_or(StatusLevel::Unknown)
}

pub struct StatusStore<'a> {
    store: &'a dyn JobStore,
}

impl<'a> StatusStore<'a> {
    pub fn new(store: &'a dyn JobStore) -> StatusStore<'a> {
        StatusStore { store }
    }

    pub fn get(&self, job: &Job) -> Result<StatusDocument> {
        let document = self.store.document(job)?;
        Ok(parse(document.get(STATUS_KEY)))
    }

    pub fn level(&self, job: &Job, session: &str) -> Result<Option<StatusLevel>> {
        Ok(self.get(job)?.get(session).copied())
    }

    pub fn highest(&self, job: &Job) -> Result<StatusLevel> {
        Ok(highest(&self.get(job)?))
    }

    /// Overwrite one session's level, leaving every other entry of the document untouched
    pub fn set(&self, job: &Job, session: &str, level: StatusLevel) -> Result<()> {
        debug!("Setting {session} to {level}");
        let mut document = self.store.document(job)?;
        let mut status = status_object(&document);
        status.insert(session.to_string(), Value::from(level.value()));
        document.insert(STATUS_KEY.to_string(), Value::Object(status));
        self.store.write_document(job, &document)
    }

    /// Write several sessions' levels in one document round-trip
    pub fn set_many(&self, job: &Job, levels: &StatusDocument) -> Result<()> {
        let mut document = self.store.document(job)?;
        let mut status = status_object(&document);
        for (session, level) in levels {
            status.insert(session.clone(), Value::from(level.value()));
        }
        document.insert(STATUS_KEY.to_string(), Value::Object(status));
        self.store.write_document(job, &document)
    }
}

fn status_object(document: &Map<String, Value>) -> Map<String, Value> {
    document.get(STATUS_KEY).and_then(Value::as_object).cloned().unwrap_or_default()
}

fn parse(status: Option<&Value>) -> StatusDocument {
    let Some(entries) = status.and_then(Value::as_object) else {
        return StatusDocument::new();
    };

    entries
        .iter()
        .map(|(session, value)| {
            let level = match value.as_i64() {
                Some(value) => StatusLevel::from_value(value),
                None => {
                    warn!("Status of {session} is not an integer: {value}");
                    StatusLevel::Unknown
                }
            };
            (session.clone(), level)
        })
        .collect()
}
