//! Job handles, loading, and document updates
//!
//! A job is identified by the SHA-1 of its state-point, so opening the same parameters twice
//! always yields the same job. The job document is a free-form JSON object owned by the store.

use std::fmt;

use serde_json::{Map, Value};
use sha1::{Digest, Sha1};

pub mod load;
pub mod update;

pub type StatePoint = Map<String, Value>;
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: String,
    statepoint: StatePoint,
}

impl Job {
    pub fn new(statepoint: StatePoint) -> Job {
        let id = calc_id(&statepoint);
        Job { id, statepoint }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn statepoint(&self) -> &StatePoint {
        &self.statepoint
    }

    /// Check the state-point against a filter of `key: value` pairs
    ///
    /// Keys may use dots to reach into nested objects, e.g. `{"system.n": 3}`.
    pub fn matches(&self, filter: &Map<String, Value>) -> bool {
        filter.iter().all(|(key, expected)| lookup(&self.statepoint, key) == Some(expected))
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// serde_json maps are sorted by key, so the compact serialisation is canonical
fn calc_id(statepoint: &StatePoint) -> String {
    let canonical = Value::Object(statepoint.clone()).to_string();
    hex::encode(Sha1::digest(canonical.as_bytes()))
}

pub fn lookup<'a>(statepoint: &'a StatePoint, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let first = statepoint.get(parts.next()?)?;
    parts.try_fold(first, |value, part| value.get(part))
}
