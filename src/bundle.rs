//! Group operation sessions into one scheduler submission and recover them again
//!
//! The scheduler only knows a bundle as a single job. Its sessions are kept in a plain text
//! file in the project root, one session id per line, named after the project and the SHA-1
//! of the dot-joined session ids. The file name doubles as the submission name, so a bundle
//! reported by the scheduler can always be opened again. Bundle files are never removed.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, info};
use sha1::{Digest, Sha1};

use crate::error::Result;
use crate::scheduler::ClusterJob;

/// Consecutive batches of `size` items, or a single batch of everything when `size` is `None`
///
/// Iteration ends with the first empty batch, i.e. once the input is exhausted.
pub struct Chunks<I> {
    inner: I,
    size: Option<usize>,
}

pub fn chunks<I: Iterator>(inner: I, size: Option<usize>) -> Chunks<I> {
    Chunks { inner, size }
}

impl<I: Iterator> Iterator for Chunks<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<I::Item> = match self.size {
            Some(size) => self.inner.by_ref().take(size).collect(),
            None => self.inner.by_ref().collect(),
        };
        match batch.is_empty() {
            true => None,
            false => Some(batch),
        }
    }
}

pub struct Bundles<'a> {
    project: &'a str,
    root: &'a Path,
}

impl<'a> Bundles<'a> {
    pub fn new(project: &'a str, root: &'a Path) -> Bundles<'a> {
        Bundles { project, root }
    }

    fn prefix(&self) -> String {
        format!("{}-bundle-", self.project)
    }

    /// `<project>-bundle-` followed by a lowercase hex SHA-1 digest
    pub fn is_bundle(&self, name: &str) -> bool {
        match name.strip_prefix(&self.prefix()) {
            Some(digest) => digest.len() == 40 && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')),
            None => false,
        }
    }

    pub fn path(&self, bundle_id: &str) -> PathBuf {
        self.root.join(bundle_id)
    }

    /// Write the session ids of one submission and return the bundle id
    ///
    /// Storing the same ordered ids twice rewrites the same file.
    pub fn store(&self, session_ids: &[String]) -> Result<String> {
        let digest = Sha1::digest(session_ids.join(".").as_bytes());
        let bundle_id = format!("{}{}", self.prefix(), hex::encode(digest));

        let mut content = String::new();
        for session in session_ids {
            content.push_str(session);
            content.push('\n');
        }
        let path = self.path(&bundle_id);
        info!("Writing {} sessions to bundle {}", session_ids.len(), path.display());
        fs::write(path, content)?;
        Ok(bundle_id)
    }

    /// Session ids of a stored bundle, in submission order
    pub fn read(&self, bundle_id: &str) -> Result<Vec<String>> {
        let file = File::open(self.path(bundle_id))?;
        let mut sessions = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let session = line.trim();
            if !session.is_empty() {
                sessions.push(session.to_string());
            }
        }
        Ok(sessions)
    }

    /// Replace every bundle the scheduler reports by its sessions, all sharing the bundle's status
    pub fn expand(&self, scheduler_jobs: Vec<ClusterJob>) -> Result<Vec<ClusterJob>> {
        let mut expanded = Vec::with_capacity(scheduler_jobs.len());
        for job in scheduler_jobs {
            if self.is_bundle(job.name()) {
                let sessions = self.read(job.name())?;
                debug!("Expanding bundle {} into {} sessions", job.name(), sessions.len());
                expanded.extend(sessions.iter().map(|session| ClusterJob::new(session, job.status())));
            } else {
                expanded.push(job);
            }
        }
        Ok(expanded)
    }
}
