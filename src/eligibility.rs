//! Decide whether a (job, operation) pair may be submitted
//!
//! A pair is eligible when the project's policy approves it and no earlier submission of the
//! same operation session is still at or beyond `submitted`. Re-running a submission against
//! the same workspace therefore never submits the same work twice.

use log::debug;

use crate::db::Job;
use crate::error::{FlowError, Result};
use crate::project::Project;
use crate::status::store::session_id;
use crate::status::{StatusLevel, StatusStore};

/// Answer of a project's eligibility policy
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    NotEligible,
    /// The policy has no answer for this pair, which is a configuration error
    Undefined,
}

impl From<bool> for Eligibility {
    fn from(eligible: bool) -> Self {
        match eligible {
            true => Eligibility::Eligible,
            false => Eligibility::NotEligible,
        }
    }
}

impl From<Option<bool>> for Eligibility {
    fn from(eligible: Option<bool>) -> Self {
        eligible.map_or(Eligibility::Undefined, Eligibility::from)
    }
}

pub fn is_blocked(status: &StatusStore, job: &Job, operation: &str) -> Result<bool> {
    let session = session_id(job, operation);
    Ok(matches!(status.level(job, &session)?, Some(level) if level >= StatusLevel::Submitted))
}

pub fn is_eligible(project: &dyn Project, status: &StatusStore, job: &Job, operation: &str) -> Result<bool> {
    match project.eligible(job, operation) {
        Eligibility::Eligible => {
            let blocked = is_blocked(status, job, operation)?;
            if blocked {
                debug!("{} is blocked by an earlier submission", session_id(job, operation));
            }
            Ok(!blocked)
        }
        Eligibility::NotEligible => Ok(false),
        Eligibility::Undefined => Err(FlowError::EligibilityUndefined {
            job: job.id().to_string(),
            operation: operation.to_string(),
        }),
    }
}
