use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Unable to determine eligibility for job '{job}' and operation '{operation}'")]
    EligibilityUndefined { job: String, operation: String },

    #[error("Operation session '{session}' requires {np} processors but no MPI wrapper was given")]
    MissingMpiWrapper { session: String, np: u32 },

    #[error("write_user() did not return a processor count for job '{job}' and operation '{operation}'")]
    UndeterminedProcessorCount { job: String, operation: String },

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Template(#[from] tinytemplate::error::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;
