use thiserror::Error;

use crate::types::StepName;

#[derive(Debug, Error)]
pub enum ProvostError {
    #[error("course not found: {0}")]
    CourseNotFound(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("course {course} is not in {expected} state (current: {current})")]
    WrongState {
        course: String,
        expected: String,
        current: String,
    },

    #[error("combined-track courses require at least one group")]
    GroupsRequired,

    #[error("no step record for '{step}' on course {course}")]
    StepRecordMissing { course: String, step: StepName },

    #[error("{resource} not recorded — ensure step '{step}' ran first")]
    MissingPrerequisite { resource: String, step: StepName },

    #[error("missing required configuration: {0}")]
    MissingConfig(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("job already admitted: {0}")]
    DuplicateJob(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("vendor call '{action}' failed: {message}")]
    Vendor { action: String, message: String },

    /// Non-fatal, environment-imposed vendor restriction (e.g. a plan-tier
    /// limitation). Steps treat this as best-effort success.
    #[error("vendor restriction: {0}")]
    VendorRestricted(String),

    #[error("queue error: {0}")]
    Queue(String),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProvostError>;
