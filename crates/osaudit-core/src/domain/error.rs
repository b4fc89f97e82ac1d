//! Error taxonomy for osaudit.
//!
//! [`AuditError`] covers infrastructure and configuration failures, which
//! abort a run. [`CheckError`] covers a single check that could not reach a
//! verdict; the scheduler turns it into an `Error` record and carries on.

use std::time::Duration;

/// Fatal errors: invalid configuration or a broken run.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("invalid check id {id:?}: {reason}")]
    InvalidCheckId { id: String, reason: String },

    #[error("invalid level {0}: expected 0 (any), 1 or 2")]
    InvalidLevel(u8),

    #[error("invalid concurrency {0}: must be at least 1")]
    InvalidConcurrency(usize),

    #[error("duplicate check id in catalog: {0}")]
    DuplicateCheck(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("check task failed to join: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("scheduler closed before all checks were submitted")]
    SchedulerClosed,

    #[error("result aggregator still shared after drain ({holders} holders)")]
    ResultsStillShared { holders: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for osaudit infrastructure operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// A single check could not decide between pass and fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("probe failed: {0}")]
    Probe(String),

    #[error("malformed data in {source_name}: {detail}")]
    Malformed { source_name: String, detail: String },

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("check panicked: {0}")]
    Panicked(String),
}

impl CheckError {
    pub fn malformed(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Malformed {
            source_name: source_name.into(),
            detail: detail.into(),
        }
    }
}
