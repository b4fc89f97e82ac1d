//! Immutable per-run parameters.

use std::num::NonZeroUsize;
use std::time::Duration;

use super::check::RequestedLevel;
use super::error::{AuditError, Result};
use super::id::CheckId;

/// Concurrency bound used when nothing else is configured.
pub const FALLBACK_CONCURRENCY: usize = 4;

/// How accepted checks are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Checks run as independent tasks, bounded by `max_concurrency`.
    #[default]
    Concurrent,
    /// Checks run inline one after another, in catalog order.
    Sequential,
}

/// Parameters of one audit run. Built once, then shared read-only.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub requested_level: RequestedLevel,
    pub include: Vec<CheckId>,
    pub exclude: Vec<CheckId>,
    pub max_concurrency: NonZeroUsize,
    pub mode: ExecutionMode,
    pub check_timeout: Option<Duration>,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            requested_level: RequestedLevel::Any,
            include: Vec::new(),
            exclude: Vec::new(),
            max_concurrency: default_concurrency(),
            mode: ExecutionMode::Concurrent,
            check_timeout: None,
        }
    }
}

impl RunRequest {
    pub fn with_level(mut self, level: u8) -> Result<Self> {
        self.requested_level = RequestedLevel::try_from(level)?;
        Ok(self)
    }

    pub fn with_include<I, S>(mut self, ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include = parse_ids(ids)?;
        Ok(self)
    }

    pub fn with_exclude<I, S>(mut self, ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude = parse_ids(ids)?;
        Ok(self)
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Result<Self> {
        self.max_concurrency = NonZeroUsize::new(max).ok_or(AuditError::InvalidConcurrency(max))?;
        Ok(self)
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_check_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.check_timeout = timeout;
        self
    }

    pub fn is_sequential(&self) -> bool {
        self.mode == ExecutionMode::Sequential
    }
}

/// Available parallelism of the host, or [`FALLBACK_CONCURRENCY`].
pub fn default_concurrency() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(
        NonZeroUsize::new(FALLBACK_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
    )
}

/// Parse identifiers, splitting comma-separated entries and dropping blanks.
pub fn parse_ids<I, S>(ids: I) -> Result<Vec<CheckId>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = Vec::new();
    for raw in ids {
        for part in raw.as_ref().split(',') {
            if part.trim().is_empty() {
                continue;
            }
            let id = CheckId::parse(part)?;
            if !parsed.contains(&id) {
                parsed.push(id);
            }
        }
    }
    Ok(parsed)
}
