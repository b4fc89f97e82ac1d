//! File-backed run profiles.
//!
//! A profile is a small TOML document:
//!
//! ```toml
//! level = 1
//! include = ["1", "5.2"]
//! exclude = ["1.1.1.3"]
//! jobs = 8
//! check_timeout_secs = 30
//! ```
//!
//! Values given on the command line are merged on top with
//! [`AuditConfig::merge`], then [`AuditConfig::into_request`] validates the
//! result into a [`RunRequest`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ExecutionMode, Result, RunRequest};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// 0 (any), 1 or 2.
    pub level: Option<u8>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Maximum simultaneously running checks.
    pub jobs: Option<usize>,
    /// Per-check deadline; 0 disables it.
    pub check_timeout_secs: Option<u64>,
    /// Run checks one at a time in catalog order.
    pub sequential: bool,
}

impl AuditConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading audit profile from '{}'", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Overlay `overrides` on top of `self`. Set values in `overrides` win.
    pub fn merge(self, overrides: AuditConfig) -> Self {
        Self {
            level: overrides.level.or(self.level),
            include: if overrides.include.is_empty() {
                self.include
            } else {
                overrides.include
            },
            exclude: if overrides.exclude.is_empty() {
                self.exclude
            } else {
                overrides.exclude
            },
            jobs: overrides.jobs.or(self.jobs),
            check_timeout_secs: overrides.check_timeout_secs.or(self.check_timeout_secs),
            sequential: self.sequential || overrides.sequential,
        }
    }

    /// Validate into the immutable request for a run.
    pub fn into_request(self) -> Result<RunRequest> {
        let mut request = RunRequest::default()
            .with_level(self.level.unwrap_or(0))?
            .with_include(&self.include)?
            .with_exclude(&self.exclude)?;
        if let Some(jobs) = self.jobs {
            request = request.with_max_concurrency(jobs)?;
        }
        let timeout = self
            .check_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let mode = if self.sequential {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Concurrent
        };
        Ok(request.with_check_timeout(timeout).with_mode(mode))
    }
}
