//! Read-only access to host state.
//!
//! Checks never touch the filesystem or spawn processes directly; they go
//! through a [`Host`], so the same catalog runs against the real machine
//! ([`LocalHost`]) or an in-memory fixture ([`fakes::FakeHost`]).

pub mod fakes;
pub mod local;
pub mod system;

use std::time::Duration;

use async_trait::async_trait;
use osaudit_core::CheckError;

pub use local::LocalHost;

/// Result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (-1 when killed by a signal).
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Ownership and permission bits of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Permission bits only (`mode & 0o7777`).
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

/// Host queries that could not be answered.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command not available: {0}")]
    CommandNotFound(String),

    #[error("{program} timed out after {limit:?}")]
    TimedOut { program: String, limit: Duration },

    #[error("no supported package manager found (dpkg-query or rpm)")]
    NoPackageManager,
}

impl From<ProbeError> for CheckError {
    fn from(err: ProbeError) -> Self {
        CheckError::Probe(err.to_string())
    }
}

/// Read-only view of a machine.
#[async_trait]
pub trait Host: Send + Sync {
    /// Contents of `path`, `None` if it does not exist.
    async fn read_file(&self, path: &str) -> Result<Option<String>, ProbeError>;

    /// Metadata of `path`, `None` if it does not exist.
    async fn stat(&self, path: &str) -> Result<Option<FileStat>, ProbeError>;

    /// Run `program` with `args` and capture its output.
    ///
    /// A non-zero exit is not an error; a missing program is
    /// [`ProbeError::CommandNotFound`].
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ProbeError>;
}
