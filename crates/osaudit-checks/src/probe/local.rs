//! [`Host`] implementation backed by the running system.

use std::io::ErrorKind;
use std::os::unix::fs::MetadataExt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use super::{CommandOutput, FileStat, Host, ProbeError};

/// Upper bound for a single external command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct LocalHost {
    command_timeout: Duration,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn read_file(&self, path: &str) -> Result<Option<String>, ProbeError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ProbeError::Read {
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn stat(&self, path: &str) -> Result<Option<FileStat>, ProbeError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(Some(FileStat {
                mode: meta.mode() & 0o7777,
                uid: meta.uid(),
                gid: meta.gid(),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ProbeError::Read {
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ProbeError> {
        trace!(program, ?args, "running probe command");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => ProbeError::CommandNotFound(program.to_string()),
                _ => ProbeError::Spawn {
                    program: program.to_string(),
                    source,
                },
            })?;

        let output = tokio::time::timeout(self.command_timeout, child.wait_with_output())
            .await
            .map_err(|_| ProbeError::TimedOut {
                program: program.to_string(),
                limit: self.command_timeout,
            })?
            .map_err(|source| ProbeError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
