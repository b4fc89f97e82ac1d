//! In-memory [`Host`] for tests.
//!
//! Files, stats and command outputs are registered up front; anything not
//! registered behaves as absent (missing file, command not found).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CommandOutput, FileStat, Host, ProbeError};

#[derive(Debug, Default)]
pub struct FakeHost {
    files: Mutex<HashMap<String, String>>,
    stats: Mutex<HashMap<String, FileStat>>,
    commands: Mutex<HashMap<String, CommandOutput>>,
    calls: Mutex<Vec<String>>,
}

fn command_key(program: &str, args: &[&str]) -> String {
    let mut key = program.to_string();
    for arg in args {
        key.push(' ');
        key.push_str(arg);
    }
    key
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file; it also gets a root-owned 0644 stat unless one exists.
    pub fn with_file(self, path: &str, contents: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), contents.to_string());
        self.stats
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_insert(FileStat {
                mode: 0o644,
                uid: 0,
                gid: 0,
            });
        self
    }

    pub fn with_stat(self, path: &str, mode: u32, uid: u32, gid: u32) -> Self {
        self.stats
            .lock()
            .unwrap()
            .insert(path.to_string(), FileStat { mode, uid, gid });
        self
    }

    /// Register the output of `program args...` (matched exactly).
    pub fn with_command(self, program: &str, args: &[&str], exit_code: i32, stdout: &str) -> Self {
        self.commands.lock().unwrap().insert(
            command_key(program, args),
            CommandOutput {
                exit_code,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
        self
    }

    /// Register a command that writes to stderr.
    pub fn with_command_stderr(
        self,
        program: &str,
        args: &[&str],
        exit_code: i32,
        stderr: &str,
    ) -> Self {
        self.commands.lock().unwrap().insert(
            command_key(program, args),
            CommandOutput {
                exit_code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Commands that were run, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Host for FakeHost {
    async fn read_file(&self, path: &str) -> Result<Option<String>, ProbeError> {
        Ok(self.files.lock().unwrap().get(path).cloned())
    }

    async fn stat(&self, path: &str) -> Result<Option<FileStat>, ProbeError> {
        Ok(self.stats.lock().unwrap().get(path).copied())
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ProbeError> {
        let key = command_key(program, args);
        self.calls.lock().unwrap().push(key.clone());
        self.commands
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| ProbeError::CommandNotFound(program.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_host_lookups() {
        let host = FakeHost::new()
            .with_file("/etc/motd", "hi")
            .with_command("systemctl", &["is-enabled", "cron"], 0, "enabled\n");

        assert_eq!(host.read_file("/etc/motd").await.unwrap().as_deref(), Some("hi"));
        assert_eq!(host.stat("/etc/motd").await.unwrap().unwrap().mode, 0o644);
        assert!(host.read_file("/etc/issue").await.unwrap().is_none());

        let out = host.run("systemctl", &["is-enabled", "cron"]).await.unwrap();
        assert_eq!(out.stdout.trim(), "enabled");
        assert!(matches!(
            host.run("modprobe", &["-n"]).await,
            Err(ProbeError::CommandNotFound(_))
        ));
        assert_eq!(host.calls().len(), 2);
    }
}
