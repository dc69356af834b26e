//! Remote command channel over the system `ssh` client

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Exit status `ssh` reserves for its own failures
pub const SSH_CONNECTION_FAILURE: i32 = 255;

/// Captured result of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Authenticated remote command execution.
///
/// Implementations must release the underlying connection when the returned
/// future is dropped, since that is how probe timeouts and run cancellation
/// abandon in-flight work.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Run `command` on `host` as `user` and collect its output.
    ///
    /// Returns `Err(AppError::Timeout)` when the connection attempt timed out
    /// and any other error when the channel could not be established.
    async fn execute(&self, host: &str, user: &str, command: &str) -> Result<CommandOutput>;
}

/// [`RemoteChannel`] backed by the OpenSSH client binary
#[derive(Debug, Clone)]
pub struct SshChannel {
    key_path: PathBuf,
    connect_timeout: Duration,
    program: String,
}

impl SshChannel {
    pub fn new(key_path: impl Into<PathBuf>, connect_timeout: Duration) -> Self {
        Self {
            key_path: key_path.into(),
            connect_timeout,
            program: "ssh".to_string(),
        }
    }

    /// Use a different client binary (e.g. a wrapper script)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Non-interactive client arguments for one invocation
    pub fn build_args(&self, host: &str, user: &str, command: &str) -> Vec<String> {
        let connect_secs = self.connect_timeout.as_secs().max(1);
        vec![
            "-i".to_string(),
            self.key_path.display().to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", connect_secs),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
            format!("{}@{}", user, host),
            command.to_string(),
        ]
    }
}

#[async_trait]
impl RemoteChannel for SshChannel {
    async fn execute(&self, host: &str, user: &str, command: &str) -> Result<CommandOutput> {
        let child = Command::new(&self.program)
            .args(self.build_args(host, user, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::remote(format!("failed to start {}: {}", self.program, e)))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AppError::remote(format!("failed to collect ssh output: {}", e)))?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if result.exit_code == Some(SSH_CONNECTION_FAILURE) && result.stderr.contains("timed out") {
            return Err(AppError::timeout(format!(
                "connection to {} timed out after {}s",
                host,
                self.connect_timeout.as_secs()
            )));
        }

        Ok(result)
    }
}
