//! Shell-based ToolRunner implementation

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::ServerConfig;
use crate::tool::error::ToolError;
use crate::tool::runner::ToolRunner;
use crate::tool::types::ToolOutput;

/// Runs the analysis tool as a shell command line, one process per call.
///
/// The target file is connected to the tool's stdin, so the command line
/// itself never contains the (untrusted) path.
pub struct ShellToolRunner {
    command: String,
    timeout: Option<Duration>,
}

impl ShellToolRunner {
    /// Creates a runner for `command` with no timeout
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.command.clone()).with_timeout(config.timeout)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[cfg(not(windows))]
    fn shell() -> Command {
        let mut command = Command::new("sh");
        command.arg("-c");
        command
    }

    #[cfg(windows)]
    fn shell() -> Command {
        let mut command = Command::new("cmd");
        command.arg("/C");
        command
    }

    fn build_command(&self, input: std::fs::File) -> Command {
        let mut command = Self::shell();
        command
            .arg(&self.command)
            .stdin(Stdio::from(input))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl ToolRunner for ShellToolRunner {
    async fn run(&self, path: &Path) -> ToolOutput {
        debug!(command = %self.command, path = %path.display(), "Running analysis tool");

        let input = match tokio::fs::File::open(path).await {
            Ok(file) => file.into_std().await,
            Err(source) => {
                return ToolOutput::failed(ToolError::Input {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut command = self.build_command(input);
        let result = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, command.output()).await {
                Ok(result) => result,
                // Dropping the future kills the child (kill_on_drop)
                Err(_) => return ToolOutput::failed(ToolError::Timeout(timeout)),
            },
            None => command.output().await,
        };

        let output = match result {
            Ok(output) => output,
            Err(e) => return ToolOutput::failed(ToolError::Spawn(e)),
        };

        let captured = ToolOutput::new(
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        debug!(
            status = %output.status,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Analysis tool finished"
        );

        if output.status.success() {
            return captured;
        }

        match output.status.code() {
            Some(code) => captured.with_error(ToolError::ExitStatus(code)),
            None => captured.with_error(ToolError::Terminated),
        }
    }
}
