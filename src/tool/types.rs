//! Common types for tool invocation

use crate::tool::error::ToolError;

/// Everything captured from one run of the analysis tool.
///
/// The fields are independent: a failed run may still carry usable stdout.
#[derive(Debug, Default)]
pub struct ToolOutput {
    /// Raw report text
    pub stdout: String,
    /// Free-form diagnostic text from the tool
    pub stderr: String,
    /// Set when the tool could not run or did not exit cleanly
    pub error: Option<ToolError>,
}

impl ToolOutput {
    /// Creates a ToolOutput for a run that produced output and exited cleanly
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            error: None,
        }
    }

    /// Creates a ToolOutput for a run that never produced any output
    pub fn failed(error: ToolError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Attaches an error to an otherwise captured run
    pub fn with_error(mut self, error: ToolError) -> Self {
        self.error = Some(error);
        self
    }

    /// Returns stderr if the tool wrote anything meaningful to it
    pub fn stderr_text(&self) -> Option<&str> {
        let trimmed = self.stderr.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
