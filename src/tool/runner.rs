//! ToolRunner trait for invoking the external analysis tool

use std::path::Path;

use async_trait::async_trait;

use crate::tool::types::ToolOutput;

/// Runs the analysis tool against a file on disk
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Runs the tool once for `path`.
    ///
    /// Never fails outright: launch and exit problems are reported through
    /// [`ToolOutput::error`] so that partial stdout can still be used.
    async fn run(&self, path: &Path) -> ToolOutput;
}
