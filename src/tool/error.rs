use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to open {path:?} for the analysis tool: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch analysis tool: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Analysis tool exited with status {0}")]
    ExitStatus(i32),

    #[error("Analysis tool was terminated by a signal")]
    Terminated,

    #[error("Analysis tool timed out after {0:?}")]
    Timeout(Duration),
}
