//! Tool invocation layer
//! - runner.rs: ToolRunner trait definition
//! - shell.rs: Shell-based runner (one process per validation)
//! - types.rs: Captured output (ToolOutput)
//! - error.rs: Launch and exit failures

pub mod error;
pub mod runner;
pub mod shell;
pub mod types;

pub use error::ToolError;
pub use runner::ToolRunner;
pub use shell::ShellToolRunner;
pub use types::ToolOutput;
