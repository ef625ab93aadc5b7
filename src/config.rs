use std::path::PathBuf;
use std::time::Duration;

/// Name used for the data directory, log file and server info
pub const SERVER_NAME: &str = "analysis-lsp";

/// Tool invocation used when no `--command` is given.
/// The document's bytes are fed to it on stdin.
pub const DEFAULT_TOOL_COMMAND: &str = "soar -report-type lint";

/// Configuration section requested via `workspace/configuration`
pub const SETTINGS_SECTION: &str = "analysis-tool-settings";

/// Process-level configuration, fixed for the lifetime of the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Shell command line that runs the analysis tool
    pub command: String,
    /// Kill the tool after this long; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn new(command: impl Into<String>, timeout_ms: Option<u64>) -> Self {
        Self {
            command: command.into(),
            timeout: timeout_ms.map(Duration::from_millis),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_COMMAND, None)
    }
}

/// Returns the path to the data directory for analysis-lsp.
/// Uses $XDG_DATA_HOME/analysis-lsp if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/analysis-lsp,
/// or ./analysis-lsp if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the file name of the log file inside [`data_dir`].
pub fn log_file_name() -> String {
    format!("{}.log", SERVER_NAME)
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(log_file_name())
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(SERVER_NAME)
}
