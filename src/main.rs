use clap::Parser;

use analysis_lsp::config::{DEFAULT_TOOL_COMMAND, ServerConfig};
use analysis_lsp::lsp::server::run_server;

/// Language server that publishes diagnostics from an external lint tool
#[derive(Debug, Parser)]
#[command(name = "analysis-lsp", version, about)]
struct Cli {
    /// Shell command that reads a document on stdin and prints `rule:line:message` lines
    #[arg(long, default_value = DEFAULT_TOOL_COMMAND)]
    command: String,

    /// Kill the tool if it runs longer than this many milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Communicate over stdio (the only supported transport)
    #[arg(long = "stdio", hide = true)]
    _stdio: bool,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        ServerConfig::new(self.command, self.timeout_ms)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_server(cli.into_config()).await
}
