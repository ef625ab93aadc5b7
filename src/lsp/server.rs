use crate::config::ServerConfig;
use crate::log::init;
use tower_lsp::{LspService, Server};
use tracing::info;

use crate::lsp::backend::Backend;

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let _log_guard = init()?;

    info!("Starting analysis-lsp server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::new(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("analysis-lsp server stopped");
    Ok(())
}
