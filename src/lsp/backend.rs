use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

use crate::config::{SERVER_NAME, ServerConfig};
use crate::lsp::settings::{Settings, SettingsCache};
use crate::lsp::validation::{ValidationOutcome, ValidationReport, Validator};
use crate::tool::{ShellToolRunner, ToolRunner};

const CONFIGURATION_REGISTRATION_ID: &str = "analysis-lsp/didChangeConfiguration";

pub struct Backend {
    client: Client,
    state: Arc<ServerState>,
    workspace_folders_supported: AtomicBool,
}

/// State shared with spawned validation tasks
struct ServerState {
    settings: SettingsCache,
    validator: Validator,
}

impl ServerState {
    async fn validate_document(&self, client: &Client, uri: Url) {
        // The tool does not wait for the settings pull
        let (settings, outcome) =
            tokio::join!(self.settings.get(&uri), self.validator.validate(&uri));

        match outcome {
            ValidationOutcome::Completed(mut report) => {
                report.limit(settings.max_number_of_problems);
                publish(client, uri, report, &settings).await;
            }
            ValidationOutcome::Superseded | ValidationOutcome::Closed => {}
            ValidationOutcome::Unsupported => {
                debug!("Skipping validation for non-file URI {}", uri);
            }
        }
    }
}

async fn publish(client: &Client, uri: Url, report: ValidationReport, settings: &Settings) {
    if let Some(error) = &report.error {
        warn!("Analysis tool failed for {}: {}", uri, error);
        client.log_message(MessageType::LOG, error.to_string()).await;
    }

    if let Some(stderr) = &report.stderr {
        warn!("Analysis tool stderr for {}: {}", uri, stderr);
        client.log_message(MessageType::LOG, stderr).await;
    }

    if report.truncated > 0 {
        info!(
            "Dropped {} diagnostics for {} (maxNumberOfProblems = {})",
            report.truncated, uri, settings.max_number_of_problems
        );
    }

    if !report.should_publish(settings) {
        debug!("No diagnostics for {}, leaving client state unchanged", uri);
        return;
    }

    info!(
        "Publishing {} diagnostics for {}",
        report.diagnostics.len(),
        uri
    );

    client
        .publish_diagnostics(uri, report.diagnostics, None)
        .await;
}

impl Backend {
    pub fn new(client: Client, config: ServerConfig) -> Self {
        info!("Using analysis tool command: {}", config.command);
        let runner = Arc::new(ShellToolRunner::from_config(&config));
        Self::build(client, runner)
    }

    /// Creates a Backend with an explicit tool runner
    pub fn build(client: Client, runner: Arc<dyn ToolRunner>) -> Self {
        let settings = SettingsCache::new(Arc::new(client.clone()));
        Self {
            client,
            state: Arc::new(ServerState {
                settings,
                validator: Validator::new(runner),
            }),
            workspace_folders_supported: AtomicBool::new(false),
        }
    }

    pub fn server_capabilities(workspace_folders: bool) -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    // The tool reads the file on disk, so buffer edits are not needed
                    change: Some(TextDocumentSyncKind::NONE),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(false),
                    })),
                    ..Default::default()
                },
            )),
            workspace: workspace_folders.then(|| WorkspaceServerCapabilities {
                workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                    supported: Some(true),
                    change_notifications: Some(OneOf::Left(true)),
                }),
                file_operations: None,
            }),
            ..Default::default()
        }
    }

    /// Runs a validation in the background so a slow tool never holds up
    /// other notifications or requests
    fn spawn_validation(&self, uri: Url) {
        let state = Arc::clone(&self.state);
        let client = self.client.clone();

        tokio::spawn(async move {
            state.validate_document(&client, uri).await;
        });
    }

    async fn revalidate_open_documents(&self) {
        let uris = self.state.settings.open_documents().await;
        debug!("Revalidating {} open documents", uris.len());

        for uri in uris {
            self.spawn_validation(uri);
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let workspace = params.capabilities.workspace.as_ref();
        let configuration = workspace
            .and_then(|w| w.configuration)
            .unwrap_or(false);
        let workspace_folders = workspace
            .and_then(|w| w.workspace_folders)
            .unwrap_or(false);

        info!(
            configuration,
            workspace_folders, "Client capabilities negotiated"
        );

        self.state.settings.set_pull_supported(configuration);
        self.workspace_folders_supported
            .store(workspace_folders, Ordering::Relaxed);

        self.client
            .log_message(MessageType::INFO, "LSP server initializing")
            .await;
        Ok(InitializeResult {
            capabilities: Self::server_capabilities(workspace_folders),
            server_info: Some(ServerInfo {
                name: SERVER_NAME.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "LSP server initialized")
            .await;

        if !self.state.settings.pull_supported() {
            return;
        }

        let registration = Registration {
            id: CONFIGURATION_REGISTRATION_ID.to_string(),
            method: "workspace/didChangeConfiguration".to_string(),
            register_options: None,
        };

        if let Err(e) = self.client.register_capability(vec![registration]).await {
            warn!("Failed to register for configuration changes: {}", e);
        }
    }

    async fn shutdown(&self) -> Result<()> {
        self.client
            .log_message(MessageType::INFO, "LSP server shutting down")
            .await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;

        self.client
            .log_message(MessageType::LOG, format!("Document opened: {}", uri))
            .await;

        self.state.settings.open(uri.clone()).await;
        self.state.validator.track(&uri).await;
        self.spawn_validation(uri);
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document saved: {}", uri);

        if !self.state.settings.is_open(&uri).await {
            debug!("Ignoring save for document that is not open: {}", uri);
            return;
        }

        self.spawn_validation(uri);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document closed: {}", uri);

        self.state.settings.close(&uri).await;
        self.state.validator.forget(&uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        info!("Configuration changed");

        self.state.settings.apply_change(&params.settings).await;
        self.revalidate_open_documents().await;
    }

    async fn did_change_workspace_folders(&self, _params: DidChangeWorkspaceFoldersParams) {
        if !self.workspace_folders_supported.load(Ordering::Relaxed) {
            return;
        }

        info!("Workspace folder change event received");
        self.client
            .log_message(MessageType::LOG, "Workspace folder change event received.")
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_capabilities_sync_open_close_and_save_without_text() {
        let capabilities = Backend::server_capabilities(false);

        let Some(TextDocumentSyncCapability::Options(sync)) = capabilities.text_document_sync
        else {
            panic!("expected text document sync options");
        };
        assert_eq!(sync.open_close, Some(true));
        assert_eq!(sync.change, Some(TextDocumentSyncKind::NONE));
        assert_eq!(
            sync.save,
            Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                include_text: Some(false)
            }))
        );
        assert!(capabilities.workspace.is_none());
    }

    #[test]
    fn server_capabilities_advertise_workspace_folders_when_supported() {
        let capabilities = Backend::server_capabilities(true);

        let folders = capabilities
            .workspace
            .and_then(|w| w.workspace_folders)
            .expect("workspace folder capability");
        assert_eq!(folders.supported, Some(true));
        assert_eq!(folders.change_notifications, Some(OneOf::Left(true)));
    }
}
