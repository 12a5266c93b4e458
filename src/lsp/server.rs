//! Kickstart LSP server implementation
//!
//! Thin tower-lsp front end over [`DocumentController`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{info, warn};

use super::capabilities::dynamic_registrations;
use super::controller::{DiagnosticSink, DocumentController};
use crate::error::{KickstartError, KsResult};
use crate::settings::ConfigurationSource;
use crate::validator::{Ksvalidator, Validate, DEFAULT_PROGRAM};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Validator program, resolved through `PATH` when not absolute
    pub validator: PathBuf,
    /// Upper bound for a single validator run
    pub validator_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            validator: PathBuf::from(DEFAULT_PROGRAM),
            validator_timeout: None,
        }
    }
}

impl ServerConfig {
    pub fn validator(&self) -> Ksvalidator {
        Ksvalidator::new(&self.validator).with_timeout(self.validator_timeout)
    }
}

#[async_trait]
impl DiagnosticSink for Client {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        self.publish_diagnostics(uri, diagnostics, version).await;
    }
}

#[async_trait]
impl ConfigurationSource for Client {
    async fn fetch(&self, scope: &Url, section: &str) -> KsResult<Option<Value>> {
        let items = vec![ConfigurationItem {
            scope_uri: Some(scope.clone()),
            section: Some(section.to_string()),
        }];
        let values = self
            .configuration(items)
            .await
            .map_err(|e| KickstartError::Configuration(e.to_string()))?;
        Ok(values.into_iter().next())
    }
}

/// Kickstart Language Server
pub struct KickstartLsp {
    /// LSP client for sending notifications
    client: Client,
    controller: DocumentController,
}

impl KickstartLsp {
    pub fn new(client: Client, validator: Arc<dyn Validate>) -> Self {
        let sink: Arc<dyn DiagnosticSink> = Arc::new(client.clone());
        Self {
            client,
            controller: DocumentController::new(validator, sink),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for KickstartLsp {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let configuration: Arc<dyn ConfigurationSource> = Arc::new(self.client.clone());
        let capabilities = self
            .controller
            .initialize(&params.capabilities, configuration);

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "kickstart-ls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let Some(session) = self.controller.session() else {
            return;
        };

        if session.validation_enabled {
            info!("Kickstart files will be validated using ksvalidator");
            self.client
                .log_message(
                    MessageType::INFO,
                    "Kickstart files will be validated using `ksvalidator`.",
                )
                .await;
        } else {
            warn!("ksvalidator not found, linting disabled");
            self.client
                .log_message(
                    MessageType::WARNING,
                    "Unable to find `ksvalidator`. Linting will be disabled.",
                )
                .await;
        }

        let registrations =
            dynamic_registrations(&session.features, session.validation_enabled);
        if registrations.is_empty() {
            return;
        }
        if let Err(e) = self.client.register_capability(registrations).await {
            warn!("Dynamic registration failed: {}", e);
        }
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.controller.did_open(params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.controller.did_change(params).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.controller.did_save(params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.controller.did_close(params).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.controller.did_change_configuration(params).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        self.controller.did_change_watched_files(params).await;
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        info!(
            added = params.event.added.len(),
            removed = params.event.removed.len(),
            "Workspace folder change event received"
        );
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let items = self.controller.completion(&uri, position).await;
        Ok(Some(CompletionResponse::Array(items)))
    }
}

/// Run the LSP server on stdin/stdout
pub async fn run_lsp_server(config: ServerConfig) {
    info!(
        "Starting kickstart-ls {} (validator: {})",
        env!("CARGO_PKG_VERSION"),
        config.validator.display()
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let validator: Arc<dyn Validate> = Arc::new(config.validator());
    let (service, socket) = LspService::new(move |client| KickstartLsp::new(client, validator));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("kickstart-ls shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.validator, PathBuf::from("ksvalidator"));
        assert!(config.validator_timeout.is_none());
    }

    #[test]
    fn test_config_builds_validator() {
        let config = ServerConfig {
            validator: PathBuf::from("/opt/bin/ksvalidator"),
            validator_timeout: Some(Duration::from_secs(5)),
        };
        let validator = config.validator();
        assert_eq!(validator.program(), std::path::Path::new("/opt/bin/ksvalidator"));
    }
}
