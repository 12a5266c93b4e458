//! Document lifecycle and validation triggers
//!
//! Decides when a document is validated and against which file, runs the
//! validator, and publishes the translated diagnostics. Failures never leave
//! this module: a run that goes wrong publishes no diagnostics and is logged.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tower_lsp::lsp_types::*;
use tracing::{debug, info, warn};

use super::capabilities::{server_capabilities, ClientFeatures};
use super::document::{line_prefix_of, DocumentSnapshot, DocumentStore};
use crate::completion;
use crate::diagnostics::parse_stderr;
use crate::error::{KickstartError, KsResult};
use crate::scratch::ScratchWorkspace;
use crate::settings::{ConfigurationSource, SettingsResolver};
use crate::validator::Validate;

/// Receiver of published diagnostics, normally the editor.
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    /// Replace the diagnostics shown for `uri`.
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>);
}

/// State fixed by the `initialize` handshake.
pub struct Session {
    pub features: ClientFeatures,
    pub validation_enabled: bool,
    pub settings: SettingsResolver,
}

pub struct DocumentController {
    validator: Arc<dyn Validate>,
    sink: Arc<dyn DiagnosticSink>,
    documents: DocumentStore,
    session: OnceLock<Session>,
}

impl DocumentController {
    pub fn new(validator: Arc<dyn Validate>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            validator,
            sink,
            documents: DocumentStore::new(),
            session: OnceLock::new(),
        }
    }

    /// Negotiate capabilities and fix the session.
    ///
    /// Probes the validator; when it is missing the server still starts but
    /// declares no document sync and never validates.
    pub fn initialize(
        &self,
        capabilities: &ClientCapabilities,
        configuration: Arc<dyn ConfigurationSource>,
    ) -> ServerCapabilities {
        let features = ClientFeatures::from_capabilities(capabilities);
        let validation_enabled = self.validator.is_available();
        let settings = if features.configuration {
            SettingsResolver::per_resource(configuration)
        } else {
            SettingsResolver::global()
        };

        let session = Session {
            features,
            validation_enabled,
            settings,
        };
        if self.session.set(session).is_err() {
            warn!("Ignoring repeated initialize request");
        }

        debug!(?features, validation_enabled, "Session initialized");
        server_capabilities(&features, validation_enabled)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.get()
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    fn active_session(&self) -> Option<&Session> {
        self.session().filter(|s| s.validation_enabled)
    }

    pub async fn did_open(&self, params: DidOpenTextDocumentParams) {
        if self.active_session().is_none() {
            return;
        }
        let snapshot = self.documents.open(params.text_document);
        self.validate_text_document(&snapshot).await;
    }

    pub async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(session) = self.active_session() else {
            return;
        };
        let uri = params.text_document.uri;
        let Some(snapshot) =
            self.documents
                .change(&uri, params.content_changes, params.text_document.version)
        else {
            warn!("Change for unknown document {}", uri);
            return;
        };

        if session.settings.resolve(&uri).await.linting.lint_on_change {
            self.validate_text_document(&snapshot).await;
        }
    }

    pub async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Some(session) = self.active_session() else {
            return;
        };
        let uri = params.text_document.uri;

        if !session.settings.resolve(&uri).await.linting.lint_on_save {
            // Clear whatever an earlier run reported
            self.sink.publish(uri, Vec::new(), None).await;
            return;
        }
        self.validate_text_document_at(&uri).await;
    }

    pub async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.close(&uri);
        if let Some(session) = self.session() {
            session.settings.forget(&uri);
        }
    }

    pub async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        if self.active_session().is_none() {
            return;
        }
        for event in params.changes {
            if event.typ == FileChangeType::DELETED {
                continue;
            }
            self.validate_text_document_at(&event.uri).await;
        }
    }

    pub async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let Some(session) = self.session() else {
            return;
        };
        session.settings.configuration_changed(&params.settings).await;

        if !session.validation_enabled {
            return;
        }
        for snapshot in self.documents.snapshots() {
            self.validate_text_document(&snapshot).await;
        }
    }

    /// Completion items at `position`.
    ///
    /// Reads the file from disk when the document is not synchronized, which
    /// is the case whenever validation is disabled.
    pub async fn completion(&self, uri: &Url, position: Position) -> Vec<CompletionItem> {
        let prefix = match self.documents.get(uri) {
            Some(doc) => doc.line_prefix(position),
            None => match uri.to_file_path() {
                Ok(path) => match tokio::fs::read_to_string(&path).await {
                    Ok(text) => line_prefix_of(&text, position),
                    Err(e) => {
                        debug!("Cannot read {} for completion: {}", path.display(), e);
                        Some(String::new())
                    }
                },
                Err(()) => Some(String::new()),
            },
        };
        prefix.map(|p| completion::complete(&p)).unwrap_or_default()
    }

    /// Validate the buffer content of a document through a scratch copy and
    /// publish the result.
    pub async fn validate_text_document(&self, snapshot: &DocumentSnapshot) {
        let diagnostics = match self.buffer_diagnostics(&snapshot.uri, &snapshot.text).await {
            Ok(diagnostics) => diagnostics,
            Err(e) => {
                warn!("Validation of {} failed: {}", snapshot.uri, e);
                Vec::new()
            }
        };
        self.sink
            .publish(snapshot.uri.clone(), diagnostics, Some(snapshot.version))
            .await;
    }

    /// Validate the file `uri` names on disk and publish the result.
    pub async fn validate_text_document_at(&self, uri: &Url) {
        let diagnostics = match self.disk_diagnostics(uri).await {
            Ok(diagnostics) => diagnostics,
            Err(e) => {
                warn!("Validation of {} failed: {}", uri, e);
                Vec::new()
            }
        };
        self.sink.publish(uri.clone(), diagnostics, None).await;
    }

    async fn buffer_diagnostics(&self, uri: &Url, text: &str) -> KsResult<Vec<Diagnostic>> {
        if uri.scheme() != "file" {
            return Ok(Vec::new());
        }

        let workspace = ScratchWorkspace::create().await?;
        let input = workspace.write_input(text).await?;
        info!("Validating {} using {}", uri, input.display());
        let report = self.validator.run(&input).await;
        workspace.close().await?;

        Ok(self.translate(uri, report?))
    }

    async fn disk_diagnostics(&self, uri: &Url) -> KsResult<Vec<Diagnostic>> {
        if uri.scheme() != "file" {
            return Ok(Vec::new());
        }

        let path = uri
            .to_file_path()
            .map_err(|()| KickstartError::NonLocalUri(uri.clone()))?;
        info!("Validating file using ksvalidator: {}", path.display());
        let report = self.validator.run(&path).await?;
        Ok(self.translate(uri, report))
    }

    fn translate(&self, uri: &Url, report: Option<String>) -> Vec<Diagnostic> {
        let Some(stderr) = report else {
            return Vec::new();
        };
        let related = self
            .session()
            .is_some_and(|s| s.features.related_information);
        parse_stderr(&stderr, related.then_some(uri))
    }
}
