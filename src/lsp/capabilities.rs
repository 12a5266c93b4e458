//! LSP capabilities for the Kickstart language server
//!
//! Client capabilities are read once during `initialize` into an immutable
//! [`ClientFeatures`] value; the server capabilities follow from it and from
//! whether `ksvalidator` is available.

use tower_lsp::lsp_types::*;

/// What the connected editor supports, as negotiated at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientFeatures {
    /// `workspace.workspaceFolders`
    pub workspace_folders: bool,
    /// `workspace.configuration`: settings can be queried per document
    pub configuration: bool,
    /// `textDocument.publishDiagnostics.relatedInformation`
    pub related_information: bool,
    /// `workspace.didChangeConfiguration.dynamicRegistration`
    pub configuration_registration: bool,
    /// `workspace.didChangeWatchedFiles.dynamicRegistration`
    pub watched_files_registration: bool,
}

impl ClientFeatures {
    pub fn from_capabilities(capabilities: &ClientCapabilities) -> Self {
        let workspace = capabilities.workspace.as_ref();
        Self {
            workspace_folders: workspace
                .and_then(|w| w.workspace_folders)
                .unwrap_or(false),
            configuration: workspace.and_then(|w| w.configuration).unwrap_or(false),
            related_information: capabilities
                .text_document
                .as_ref()
                .and_then(|t| t.publish_diagnostics.as_ref())
                .and_then(|p| p.related_information)
                .unwrap_or(false),
            configuration_registration: workspace
                .and_then(|w| w.did_change_configuration.as_ref())
                .and_then(|d| d.dynamic_registration)
                .unwrap_or(false),
            watched_files_registration: workspace
                .and_then(|w| w.did_change_watched_files.as_ref())
                .and_then(|d| d.dynamic_registration)
                .unwrap_or(false),
        }
    }
}

/// Get the server capabilities
pub fn server_capabilities(features: &ClientFeatures, validation_enabled: bool) -> ServerCapabilities {
    // Without a validator there is nothing to do with document contents
    let text_document_sync = if validation_enabled {
        TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
            open_close: Some(true),
            change: Some(TextDocumentSyncKind::INCREMENTAL),
            save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                include_text: Some(false),
            })),
            ..Default::default()
        })
    } else {
        TextDocumentSyncCapability::Kind(TextDocumentSyncKind::NONE)
    };

    let workspace = features
        .workspace_folders
        .then(|| WorkspaceServerCapabilities {
            workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                supported: Some(true),
                change_notifications: Some(OneOf::Left(true)),
            }),
            file_operations: None,
        });

    ServerCapabilities {
        text_document_sync: Some(text_document_sync),

        // Commands, then their arguments once a space is typed
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![" ".to_string()]),
            ..Default::default()
        }),

        workspace,
        ..Default::default()
    }
}

/// Glob for Kickstart files watched on the client's behalf.
pub const WATCH_GLOB: &str = "**/*.ks";

/// Registrations sent after `initialized`.
pub fn dynamic_registrations(features: &ClientFeatures, validation_enabled: bool) -> Vec<Registration> {
    let mut registrations = Vec::new();

    if features.configuration_registration {
        registrations.push(Registration {
            id: "kickstart-ls/configuration".to_string(),
            method: "workspace/didChangeConfiguration".to_string(),
            register_options: None,
        });
    }

    if validation_enabled && features.watched_files_registration {
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String(WATCH_GLOB.to_string()),
                kind: None,
            }],
        };
        registrations.push(Registration {
            id: "kickstart-ls/watched-files".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(options).ok(),
        });
    }

    registrations
}
