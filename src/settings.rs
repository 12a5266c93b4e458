//! Editor settings for the language server
//!
//! Settings live under the `kickstartLanguageSupport` section. Clients that
//! support `workspace/configuration` are queried per document; everyone else
//! gets a single global value pushed through `didChangeConfiguration`.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

use crate::error::KsResult;

/// Name of the settings section used to configure the server.
pub const SETTINGS_SECTION: &str = "kickstartLanguageSupport";

/// Linting settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LintingSettings {
    pub lint_on_save: bool,
    pub lint_on_change: bool,
}

impl Default for LintingSettings {
    fn default() -> Self {
        Self {
            lint_on_save: true,
            lint_on_change: false,
        }
    }
}

/// Server settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub linting: LintingSettings,
}

impl ServerSettings {
    /// Parse a settings section, falling back to defaults when it is absent.
    pub fn from_section(section: Option<Value>) -> KsResult<Self> {
        match section {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// Like [`ServerSettings::from_section`], but logs and returns defaults on
    /// malformed input.
    pub fn from_section_lossy(section: Option<Value>) -> Self {
        Self::from_section(section).unwrap_or_else(|e| {
            warn!("Ignoring malformed {} settings: {}", SETTINGS_SECTION, e);
            Self::default()
        })
    }
}

/// Source of scoped configuration, normally the editor.
#[async_trait]
pub trait ConfigurationSource: Send + Sync {
    /// Fetch `section` as seen from `scope`. `None` when the editor has no
    /// value for it.
    async fn fetch(&self, scope: &Url, section: &str) -> KsResult<Option<Value>>;
}

type PendingSettings = Shared<BoxFuture<'static, ServerSettings>>;

/// Resolves the settings that apply to a document.
///
/// The variant is picked once during initialization from the client's
/// `workspace.configuration` capability.
pub enum SettingsResolver {
    Global(RwLock<ServerSettings>),
    PerResource(PerResourceSettings),
}

impl SettingsResolver {
    pub fn global() -> Self {
        Self::Global(RwLock::new(ServerSettings::default()))
    }

    pub fn per_resource(source: Arc<dyn ConfigurationSource>) -> Self {
        Self::PerResource(PerResourceSettings::new(source))
    }

    /// Settings for `uri`.
    pub async fn resolve(&self, uri: &Url) -> ServerSettings {
        match self {
            Self::Global(settings) => settings.read().await.clone(),
            Self::PerResource(cache) => cache.resolve(uri).await,
        }
    }

    /// React to `workspace/didChangeConfiguration`.
    ///
    /// The global value is replaced wholesale; per-resource lookups are all
    /// dropped so the next resolve queries the editor again.
    pub async fn configuration_changed(&self, payload: &Value) {
        match self {
            Self::Global(settings) => {
                let section = payload.get(SETTINGS_SECTION).cloned();
                *settings.write().await = ServerSettings::from_section_lossy(section);
            }
            Self::PerResource(cache) => cache.clear(),
        }
    }

    /// Drop anything cached for a closed document.
    pub fn forget(&self, uri: &Url) {
        if let Self::PerResource(cache) = self {
            cache.remove(uri);
        }
    }
}

/// Per-document settings backed by scoped configuration queries.
///
/// The cache stores the pending lookup rather than its result, so callers
/// racing on the same URI share a single request. A lookup is only ever
/// inserted when it is created; clearing the cache while a request is in
/// flight leaves the next caller to start a fresh one.
pub struct PerResourceSettings {
    source: Arc<dyn ConfigurationSource>,
    cache: DashMap<Url, PendingSettings>,
}

impl PerResourceSettings {
    pub fn new(source: Arc<dyn ConfigurationSource>) -> Self {
        Self {
            source,
            cache: DashMap::new(),
        }
    }

    pub async fn resolve(&self, uri: &Url) -> ServerSettings {
        let pending = self
            .cache
            .entry(uri.clone())
            .or_insert_with(|| self.fetch(uri.clone()))
            .clone();
        pending.await
    }

    pub fn remove(&self, uri: &Url) {
        self.cache.remove(uri);
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn fetch(&self, uri: Url) -> PendingSettings {
        debug!("Requesting {} settings for {}", SETTINGS_SECTION, uri);
        let source = Arc::clone(&self.source);
        async move {
            match source.fetch(&uri, SETTINGS_SECTION).await {
                Ok(section) => ServerSettings::from_section_lossy(section),
                Err(e) => {
                    warn!("Falling back to default settings for {}: {}", uri, e);
                    ServerSettings::default()
                }
            }
        }
        .boxed()
        .shared()
    }
}
