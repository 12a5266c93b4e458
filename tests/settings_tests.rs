//! Settings resolution tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kickstart_ls::settings::{
    ConfigurationSource, PerResourceSettings, SettingsResolver, SETTINGS_SECTION,
};
use kickstart_ls::{KickstartError, KsResult, ServerSettings};
use serde_json::{json, Value};
use tower_lsp::lsp_types::Url;

/// Answers every query with the same section and counts the queries.
struct CountingSource {
    section: Option<Value>,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingSource {
    fn new(section: Option<Value>) -> Arc<Self> {
        Arc::new(Self {
            section,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(section: Option<Value>) -> Arc<Self> {
        Arc::new(Self {
            section,
            delay: Duration::from_millis(50),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigurationSource for CountingSource {
    async fn fetch(&self, _scope: &Url, section: &str) -> KsResult<Option<Value>> {
        assert_eq!(section, SETTINGS_SECTION);
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.section.clone())
    }
}

struct FailingSource;

#[async_trait]
impl ConfigurationSource for FailingSource {
    async fn fetch(&self, _scope: &Url, _section: &str) -> KsResult<Option<Value>> {
        Err(KickstartError::Configuration("connection closed".to_string()))
    }
}

fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///srv/ks/{}", name)).unwrap()
}

fn save_disabled() -> Option<Value> {
    Some(json!({ "linting": { "lintOnSave": false } }))
}

// ═══════════════════════════════════════════════════════════════════════════
// PER-RESOURCE CACHE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_repeated_resolve_queries_once() {
    let source = CountingSource::new(save_disabled());
    let settings = PerResourceSettings::new(source.clone());
    let doc = uri("a.ks");

    for _ in 0..3 {
        let resolved = settings.resolve(&doc).await;
        assert!(!resolved.linting.lint_on_save);
    }
    assert_eq!(source.calls(), 1);
    assert_eq!(settings.cached(), 1);
}

#[tokio::test]
async fn test_documents_are_cached_separately() {
    let source = CountingSource::new(None);
    let settings = PerResourceSettings::new(source.clone());

    settings.resolve(&uri("a.ks")).await;
    settings.resolve(&uri("b.ks")).await;
    settings.resolve(&uri("a.ks")).await;

    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_concurrent_resolves_share_one_query() {
    let source = CountingSource::slow(save_disabled());
    let settings = PerResourceSettings::new(source.clone());
    let doc = uri("a.ks");

    let (first, second) = tokio::join!(settings.resolve(&doc), settings.resolve(&doc));

    assert_eq!(first, second);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_clear_forces_requery() {
    let source = CountingSource::new(None);
    let settings = PerResourceSettings::new(source.clone());
    let doc = uri("a.ks");

    settings.resolve(&doc).await;
    settings.clear();
    assert_eq!(settings.cached(), 0);
    settings.resolve(&doc).await;

    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_clear_during_pending_query_is_not_undone() {
    let source = CountingSource::slow(None);
    let settings = PerResourceSettings::new(source.clone());
    let doc = uri("a.ks");

    let in_flight = settings.resolve(&doc);
    let clear_midway = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        settings.clear();
    };
    tokio::join!(in_flight, clear_midway);

    // The finished lookup must not have re-entered the cache
    assert_eq!(settings.cached(), 0);
    settings.resolve(&doc).await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_failed_query_falls_back_to_defaults() {
    let settings = PerResourceSettings::new(Arc::new(FailingSource));
    let resolved = settings.resolve(&uri("a.ks")).await;
    assert_eq!(resolved, ServerSettings::default());
}

#[tokio::test]
async fn test_missing_section_uses_defaults() {
    let settings = PerResourceSettings::new(CountingSource::new(None));
    let resolved = settings.resolve(&uri("a.ks")).await;
    assert!(resolved.linting.lint_on_save);
    assert!(!resolved.linting.lint_on_change);
}

// ═══════════════════════════════════════════════════════════════════════════
// RESOLVER
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_forget_drops_one_document() {
    let source = CountingSource::new(None);
    let resolver = SettingsResolver::per_resource(source.clone());

    resolver.resolve(&uri("a.ks")).await;
    resolver.resolve(&uri("b.ks")).await;
    resolver.forget(&uri("a.ks"));
    resolver.resolve(&uri("a.ks")).await;
    resolver.resolve(&uri("b.ks")).await;

    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_configuration_change_clears_per_resource_cache() {
    let source = CountingSource::new(None);
    let resolver = SettingsResolver::per_resource(source.clone());
    let doc = uri("a.ks");

    resolver.resolve(&doc).await;
    // Payload content is irrelevant: the editor is asked again
    resolver.configuration_changed(&Value::Null).await;
    resolver.resolve(&doc).await;

    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_global_settings_follow_change_payload() {
    let resolver = SettingsResolver::global();
    let doc = uri("a.ks");
    assert!(resolver.resolve(&doc).await.linting.lint_on_save);

    resolver
        .configuration_changed(&json!({
            "kickstartLanguageSupport": { "linting": { "lintOnSave": false, "lintOnChange": true } }
        }))
        .await;
    let resolved = resolver.resolve(&doc).await;
    assert!(!resolved.linting.lint_on_save);
    assert!(resolved.linting.lint_on_change);

    // A payload without the section restores the defaults
    resolver.configuration_changed(&json!({})).await;
    assert_eq!(resolver.resolve(&doc).await, ServerSettings::default());
}
