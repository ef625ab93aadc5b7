//! Per-document settings resolution
//!
//! Clients that support `workspace/configuration` are asked for settings
//! lazily, once per document, and the answer is cached until the next
//! configuration change. Other clients push a single global value through
//! `workspace/didChangeConfiguration`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::Client;
use tower_lsp::lsp_types::{ConfigurationItem, Url};
use tracing::{debug, warn};

use crate::config::SETTINGS_SECTION;

/// Default cap on diagnostics published per document
pub const DEFAULT_MAX_NUMBER_OF_PROBLEMS: usize = 1000;

/// How long a validation waits for `workspace/configuration` before using defaults
pub const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_secs(2);

/// Editor-side settings for one document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Maximum number of diagnostics published for a document
    pub max_number_of_problems: usize,
    /// Publish empty diagnostic sets too, clearing stale results in the editor
    pub always_publish: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_number_of_problems: DEFAULT_MAX_NUMBER_OF_PROBLEMS,
            always_publish: false,
        }
    }
}

impl Settings {
    /// Reads settings from a section value, using defaults when it is absent or invalid
    pub fn from_value(value: Value) -> Self {
        if value.is_null() {
            return Self::default();
        }

        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Invalid {} settings, using defaults: {}", SETTINGS_SECTION, e);
            Self::default()
        })
    }

    /// Reads settings from a `didChangeConfiguration` payload.
    /// A missing section resets everything to defaults.
    pub fn from_change(settings: &Value) -> Self {
        settings
            .get(SETTINGS_SECTION)
            .cloned()
            .map(Self::from_value)
            .unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration request failed: {0}")]
    Request(#[from] tower_lsp::jsonrpc::Error),

    #[error("Client returned no configuration for {0}")]
    Missing(Url),
}

/// Fetches scoped configuration from the editor
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigurationSource: Send + Sync {
    async fn pull(&self, scope_uri: Url, section: String) -> Result<Value, SettingsError>;
}

#[async_trait]
impl ConfigurationSource for Client {
    async fn pull(&self, scope_uri: Url, section: String) -> Result<Value, SettingsError> {
        let item = ConfigurationItem {
            scope_uri: Some(scope_uri.clone()),
            section: Some(section),
        };

        let mut values = self.configuration(vec![item]).await?;
        if values.is_empty() {
            return Err(SettingsError::Missing(scope_uri));
        }
        Ok(values.swap_remove(0))
    }
}

/// A settings request that may still be in flight; every clone resolves to the same value
type PendingSettings = Shared<BoxFuture<'static, Settings>>;

/// Open documents and the settings pulled for them, guarded together so
/// that a closed document can never regain a cache entry
#[derive(Default)]
struct DocumentTable {
    open: HashSet<Url>,
    pending: HashMap<Url, PendingSettings>,
}

pub struct SettingsCache {
    source: Arc<dyn ConfigurationSource>,
    pull_supported: AtomicBool,
    pull_timeout: Duration,
    global: RwLock<Settings>,
    documents: Mutex<DocumentTable>,
}

impl SettingsCache {
    pub fn new(source: Arc<dyn ConfigurationSource>) -> Self {
        Self {
            source,
            pull_supported: AtomicBool::new(false),
            pull_timeout: DEFAULT_PULL_TIMEOUT,
            global: RwLock::new(Settings::default()),
            documents: Mutex::new(DocumentTable::default()),
        }
    }

    /// Sets how long [`get`](Self::get) waits for the client before using defaults
    pub fn with_pull_timeout(mut self, timeout: Duration) -> Self {
        self.pull_timeout = timeout;
        self
    }

    /// Records whether the client answers `workspace/configuration`
    pub fn set_pull_supported(&self, supported: bool) {
        self.pull_supported.store(supported, Ordering::Relaxed);
    }

    pub fn pull_supported(&self) -> bool {
        self.pull_supported.load(Ordering::Relaxed)
    }

    pub async fn open(&self, uri: Url) {
        self.documents.lock().await.open.insert(uri);
    }

    /// Marks a document closed and forgets its cached settings.
    /// Closing an unknown document is a no-op.
    pub async fn close(&self, uri: &Url) {
        let mut documents = self.documents.lock().await;
        documents.open.remove(uri);
        documents.pending.remove(uri);
    }

    pub async fn is_open(&self, uri: &Url) -> bool {
        self.documents.lock().await.open.contains(uri)
    }

    pub async fn open_documents(&self) -> Vec<Url> {
        self.documents.lock().await.open.iter().cloned().collect()
    }

    /// Resolves settings for a document.
    ///
    /// In pull mode the first call for an open URI issues the request and
    /// later callers await the same pending result. Documents that are not
    /// open are pulled without caching. A client that does not answer
    /// within the pull timeout yields the defaults.
    pub async fn get(&self, uri: &Url) -> Settings {
        if !self.pull_supported() {
            return self.global.read().await.clone();
        }

        let pending = {
            let mut documents = self.documents.lock().await;
            if documents.open.contains(uri) {
                documents
                    .pending
                    .entry(uri.clone())
                    .or_insert_with(|| self.request(uri.clone()))
                    .clone()
            } else {
                self.request(uri.clone())
            }
        };

        match tokio::time::timeout(self.pull_timeout, pending).await {
            Ok(settings) => settings,
            Err(_) => {
                warn!(
                    "No settings received for {} within {:?}, using defaults",
                    uri, self.pull_timeout
                );
                Settings::default()
            }
        }
    }

    fn request(&self, uri: Url) -> PendingSettings {
        let source = Arc::clone(&self.source);

        async move {
            debug!("Pulling settings for {}", uri);
            match source.pull(uri.clone(), SETTINGS_SECTION.to_string()).await {
                Ok(value) => Settings::from_value(value),
                Err(e) => {
                    warn!("Failed to pull settings for {}, using defaults: {}", uri, e);
                    Settings::default()
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Handles `workspace/didChangeConfiguration`.
    ///
    /// Pull mode drops every cached entry; otherwise the pushed section
    /// replaces the global settings wholesale.
    pub async fn apply_change(&self, settings: &Value) {
        if self.pull_supported() {
            let mut documents = self.documents.lock().await;
            debug!("Clearing {} cached document settings", documents.pending.len());
            documents.pending.clear();
        } else {
            let updated = Settings::from_change(settings);
            debug!("Global settings replaced: {:?}", updated);
            *self.global.write().await = updated;
        }
    }

    #[cfg(test)]
    async fn is_cached(&self, uri: &Url) -> bool {
        self.documents.lock().await.pending.contains_key(uri)
    }
}
