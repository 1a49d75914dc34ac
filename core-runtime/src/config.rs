//! # Core Configuration Module
//!
//! Two layers of configuration live here:
//!
//! - [`SyncPreferences`]: user preferences read from the host's
//!   [`PreferenceStore`] once per sync job (integration token, target
//!   database, citation format, page-title format).
//! - [`CoreConfig`]: the bridges the core runs on (HTTP client, preference
//!   store) plus API endpoint settings, assembled with a fail-fast builder.
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! `HttpClient` and `PreferenceStore` are injected automatically if not
//! provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .http_client(Arc::new(MyHttpClient))
//!     .preference_store(Arc::new(MyPreferenceStore))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, PreferenceStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Preference key holding the integration token
pub const NOTION_TOKEN_KEY: &str = "notionToken";

/// Preference key holding the target database ID
pub const DATABASE_ID_KEY: &str = "notionDatabaseID";

/// Host preference holding the Quick Copy citation format
pub const CITATION_FORMAT_KEY: &str = "export.quickCopy.setting";

/// Preference key holding the page-title format
pub const PAGE_TITLE_FORMAT_KEY: &str = "pageTitleFormat";

/// Citation format used when the host has none configured
pub const DEFAULT_CITATION_FORMAT: &str = "bibliography=http://www.zotero.org/styles/apa";

/// Default remote API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.notion.com/v1";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Page Title Format
// ============================================================================

/// How the title of a synced page is derived from its item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PageTitleFormat {
    /// Item title
    #[default]
    ItemTitle,
    /// Short title, falling back to the title
    ItemShortTitle,
    /// Citation key from the item's extra field
    ItemCitationKey,
    /// "Author (Year)" style citation
    ItemAuthorDateCitation,
    /// In-text citation rendered with the job's citation format
    ItemInTextCitation,
    /// Full bibliography entry rendered with the job's citation format
    ItemFullCitation,
}

impl PageTitleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageTitleFormat::ItemTitle => "itemTitle",
            PageTitleFormat::ItemShortTitle => "itemShortTitle",
            PageTitleFormat::ItemCitationKey => "itemCitationKey",
            PageTitleFormat::ItemAuthorDateCitation => "itemAuthorDateCitation",
            PageTitleFormat::ItemInTextCitation => "itemInTextCitation",
            PageTitleFormat::ItemFullCitation => "itemFullCitation",
        }
    }
}

impl fmt::Display for PageTitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageTitleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "itemTitle" => Ok(PageTitleFormat::ItemTitle),
            "itemShortTitle" => Ok(PageTitleFormat::ItemShortTitle),
            "itemCitationKey" => Ok(PageTitleFormat::ItemCitationKey),
            "itemAuthorDateCitation" => Ok(PageTitleFormat::ItemAuthorDateCitation),
            "itemInTextCitation" => Ok(PageTitleFormat::ItemInTextCitation),
            "itemFullCitation" => Ok(PageTitleFormat::ItemFullCitation),
            other => Err(Error::Config(format!(
                "Unknown page title format: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// Sync Preferences
// ============================================================================

/// Preferences read once at the start of a sync job
#[derive(Clone, PartialEq, Eq)]
pub struct SyncPreferences {
    pub notion_token: String,
    pub database_id: String,
    pub citation_format: String,
    pub page_title_format: PageTitleFormat,
}

impl fmt::Debug for SyncPreferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncPreferences")
            .field("notion_token", &"[REDACTED]")
            .field("database_id", &self.database_id)
            .field("citation_format", &self.citation_format)
            .field("page_title_format", &self.page_title_format)
            .finish()
    }
}

impl SyncPreferences {
    /// Load sync preferences from the host store
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the integration token or database ID is missing
    /// - `Error::Internal` if the store cannot be read
    pub async fn load(store: &dyn PreferenceStore) -> Result<Self> {
        let notion_token = read_non_empty(store, NOTION_TOKEN_KEY)
            .await?
            .ok_or_else(|| Error::Config("Missing Notion token".to_string()))?;

        let database_id = read_non_empty(store, DATABASE_ID_KEY)
            .await?
            .ok_or_else(|| Error::Config("Missing Notion database ID".to_string()))?;

        let citation_format = read_non_empty(store, CITATION_FORMAT_KEY)
            .await?
            .unwrap_or_else(|| DEFAULT_CITATION_FORMAT.to_string());

        let page_title_format = match read_non_empty(store, PAGE_TITLE_FORMAT_KEY).await? {
            Some(value) => value.parse().unwrap_or_else(|e| {
                warn!("{}; using {}", e, PageTitleFormat::default());
                PageTitleFormat::default()
            }),
            None => PageTitleFormat::default(),
        };

        Ok(Self {
            notion_token,
            database_id,
            citation_format,
            page_title_format,
        })
    }
}

async fn read_non_empty(store: &dyn PreferenceStore, key: &str) -> Result<Option<String>> {
    let value = store
        .get_string(key)
        .await
        .map_err(|e| Error::Internal(format!("Failed to read preference {}: {}", key, e)))?;

    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

// ============================================================================
// Core Config
// ============================================================================

/// Bridges and endpoint settings for the sync core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP client used by the remote API client
    pub http_client: Arc<dyn HttpClient>,

    /// Host preference storage (required)
    pub preference_store: Arc<dyn PreferenceStore>,

    /// Remote API base URL
    pub api_base_url: String,

    /// Timeout applied by the default HTTP client
    pub request_timeout: Duration,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("preference_store", &"PreferenceStore { ... }")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates endpoint settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("https://") || self.api_base_url.starts_with("http://"))
        {
            return Err(Error::Config(format!(
                "API base URL must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the remote API. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Plugin hosts: inject an adapter over the host's fetch implementation."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn preference_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PreferenceStore".to_string(),
        message: "PreferenceStore implementation is required for the token and database ID. \
                 Desktop: enable the 'desktop-shims' feature to use the default SqlitePreferenceStore. \
                 Plugin hosts: inject an adapter over the host's preference branch."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_preference_store(path: Option<PathBuf>) -> Result<Arc<dyn PreferenceStore>> {
    use bridge_desktop::SqlitePreferenceStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let path = path.unwrap_or_else(SqlitePreferenceStore::default_path);

    let init_store = |path: PathBuf| -> Result<_> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default preference store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqlitePreferenceStore::new(path))
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to initialize default PreferenceStore: {}",
                    e
                ))
            })
    };

    // A runtime cannot be blocked on from inside another one
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default PreferenceStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_preference_store(_path: Option<PathBuf>) -> Result<Arc<dyn PreferenceStore>> {
    Err(preference_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    preference_store: Option<Arc<dyn PreferenceStore>>,
    preferences_path: Option<PathBuf>,
    api_base_url: Option<String>,
    request_timeout: Option<Duration>,
}

impl CoreConfigBuilder {
    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the preference store implementation.
    ///
    /// **Required** unless the `desktop-shims` feature provides the SQLite
    /// default.
    pub fn preference_store(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.preference_store = Some(store);
        self
    }

    /// Location of the default SQLite preference database (desktop only).
    pub fn preferences_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.preferences_path = Some(path.into());
        self
    }

    /// Overrides the remote API base URL (proxies, tests).
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the final [`CoreConfig`].
    ///
    /// # Errors
    ///
    /// - `Error::CapabilityMissing` when a required bridge is absent and no
    ///   desktop default is available
    /// - `Error::Config` when endpoint settings are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let preference_store = match self.preference_store {
            Some(store) => store,
            None => provide_default_preference_store(self.preferences_path)?,
        };

        let config = CoreConfig {
            http_client,
            preference_store,
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_timeout,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bridge_traits::BridgeError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryPreferenceStore {
        values: Mutex<HashMap<String, String>>,
    }

    impl MemoryPreferenceStore {
        fn with(pairs: &[(&str, &str)]) -> Self {
            let store = Self::default();
            {
                let mut values = store.values.lock().unwrap();
                for (key, value) in pairs {
                    values.insert(key.to_string(), value.to_string());
                }
            }
            store
        }
    }

    #[async_trait]
    impl PreferenceStore for MemoryPreferenceStore {
        async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> BridgeResult<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(self.values.lock().unwrap().keys().cloned().collect())
        }
    }

    struct FailingPreferenceStore;

    #[async_trait]
    impl PreferenceStore for FailingPreferenceStore {
        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Err(BridgeError::DatabaseError("locked".to_string()))
        }

        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct NoopHttpClient;

    #[async_trait]
    impl HttpClient for NoopHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Err(BridgeError::NotAvailable("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_load_with_defaults() {
        let store = MemoryPreferenceStore::with(&[
            (NOTION_TOKEN_KEY, "secret_abc"),
            (DATABASE_ID_KEY, "db-1"),
        ]);

        let prefs = SyncPreferences::load(&store).await.unwrap();
        assert_eq!(prefs.notion_token, "secret_abc");
        assert_eq!(prefs.database_id, "db-1");
        assert_eq!(prefs.citation_format, DEFAULT_CITATION_FORMAT);
        assert_eq!(prefs.page_title_format, PageTitleFormat::ItemTitle);
    }

    #[tokio::test]
    async fn test_load_with_stored_formats() {
        let store = MemoryPreferenceStore::with(&[
            (NOTION_TOKEN_KEY, "secret_abc"),
            (DATABASE_ID_KEY, "db-1"),
            (CITATION_FORMAT_KEY, "bibliography=http://www.zotero.org/styles/ieee"),
            (PAGE_TITLE_FORMAT_KEY, "itemCitationKey"),
        ]);

        let prefs = SyncPreferences::load(&store).await.unwrap();
        assert_eq!(
            prefs.citation_format,
            "bibliography=http://www.zotero.org/styles/ieee"
        );
        assert_eq!(prefs.page_title_format, PageTitleFormat::ItemCitationKey);
    }

    #[tokio::test]
    async fn test_load_empty_citation_format_uses_default() {
        let store = MemoryPreferenceStore::with(&[
            (NOTION_TOKEN_KEY, "secret_abc"),
            (DATABASE_ID_KEY, "db-1"),
            (CITATION_FORMAT_KEY, ""),
        ]);

        let prefs = SyncPreferences::load(&store).await.unwrap();
        assert_eq!(prefs.citation_format, DEFAULT_CITATION_FORMAT);
    }

    #[tokio::test]
    async fn test_load_unknown_title_format_falls_back() {
        let store = MemoryPreferenceStore::with(&[
            (NOTION_TOKEN_KEY, "secret_abc"),
            (DATABASE_ID_KEY, "db-1"),
            (PAGE_TITLE_FORMAT_KEY, "itemColour"),
        ]);

        let prefs = SyncPreferences::load(&store).await.unwrap();
        assert_eq!(prefs.page_title_format, PageTitleFormat::ItemTitle);
    }

    #[tokio::test]
    async fn test_load_requires_token() {
        let store = MemoryPreferenceStore::with(&[(DATABASE_ID_KEY, "db-1")]);

        let err = SyncPreferences::load(&store).await.unwrap_err();
        assert!(err.to_string().contains("Missing Notion token"));
    }

    #[tokio::test]
    async fn test_load_requires_database_id() {
        let store = MemoryPreferenceStore::with(&[
            (NOTION_TOKEN_KEY, "secret_abc"),
            (DATABASE_ID_KEY, "   "),
        ]);

        let err = SyncPreferences::load(&store).await.unwrap_err();
        assert!(err.to_string().contains("Missing Notion database ID"));
    }

    #[tokio::test]
    async fn test_load_store_failure() {
        let err = SyncPreferences::load(&FailingPreferenceStore)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_preferences_debug_redacts_token() {
        let prefs = SyncPreferences {
            notion_token: "secret_abc".to_string(),
            database_id: "db-1".to_string(),
            citation_format: DEFAULT_CITATION_FORMAT.to_string(),
            page_title_format: PageTitleFormat::ItemTitle,
        };
        let debug = format!("{:?}", prefs);
        assert!(!debug.contains("secret_abc"));
        assert!(debug.contains("db-1"));
    }

    #[test]
    fn test_page_title_format_parsing() {
        for format in [
            PageTitleFormat::ItemTitle,
            PageTitleFormat::ItemShortTitle,
            PageTitleFormat::ItemCitationKey,
            PageTitleFormat::ItemAuthorDateCitation,
            PageTitleFormat::ItemInTextCitation,
            PageTitleFormat::ItemFullCitation,
        ] {
            assert_eq!(format.as_str().parse::<PageTitleFormat>().unwrap(), format);
        }
        assert!("ItemTitle ".parse::<PageTitleFormat>().is_err());
    }

    #[test]
    fn test_builder_with_all_bridges() {
        let config = CoreConfig::builder()
            .http_client(Arc::new(NoopHttpClient))
            .preference_store(Arc::new(MemoryPreferenceStore::default()))
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_rejects_bad_base_url() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(NoopHttpClient))
            .preference_store(Arc::new(MemoryPreferenceStore::default()))
            .api_base_url("api.notion.com")
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(NoopHttpClient))
            .preference_store(Arc::new(MemoryPreferenceStore::default()))
            .request_timeout(Duration::ZERO)
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_preference_store() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(NoopHttpClient))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "PreferenceStore")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&base).unwrap();

        let config = CoreConfig::builder()
            .preferences_path(base.join("preferences.db"))
            .build()
            .expect("desktop defaults should succeed");

        let store = config.preference_store.clone();
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        rt.block_on(async {
            store.set_string(DATABASE_ID_KEY, "db-1").await.unwrap();
            let value = store.get_string(DATABASE_ID_KEY).await.unwrap();
            assert_eq!(value.as_deref(), Some("db-1"));
        });

        drop(config);
        let _ = std::fs::remove_dir_all(&base);
    }
}
