//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridges (item library, item data store,
//! citation formatter) and the core configuration (HTTP client, preference
//! store, API endpoint) into a [`SyncCoordinator`] backed by the Notion
//! client. Desktop hosts typically enable the `desktop-shims` feature, which
//! lets [`bootstrap_desktop`] fill in a reqwest HTTP client and a SQLite
//! preference store.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{
    library::{CitationFormatter, ItemDataStore, ItemId, ItemLibrary},
    progress::ProgressWindow,
    time::{Clock, SystemClock},
};
use core_runtime::config::{CoreConfig, SyncPreferences};
use core_sync::{SchemaPropertyBuilder, SyncCoordinator, SyncJobOutcome};
use provider_notion::NotionClientFactory;
use tracing::info;

/// Bridges only the reference-manager host can supply.
#[derive(Clone)]
pub struct HostBridges {
    pub library: Arc<dyn ItemLibrary>,
    pub data_store: Arc<dyn ItemDataStore>,
    pub citations: Arc<dyn CitationFormatter>,
}

impl HostBridges {
    pub fn new(
        library: Arc<dyn ItemLibrary>,
        data_store: Arc<dyn ItemDataStore>,
        citations: Arc<dyn CitationFormatter>,
    ) -> Self {
        Self {
            library,
            data_store,
            citations,
        }
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    coordinator: Arc<SyncCoordinator>,
}

impl CoreService {
    /// Create a new service from a built configuration and the host bridges.
    pub fn new(config: CoreConfig, host: HostBridges) -> Result<Self> {
        Self::with_clock(config, host, Arc::new(SystemClock))
    }

    /// Same as [`CoreService::new`] with an explicit clock.
    pub fn with_clock(config: CoreConfig, host: HostBridges, clock: Arc<dyn Clock>) -> Result<Self> {
        config
            .validate()
            .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

        let page_stores = Arc::new(NotionClientFactory::with_base_url(
            Arc::clone(&config.http_client),
            config.api_base_url.clone(),
        ));
        let coordinator = SyncCoordinator::new(
            host.library,
            host.data_store,
            Arc::clone(&config.preference_store),
            page_stores,
            Arc::new(SchemaPropertyBuilder::new(host.citations)),
            clock,
        );

        info!(api_base_url = %config.api_base_url, "Core service ready");

        Ok(Self {
            config: Arc::new(config),
            coordinator: Arc::new(coordinator),
        })
    }

    /// Sync the selected items. Outcome mirrors what `window` was shown.
    pub async fn sync_items(&self, item_ids: &[ItemId], window: &dyn ProgressWindow) -> SyncJobOutcome {
        self.coordinator.perform_sync_job(item_ids, window).await
    }

    /// Read the current sync preferences, for settings panes.
    pub async fn preferences(&self) -> Result<SyncPreferences> {
        Ok(SyncPreferences::load(self.config.preference_store.as_ref()).await?)
    }

    pub fn config(&self) -> Arc<CoreConfig> {
        Arc::clone(&self.config)
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// ```no_run
/// # fn example(host: core_service::HostBridges) -> core_service::Result<()> {
/// let core = core_service::bootstrap_desktop(host)?;
/// let _config = core.config();
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(host: HostBridges) -> Result<CoreService> {
    let config = CoreConfig::builder().build().map_err(|err| match err {
        core_runtime::Error::Config(message) => CoreError::InitializationFailed(message),
        other => CoreError::from(other),
    })?;
    CoreService::new(config, host)
}
