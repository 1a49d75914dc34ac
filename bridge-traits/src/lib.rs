//! # Host Bridge Traits
//!
//! Abstractions over everything the sync core consumes but does not own.
//!
//! ## Overview
//!
//! The sync core runs inside a reference-manager host (the plugin side) and
//! talks to a hosted document database (the remote side). Neither side is
//! implemented here. This crate defines the contract between the core and the
//! concrete adapters supplied by the host plugin, the desktop shims, and the
//! remote provider crate.
//!
//! ## Traits
//!
//! ### Host data
//! - [`ItemLibrary`](library::ItemLibrary) - Resolve items and read attached notes
//! - [`ItemDataStore`](library::ItemDataStore) - Page ID association, synced tag, back-link attachment
//! - [`CitationFormatter`](library::CitationFormatter) - Render citations for an item
//! - [`PreferenceStore`](preferences::PreferenceStore) - String-valued plugin preferences
//!
//! ### User interface
//! - [`ProgressWindow`](progress::ProgressWindow) - Opens a [`ProgressReporter`](progress::ProgressReporter) per job
//!
//! ### Remote
//! - [`HttpClient`](http::HttpClient) - Async HTTP transport
//! - [`PageStore`](remote::PageStore) - Page create/update and database schema retrieval
//! - [`PageStoreFactory`](remote::PageStoreFactory) - Builds a `PageStore` for an auth token
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Remote adapters
//! must map API failures onto [`BridgeError::Api`](error::BridgeError::Api)
//! and keep the API error code, since the sync core recovers from exactly one
//! of them (`object_not_found` on update).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared as
//! `Arc<dyn Trait>` across async tasks.
//!
//! ## Examples
//!
//! ### Implementing ProgressWindow
//!
//! ```ignore
//! use bridge_traits::library::Item;
//! use bridge_traits::progress::{ProgressReporter, ProgressWindow};
//! use async_trait::async_trait;
//!
//! struct StatusBar;
//!
//! #[async_trait]
//! impl ProgressWindow for StatusBar {
//!     async fn open(&self, total: usize) -> Box<dyn ProgressReporter> {
//!         // Create a host popup with `total` rows
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod library;
pub mod preferences;
pub mod progress;
pub mod remote;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use library::{CitationFormatter, CitationKind, Creator, Item, ItemDataStore, ItemId, ItemKind, ItemLibrary};
pub use preferences::PreferenceStore;
pub use progress::{ProgressReporter, ProgressWindow};
pub use remote::{
    ApiErrorCode, DatabaseSchema, Page, PageProperties, PageResponse, PageStore, PageStoreFactory,
    PartialPage, PropertySchema, PropertyType, PropertyValue,
};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
