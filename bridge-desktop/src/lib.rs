//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! The reference-manager host supplies the item library, item data store and
//! progress popup itself. Everything else has a desktop default here:
//! - `HttpClient` using `reqwest`
//! - `PreferenceStore` using a SQLite-backed key-value table
//! - `ProgressWindow` that reports through `tracing` for headless runs
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqlitePreferenceStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let preferences = SqlitePreferenceStore::new(SqlitePreferenceStore::default_path()).await?;
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod progress;
mod settings;

pub use http::ReqwestHttpClient;
pub use progress::{LogProgressReporter, LogProgressWindow, ProgressOutcome};
pub use settings::SqlitePreferenceStore;
