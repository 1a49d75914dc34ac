//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the sync core:
//! - Logging and tracing infrastructure
//! - Preference loading and core configuration
//! - The runtime error type
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions and
//! for the [`config::SyncPreferences`] snapshot a sync job runs with.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, PageTitleFormat, SyncPreferences};
pub use error::{Error, Result};
