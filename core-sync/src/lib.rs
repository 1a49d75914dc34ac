//! # Item Sync Module
//!
//! Syncs reference-manager items to pages in a Notion database.
//!
//! ## Overview
//!
//! For each selected item this module:
//! - Folds the item's child notes into plain text
//! - Builds page properties from the item and the database schema
//! - Creates the item's page, or updates the one it is already linked to
//! - Tags the item as synced and stores a back-link to the page
//!
//! ## Components
//!
//! - **Sync Coordinator** (`coordinator`): runs a sync job end to end
//! - **Job State** (`job`): job context, per-item state machine, job outcome
//! - **Notes** (`notes`): note concatenation and HTML-to-text sanitizing
//! - **Properties** (`properties`): item → page property mapping

pub mod coordinator;
pub mod error;
pub mod job;
pub mod notes;
pub mod properties;

pub use coordinator::SyncCoordinator;
pub use error::{Result, SyncError};
pub use job::{BatchProgress, ItemSyncState, SyncJobContext, SyncJobId, SyncJobOutcome};
pub use notes::{concatenate_notes, fold_notes, sanitize_html, NOTES_SEPARATOR};
pub use properties::{PropertyBuilder, PropertyRequest, SchemaPropertyBuilder, SyncItem};
