//! # Sync Job State
//!
//! Per-job context and the per-item state machine.
//!
//! ## Item State Machine
//!
//! ```text
//! Pending → Syncing → Succeeded
//!              ↓    → Skipped
//!              └──→ Failed   (terminal for the whole batch)
//! ```
//!
//! Items are processed strictly in input order. The first item that reaches
//! `Failed` ends the batch; items after it stay `Pending`.

use crate::{Result, SyncError};
use bridge_traits::library::{Item, ItemId};
use bridge_traits::progress::ProgressReporter;
use bridge_traits::remote::{DatabaseSchema, PageStore};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_runtime::config::{PageTitleFormat, SyncPreferences};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a sync job, used to correlate log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncJobId(Uuid);

impl SyncJobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SyncJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SyncJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Item State
// ============================================================================

/// Sync state of one entry in the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSyncState {
    /// Not reached yet
    Pending,
    /// Being synced
    Syncing,
    /// Page written and item linked
    Succeeded,
    /// Note whose parent no longer resolves
    Skipped,
    /// Sync raised; aborts the batch
    Failed,
}

impl ItemSyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemSyncState::Succeeded | ItemSyncState::Skipped | ItemSyncState::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemSyncState::Pending => "pending",
            ItemSyncState::Syncing => "syncing",
            ItemSyncState::Succeeded => "succeeded",
            ItemSyncState::Skipped => "skipped",
            ItemSyncState::Failed => "failed",
        }
    }

    /// Validate and apply a transition
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidStateTransition` for any move other than
    /// `Pending → Syncing` or `Syncing → {Succeeded, Skipped, Failed}`.
    pub fn transition(self, to: ItemSyncState) -> Result<ItemSyncState> {
        let valid = matches!(
            (self, to),
            (ItemSyncState::Pending, ItemSyncState::Syncing)
                | (ItemSyncState::Syncing, ItemSyncState::Succeeded)
                | (ItemSyncState::Syncing, ItemSyncState::Skipped)
                | (ItemSyncState::Syncing, ItemSyncState::Failed)
        );

        if !valid {
            return Err(SyncError::InvalidStateTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!("Cannot transition from {} to {}", self, to),
            });
        }

        Ok(to)
    }
}

impl std::fmt::Display for ItemSyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// States of every entry in one batch, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    entries: Vec<(ItemId, ItemSyncState)>,
}

impl BatchProgress {
    pub fn new(items: &[Item]) -> Self {
        Self {
            entries: items
                .iter()
                .map(|item| (item.id, ItemSyncState::Pending))
                .collect(),
        }
    }

    /// Move entry `index` to `to`
    ///
    /// Once any entry has failed, the batch accepts no further transitions.
    pub fn advance(&mut self, index: usize, to: ItemSyncState) -> Result<()> {
        if self.has_failed() {
            return Err(SyncError::InvalidStateTransition {
                from: ItemSyncState::Failed.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: "Batch already failed".to_string(),
            });
        }

        let entry = self.entries.get_mut(index).ok_or_else(|| {
            SyncError::InvalidStateTransition {
                from: "missing".to_string(),
                to: to.as_str().to_string(),
                reason: format!("No entry at position {}", index),
            }
        })?;
        entry.1 = entry.1.transition(to)?;
        Ok(())
    }

    pub fn state(&self, index: usize) -> Option<ItemSyncState> {
        self.entries.get(index).map(|(_, state)| *state)
    }

    pub fn has_failed(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, state)| *state == ItemSyncState::Failed)
    }

    pub fn count(&self, state: ItemSyncState) -> usize {
        self.entries.iter().filter(|(_, s)| *s == state).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Job Context
// ============================================================================

/// Everything one sync job runs with. Built once per invocation; nothing in
/// it changes while items are processed.
pub struct SyncJobContext {
    pub job_id: SyncJobId,
    pub citation_format: String,
    pub database_id: String,
    pub schema: Arc<DatabaseSchema>,
    pub items: Vec<Item>,
    pub page_store: Arc<dyn PageStore>,
    pub page_title_format: PageTitleFormat,
    pub progress: Arc<dyn ProgressReporter>,
    pub started_at: DateTime<Utc>,
}

impl SyncJobContext {
    pub fn new(
        job_id: SyncJobId,
        preferences: SyncPreferences,
        schema: DatabaseSchema,
        items: Vec<Item>,
        page_store: Arc<dyn PageStore>,
        progress: Arc<dyn ProgressReporter>,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            job_id,
            citation_format: preferences.citation_format,
            database_id: preferences.database_id,
            schema: Arc::new(schema),
            items,
            page_store,
            page_title_format: preferences.page_title_format,
            progress,
            started_at: clock.now(),
        }
    }

    /// Milliseconds since the job started
    pub fn elapsed_ms(&self, clock: &dyn Clock) -> i64 {
        (clock.now() - self.started_at).num_milliseconds()
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// How a sync job ended. Failures are reported through the progress window;
/// the outcome mirrors what the user saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SyncJobOutcome {
    /// No item IDs were given; nothing was touched
    Skipped,
    /// Every entry succeeded or was skipped
    Completed { synced: usize, skipped: usize },
    /// The job stopped at the first error
    Failed {
        item_id: Option<ItemId>,
        message: String,
    },
}

impl SyncJobOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncJobOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_job_id_unique() {
        assert_ne!(SyncJobId::new(), SyncJobId::new());
    }

    #[test]
    fn test_valid_transitions() {
        let state = ItemSyncState::Pending
            .transition(ItemSyncState::Syncing)
            .unwrap();
        assert_eq!(state, ItemSyncState::Syncing);

        for end in [
            ItemSyncState::Succeeded,
            ItemSyncState::Skipped,
            ItemSyncState::Failed,
        ] {
            let state = ItemSyncState::Syncing.transition(end).unwrap();
            assert!(state.is_terminal());
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(ItemSyncState::Pending
            .transition(ItemSyncState::Succeeded)
            .is_err());
        assert!(ItemSyncState::Failed
            .transition(ItemSyncState::Syncing)
            .is_err());
        assert!(ItemSyncState::Succeeded
            .transition(ItemSyncState::Failed)
            .is_err());

        let err = ItemSyncState::Skipped
            .transition(ItemSyncState::Syncing)
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_batch_stops_after_failure() {
        let items = vec![
            Item::regular(1, "AAAA0001", "A"),
            Item::regular(2, "AAAA0002", "B"),
            Item::regular(3, "AAAA0003", "C"),
        ];
        let mut batch = BatchProgress::new(&items);

        batch.advance(0, ItemSyncState::Syncing).unwrap();
        batch.advance(0, ItemSyncState::Succeeded).unwrap();
        batch.advance(1, ItemSyncState::Syncing).unwrap();
        batch.advance(1, ItemSyncState::Failed).unwrap();

        assert!(batch.has_failed());
        assert!(batch.advance(2, ItemSyncState::Syncing).is_err());
        assert_eq!(batch.state(2), Some(ItemSyncState::Pending));
        assert_eq!(batch.count(ItemSyncState::Succeeded), 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = SyncJobOutcome::Failed {
            item_id: Some(2),
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["item_id"], 2);
    }
}
