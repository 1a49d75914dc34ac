//! Progress reporting through `tracing`
//!
//! Headless hosts (CLI shells, integration tests) have no progress popup; this
//! reporter writes each progress event to the log instead and remembers the
//! terminal state.

use async_trait::async_trait;
use bridge_traits::{
    library::Item,
    progress::{ProgressReporter, ProgressWindow},
};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

/// Terminal state recorded by a [`LogProgressReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressOutcome {
    Running { step: usize },
    Completed,
    Failed { message: String, item_id: Option<i64> },
}

/// Opens [`LogProgressReporter`]s
#[derive(Debug, Clone, Default)]
pub struct LogProgressWindow {
    last_outcome: Arc<Mutex<Option<ProgressOutcome>>>,
}

impl LogProgressWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of the most recently opened reporter
    pub fn last_outcome(&self) -> Option<ProgressOutcome> {
        self.last_outcome.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl ProgressWindow for LogProgressWindow {
    async fn open(&self, total: usize) -> Box<dyn ProgressReporter> {
        info!(total = total, "Syncing items");
        if let Ok(mut guard) = self.last_outcome.lock() {
            *guard = Some(ProgressOutcome::Running { step: 0 });
        }

        Box::new(LogProgressReporter {
            total,
            outcome: Arc::clone(&self.last_outcome),
        })
    }
}

/// Reporter that logs each step
pub struct LogProgressReporter {
    total: usize,
    outcome: Arc<Mutex<Option<ProgressOutcome>>>,
}

impl LogProgressReporter {
    fn record(&self, outcome: ProgressOutcome) {
        if let Ok(mut guard) = self.outcome.lock() {
            *guard = Some(outcome);
        }
    }
}

#[async_trait]
impl ProgressReporter for LogProgressReporter {
    async fn update_text(&self, step: usize, item: &Item) {
        info!(
            step = step,
            total = self.total,
            item_id = item.id,
            "Item {} of {}: {}",
            step,
            self.total,
            item.title
        );
    }

    async fn update_progress(&self, step: usize) {
        self.record(ProgressOutcome::Running { step });
    }

    async fn complete(&self) {
        info!(total = self.total, "Sync complete");
        self.record(ProgressOutcome::Completed);
    }

    async fn fail(&self, message: &str, item: Option<&Item>) {
        error!(item_id = ?item.map(|i| i.id), "Sync failed: {}", message);
        self.record(ProgressOutcome::Failed {
            message: message.to_string(),
            item_id: item.map(|i| i.id),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_progress_and_completion() {
        let window = LogProgressWindow::new();
        let reporter = window.open(2).await;
        let item = Item::regular(1, "ITEM0001", "Paper");

        reporter.update_text(1, &item).await;
        reporter.update_progress(1).await;
        assert_eq!(
            window.last_outcome(),
            Some(ProgressOutcome::Running { step: 1 })
        );

        reporter.complete().await;
        assert_eq!(window.last_outcome(), Some(ProgressOutcome::Completed));
    }

    #[tokio::test]
    async fn test_records_failure_with_item() {
        let window = LogProgressWindow::new();
        let reporter = window.open(1).await;
        let item = Item::regular(7, "ITEM0007", "Paper");

        reporter.fail("boom", Some(&item)).await;
        assert_eq!(
            window.last_outcome(),
            Some(ProgressOutcome::Failed {
                message: "boom".to_string(),
                item_id: Some(7),
            })
        );
    }
}
