//! Progress Reporting Abstraction
//!
//! Each sync job opens one progress reporter sized to the number of items it
//! will process. Steps are 1-based.

use async_trait::async_trait;

use crate::library::Item;

/// Per-job progress sink
///
/// Progress is display-only: implementations swallow their own UI failures
/// instead of failing the sync job.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Show which item step `step` is working on
    async fn update_text(&self, step: usize, item: &Item);

    /// Advance the progress bar to `step`
    async fn update_progress(&self, step: usize);

    /// Terminal success state
    async fn complete(&self);

    /// Terminal failure state; `item` is the failing item when known
    async fn fail(&self, message: &str, item: Option<&Item>);
}

/// Factory for progress reporters (the host window)
#[async_trait]
pub trait ProgressWindow: Send + Sync {
    /// Open a reporter for a job over `total` items
    async fn open(&self, total: usize) -> Box<dyn ProgressReporter>;
}
