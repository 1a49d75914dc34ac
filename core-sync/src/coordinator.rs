//! # Sync Coordinator
//!
//! Syncs a user-selected batch of items to pages in a Notion database.
//!
//! ## Workflow
//!
//! 1. Deduplicate the requested IDs; an empty request does nothing at all
//! 2. Resolve IDs to live items (stale IDs are dropped)
//! 3. Open a progress reporter sized to the resolved items
//! 4. Load preferences, connect the page store, retrieve the database schema
//! 5. Sync items one at a time, stopping at the first failure
//! 6. Report completion, or the failure and the item it belongs to
//!
//! Per item, child notes are folded into their parent: a note entry syncs its
//! parent, and a regular item's notes are joined, stripped of HTML and written
//! to the parent's page. Pages are upserted by the page ID stored on the item;
//! a stored ID whose page no longer exists is replaced by a new page.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::SyncCoordinator;
//!
//! let coordinator = SyncCoordinator::new(
//!     library,
//!     data_store,
//!     preference_store,
//!     Arc::new(NotionClientFactory::new(http_client)),
//!     Arc::new(SchemaPropertyBuilder::new(citations)),
//!     Arc::new(SystemClock),
//! );
//!
//! let outcome = coordinator.perform_sync_job(&[12, 15], window.as_ref()).await;
//! ```

use crate::{
    job::{BatchProgress, ItemSyncState, SyncJobContext, SyncJobId, SyncJobOutcome},
    notes::fold_notes,
    properties::{PropertyBuilder, PropertyRequest, SyncItem},
    Result, SyncError,
};
use bridge_traits::library::{Item, ItemDataStore, ItemId, ItemLibrary};
use bridge_traits::preferences::PreferenceStore;
use bridge_traits::progress::{ProgressReporter, ProgressWindow};
use bridge_traits::remote::{PageResponse, PageStoreFactory};
use bridge_traits::time::Clock;
use core_runtime::config::SyncPreferences;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one batch entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryOutcome {
    Synced,
    Skipped,
}

/// Orchestrates sync jobs over the host bridges
pub struct SyncCoordinator {
    library: Arc<dyn ItemLibrary>,
    data_store: Arc<dyn ItemDataStore>,
    preferences: Arc<dyn PreferenceStore>,
    page_stores: Arc<dyn PageStoreFactory>,
    property_builder: Arc<dyn PropertyBuilder>,
    clock: Arc<dyn Clock>,
}

impl SyncCoordinator {
    pub fn new(
        library: Arc<dyn ItemLibrary>,
        data_store: Arc<dyn ItemDataStore>,
        preferences: Arc<dyn PreferenceStore>,
        page_stores: Arc<dyn PageStoreFactory>,
        property_builder: Arc<dyn PropertyBuilder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            library,
            data_store,
            preferences,
            page_stores,
            property_builder,
            clock,
        }
    }

    /// Sync the items in `item_ids` and report the result through `window`.
    ///
    /// Never fails: every error ends up logged and shown in the progress
    /// window, and is mirrored in the returned outcome.
    pub async fn perform_sync_job(
        &self,
        item_ids: &[ItemId],
        window: &dyn ProgressWindow,
    ) -> SyncJobOutcome {
        let ids = dedup_ids(item_ids);
        if ids.is_empty() {
            debug!("No items selected; nothing to sync");
            return SyncJobOutcome::Skipped;
        }

        let job_id = SyncJobId::new();
        let started_at = self.clock.now();
        info!(job_id = %job_id, requested = ids.len(), "Starting sync job");

        let items = match self.library.get_items(&ids).await {
            Ok(items) => items,
            Err(e) => {
                let progress: Arc<dyn ProgressReporter> = Arc::from(window.open(ids.len()).await);
                return self
                    .report_failure(job_id, &SyncError::from(e), progress.as_ref())
                    .await;
            }
        };
        if items.len() < ids.len() {
            debug!(
                job_id = %job_id,
                dropped = ids.len() - items.len(),
                "Dropped item IDs that no longer resolve"
            );
        }

        let progress: Arc<dyn ProgressReporter> = Arc::from(window.open(items.len()).await);

        let context = match self.prepare(job_id, items, Arc::clone(&progress)).await {
            Ok(context) => context,
            Err(e) => return self.report_failure(job_id, &e, progress.as_ref()).await,
        };

        match self.perform(&context).await {
            Ok(batch) => {
                progress.complete().await;
                let synced = batch.count(ItemSyncState::Succeeded);
                let skipped = batch.count(ItemSyncState::Skipped);
                info!(
                    job_id = %job_id,
                    synced,
                    skipped,
                    elapsed_ms = context.elapsed_ms(self.clock.as_ref()),
                    "Sync job completed"
                );
                SyncJobOutcome::Completed { synced, skipped }
            }
            Err(e) => {
                debug!(
                    job_id = %job_id,
                    elapsed_ms = (self.clock.now() - started_at).num_milliseconds(),
                    "Sync job stopped"
                );
                self.report_failure(job_id, &e, progress.as_ref()).await
            }
        }
    }

    /// Load preferences, connect to the remote database and read its schema.
    async fn prepare(
        &self,
        job_id: SyncJobId,
        items: Vec<Item>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<SyncJobContext> {
        let preferences = SyncPreferences::load(self.preferences.as_ref()).await?;
        debug!(job_id = %job_id, ?preferences, "Loaded sync preferences");

        let page_store = self.page_stores.connect(&preferences.notion_token)?;
        let schema = page_store.retrieve_database(&preferences.database_id).await?;
        if schema.title_property().is_none() {
            return Err(SyncError::Setup(format!(
                "Notion database {} has no title property",
                preferences.database_id
            )));
        }

        Ok(SyncJobContext::new(
            job_id,
            preferences,
            schema,
            items,
            page_store,
            progress,
            self.clock.as_ref(),
        ))
    }

    /// Sync every item of the job in order.
    ///
    /// The first error aborts the batch; it carries the failing item.
    #[instrument(skip_all, fields(job_id = %context.job_id, items = context.items.len()))]
    pub async fn perform(&self, context: &SyncJobContext) -> Result<BatchProgress> {
        let mut batch = BatchProgress::new(&context.items);

        for (index, item) in context.items.iter().enumerate() {
            let step = index + 1;
            context.progress.update_text(step, item).await;
            batch.advance(index, ItemSyncState::Syncing)?;

            match self.sync_entry(context, item).await {
                Ok(EntryOutcome::Synced) => batch.advance(index, ItemSyncState::Succeeded)?,
                Ok(EntryOutcome::Skipped) => batch.advance(index, ItemSyncState::Skipped)?,
                Err(e) => {
                    batch.advance(index, ItemSyncState::Failed)?;
                    return Err(e);
                }
            }

            context.progress.update_progress(step).await;
        }

        Ok(batch)
    }

    /// Sync one batch entry. Errors come back wrapped with the item that
    /// was being synced: the entry itself, or the parent for a child note.
    async fn sync_entry(&self, context: &SyncJobContext, item: &Item) -> Result<EntryOutcome> {
        let parent;
        let target = if item.is_note() {
            let Some(parent_id) = item.parent_id() else {
                debug!(item_id = item.id, "Standalone note; skipping");
                return Ok(EntryOutcome::Skipped);
            };

            parent = match self.library.get_item(parent_id).await {
                Ok(Some(parent)) if !parent.is_note() => parent,
                Ok(Some(_)) => {
                    warn!(item_id = item.id, parent_id, "Note parent is not a regular item; skipping");
                    return Ok(EntryOutcome::Skipped);
                }
                Ok(None) => {
                    debug!(item_id = item.id, parent_id, "Note parent no longer exists; skipping");
                    return Ok(EntryOutcome::Skipped);
                }
                Err(e) => return Err(SyncError::item_failed(item, e.into())),
            };
            &parent
        } else {
            item
        };

        self.sync_item_and_notes(context, target)
            .await
            .map_err(|e| SyncError::item_failed(target, e))?;
        Ok(EntryOutcome::Synced)
    }

    /// Fold the item's child notes into plain text, then sync the item.
    #[instrument(skip_all, fields(item_id = item.id))]
    pub async fn sync_item_and_notes(&self, context: &SyncJobContext, item: &Item) -> Result<()> {
        let bodies = self.library.note_bodies(item).await?;
        let notes = fold_notes(&bodies);
        debug!(notes = bodies.len(), chars = notes.chars().count(), "Folded child notes");

        self.sync_regular_item(context, &SyncItem::new(item.clone(), notes))
            .await
    }

    /// Upsert the item's page, tag the item and link it to the page.
    pub async fn sync_regular_item(
        &self,
        context: &SyncJobContext,
        sync_item: &SyncItem,
    ) -> Result<()> {
        let item = &sync_item.item;
        let response = self.save_item_to_database(context, sync_item).await?;

        self.data_store.add_synced_tag(item).await?;

        match response {
            PageResponse::Full(page) => {
                self.data_store.set_page_id(item, &page.id).await?;
                self.data_store
                    .save_link_attachment(item, &page.app_url())
                    .await?;
                info!(item_id = item.id, page_id = %page.id, "Item synced");
                Ok(())
            }
            PageResponse::Partial(page) => {
                Err(SyncError::MissingReadCapability { page_id: page.id })
            }
        }
    }

    /// Update the item's page if it has one, otherwise create it.
    ///
    /// An update that fails with `object_not_found` falls through to create;
    /// every other error is returned as is.
    pub async fn save_item_to_database(
        &self,
        context: &SyncJobContext,
        sync_item: &SyncItem,
    ) -> Result<PageResponse> {
        let page_id = self.data_store.get_page_id(&sync_item.item).await?;

        let properties = self
            .property_builder
            .build_properties(PropertyRequest {
                item: sync_item,
                citation_format: &context.citation_format,
                schema: &context.schema,
                page_title_format: context.page_title_format,
            })
            .await?;

        if let Some(page_id) = page_id {
            match context.page_store.update_page(&page_id, &properties).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_object_not_found() => {
                    info!(
                        item_id = sync_item.item.id,
                        page_id = %page_id,
                        "Stored page no longer exists; creating a new one"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let response = context
            .page_store
            .create_page(&context.database_id, &properties)
            .await?;
        Ok(response)
    }

    async fn report_failure(
        &self,
        job_id: SyncJobId,
        error: &SyncError,
        progress: &dyn ProgressReporter,
    ) -> SyncJobOutcome {
        let cause = error.cause();
        let message = cause.to_string();
        let item = error.failed_item();
        let item_id = item.map(|item| item.id);

        match error_stack(cause) {
            Some(stack) => error!(job_id = %job_id, item_id, stack = %stack, "{}", message),
            None => error!(job_id = %job_id, item_id, "{}", message),
        }

        progress.fail(&message, item).await;

        SyncJobOutcome::Failed { item_id, message }
    }
}

/// Remove duplicate IDs, keeping first occurrences in order
fn dedup_ids(ids: &[ItemId]) -> Vec<ItemId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Source chain of `error`, one cause per line
fn error_stack(error: &SyncError) -> Option<String> {
    let mut causes = Vec::new();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        causes.push(format!("caused by: {}", cause));
        source = cause.source();
    }

    (!causes.is_empty()).then(|| causes.join("\n"))
}
