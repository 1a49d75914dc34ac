use bridge_traits::error::BridgeError;
use bridge_traits::library::{Item, ItemId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync setup failed: {0}")]
    Setup(String),

    #[error("Preference error: {0}")]
    Preferences(#[from] core_runtime::Error),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(
        "Notion returned a partial page ({page_id}). Enable the \"Read content\" \
         capability for your Notion integration and sync again."
    )]
    MissingReadCapability { page_id: String },

    #[error("Failed to sync item {}: {source}", .item.id)]
    ItemFailed {
        item: Box<Item>,
        source: Box<SyncError>,
    },

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },
}

impl SyncError {
    /// Wrap `source` with the item being iterated when it occurred
    pub fn item_failed(item: &Item, source: SyncError) -> Self {
        SyncError::ItemFailed {
            item: Box::new(item.clone()),
            source: Box::new(source),
        }
    }

    /// Item the failure is attributed to, if any
    pub fn failed_item(&self) -> Option<&Item> {
        match self {
            SyncError::ItemFailed { item, .. } => Some(&**item),
            _ => None,
        }
    }

    pub fn failed_item_id(&self) -> Option<ItemId> {
        self.failed_item().map(|item| item.id)
    }

    /// The underlying failure with any item wrapper removed
    pub fn cause(&self) -> &SyncError {
        match self {
            SyncError::ItemFailed { source, .. } => source.cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
