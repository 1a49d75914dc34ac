//! Host Item Library Abstractions
//!
//! The reference manager owns items, notes, tags and attachments. The core only
//! sees them through the traits in this module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Host-assigned item identifier
pub type ItemId = i64;

/// Whether an item is a bibliographic record or a child note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ItemKind {
    /// Regular bibliographic item (journal article, book, ...)
    Regular,
    /// Note item. Child notes carry their parent's ID; standalone notes don't.
    Note { parent_id: Option<ItemId> },
}

/// Creator of an item (author, editor, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub first_name: Option<String>,
    pub last_name: String,
    pub creator_type: String,
}

impl Creator {
    pub fn author(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: last_name.into(),
            creator_type: "author".to_string(),
        }
    }

    /// "Last, First" or just "Last" for single-field creators
    pub fn display_name(&self) -> String {
        match self.first_name.as_deref() {
            Some(first) if !first.is_empty() => format!("{}, {}", self.last_name, first),
            _ => self.last_name.clone(),
        }
    }
}

/// A reference-manager record as seen by the sync core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Library-scoped item key (8 characters in the host)
    pub key: String,
    pub library_id: i64,
    pub kind: ItemKind,
    /// Host item type name (e.g. `journalArticle`, `note`)
    pub item_type: String,
    pub title: String,
    pub short_title: Option<String>,
    pub creators: Vec<Creator>,
    /// Free-form date field as entered by the user
    pub date: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub abstract_note: Option<String>,
    pub publication_title: Option<String>,
    pub tags: Vec<String>,
    /// Host "Extra" field; may hold `Key: value` lines such as `Citation Key: smith2020`
    pub extra: Option<String>,
    pub date_added: Option<DateTime<Utc>>,
}

impl Item {
    /// Minimal regular item, used by hosts and tests as a starting point
    pub fn regular(id: ItemId, key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            key: key.into(),
            library_id: 1,
            kind: ItemKind::Regular,
            item_type: "journalArticle".to_string(),
            title: title.into(),
            short_title: None,
            creators: Vec::new(),
            date: None,
            doi: None,
            url: None,
            abstract_note: None,
            publication_title: None,
            tags: Vec::new(),
            extra: None,
            date_added: None,
        }
    }

    /// Note item attached to `parent_id`
    pub fn note(id: ItemId, key: impl Into<String>, parent_id: Option<ItemId>) -> Self {
        Self {
            kind: ItemKind::Note { parent_id },
            item_type: "note".to_string(),
            ..Self::regular(id, key, "")
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(self.kind, ItemKind::Note { .. })
    }

    pub fn parent_id(&self) -> Option<ItemId> {
        match self.kind {
            ItemKind::Note { parent_id } => parent_id,
            ItemKind::Regular => None,
        }
    }

    /// Four-digit year found in the date field, if any
    pub fn year(&self) -> Option<i32> {
        let date = self.date.as_deref()?;
        date.as_bytes()
            .windows(4)
            .position(|w| w.iter().all(u8::is_ascii_digit))
            .and_then(|pos| date[pos..pos + 4].parse().ok())
    }

    /// Citation key stored in the Extra field (`Citation Key: ...`)
    pub fn citation_key(&self) -> Option<&str> {
        self.extra.as_deref()?.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            let value = value.trim();
            (name.trim().eq_ignore_ascii_case("citation key") && !value.is_empty())
                .then_some(value)
        })
    }

    /// Host URI that selects this item in the reference manager
    pub fn select_uri(&self) -> String {
        format!("zotero://select/library/items/{}", self.key)
    }
}

/// Citation rendering flavour requested from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationKind {
    /// Full bibliography entry
    Bibliography,
    /// In-text citation such as `(Smith, 2020)`
    InText,
}

/// Access to the host's items and notes
#[async_trait]
pub trait ItemLibrary: Send + Sync {
    /// Resolve item IDs to live items, preserving input order.
    ///
    /// IDs that no longer resolve are dropped without error.
    async fn get_items(&self, ids: &[ItemId]) -> Result<Vec<Item>>;

    /// Resolve a single item; `Ok(None)` when it no longer exists
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>>;

    /// HTML bodies of the notes attached to `item`, in host order
    async fn note_bodies(&self, item: &Item) -> Result<Vec<String>>;
}

/// Per-item sync bookkeeping stored on the host side
#[async_trait]
pub trait ItemDataStore: Send + Sync {
    /// Remote page previously associated with `item`
    async fn get_page_id(&self, item: &Item) -> Result<Option<String>>;

    /// Associate `item` with a remote page
    async fn set_page_id(&self, item: &Item, page_id: &str) -> Result<()>;

    /// Mark the item as synced (host tag)
    async fn add_synced_tag(&self, item: &Item) -> Result<()>;

    /// Save (or replace) the link attachment pointing at the remote page
    async fn save_link_attachment(&self, item: &Item, url: &str) -> Result<()>;
}

/// Host citation processor
#[async_trait]
pub trait CitationFormatter: Send + Sync {
    /// Render a citation for `item` using an export format such as
    /// `bibliography=http://www.zotero.org/styles/apa`
    async fn format_citation(&self, item: &Item, format: &str, kind: CitationKind)
        -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_parent() {
        let note = Item::note(2, "NOTE0001", Some(1));
        assert!(note.is_note());
        assert_eq!(note.parent_id(), Some(1));

        let orphan = Item::note(3, "NOTE0002", None);
        assert_eq!(orphan.parent_id(), None);

        let item = Item::regular(1, "ITEM0001", "A title");
        assert!(!item.is_note());
        assert_eq!(item.parent_id(), None);
    }

    #[test]
    fn test_year_extraction() {
        let mut item = Item::regular(1, "ITEM0001", "A title");
        assert_eq!(item.year(), None);

        item.date = Some("March 3, 2019".to_string());
        assert_eq!(item.year(), Some(2019));

        item.date = Some("2021-05-01".to_string());
        assert_eq!(item.year(), Some(2021));

        item.date = Some("n.d.".to_string());
        assert_eq!(item.year(), None);
    }

    #[test]
    fn test_citation_key_from_extra() {
        let mut item = Item::regular(1, "ITEM0001", "A title");
        item.extra = Some("PMID: 123\nCitation Key: smith2020\n".to_string());
        assert_eq!(item.citation_key(), Some("smith2020"));

        item.extra = Some("citation key:   ".to_string());
        assert_eq!(item.citation_key(), None);
    }

    #[test]
    fn test_creator_display_name() {
        assert_eq!(Creator::author("Ada", "Lovelace").display_name(), "Lovelace, Ada");

        let org = Creator {
            first_name: None,
            last_name: "W3C".to_string(),
            creator_type: "author".to_string(),
        };
        assert_eq!(org.display_name(), "W3C");
    }

    #[test]
    fn test_select_uri() {
        let item = Item::regular(1, "ABCD1234", "A title");
        assert_eq!(item.select_uri(), "zotero://select/library/items/ABCD1234");
    }
}
