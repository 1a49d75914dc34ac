//! # Page Property Building
//!
//! Maps one item to the property values written to its page.
//!
//! [`SchemaPropertyBuilder`] only emits properties the target database
//! declares, with a matching type. The title property is always written,
//! under whatever name the database gives it. Users opt into the other
//! properties by adding a column with one of these names:
//!
//! | Property           | Value                                  |
//! |--------------------|----------------------------------------|
//! | `Authors`          | creators, `Last, First; ...`           |
//! | `Year`             | year from the date field               |
//! | `DOI`              | DOI                                    |
//! | `URL`              | URL                                    |
//! | `Item Type`        | host item type                         |
//! | `Publication`      | publication title                      |
//! | `Abstract`         | abstract                               |
//! | `Tags`             | tags (multi-select only)               |
//! | `Full Citation`    | bibliography entry (rich text only)    |
//! | `In-Text Citation` | in-text citation (rich text only)      |
//! | `Notes`            | folded child notes                     |
//! | `Zotero URI`       | `zotero://select/...` link             |
//! | `Date Added`       | date added (date only)                 |
//!
//! Text values are written to rich text, url or select columns; `Year` is
//! also accepted by number columns. Empty values clear the column.

use crate::Result;
use async_trait::async_trait;
use bridge_traits::library::{CitationFormatter, CitationKind, Item};
use bridge_traits::remote::{DatabaseSchema, PageProperties, PropertyType, PropertyValue};
use core_runtime::config::PageTitleFormat;
use std::sync::Arc;
use tracing::{debug, warn};

pub const AUTHORS: &str = "Authors";
pub const YEAR: &str = "Year";
pub const DOI: &str = "DOI";
pub const URL: &str = "URL";
pub const ITEM_TYPE: &str = "Item Type";
pub const PUBLICATION: &str = "Publication";
pub const ABSTRACT: &str = "Abstract";
pub const TAGS: &str = "Tags";
pub const FULL_CITATION: &str = "Full Citation";
pub const IN_TEXT_CITATION: &str = "In-Text Citation";
pub const NOTES: &str = "Notes";
pub const ZOTERO_URI: &str = "Zotero URI";
pub const DATE_ADDED: &str = "Date Added";

/// An item plus the plain-text notes folded into it for this sync
#[derive(Debug, Clone, PartialEq)]
pub struct SyncItem {
    pub item: Item,
    pub notes: String,
}

impl SyncItem {
    pub fn new(item: Item, notes: impl Into<String>) -> Self {
        Self {
            item,
            notes: notes.into(),
        }
    }
}

/// Inputs for building one page's properties
#[derive(Debug, Clone, Copy)]
pub struct PropertyRequest<'a> {
    pub item: &'a SyncItem,
    pub citation_format: &'a str,
    pub schema: &'a DatabaseSchema,
    pub page_title_format: PageTitleFormat,
}

/// Builds the property set for an item's page
#[async_trait]
pub trait PropertyBuilder: Send + Sync {
    async fn build_properties(&self, request: PropertyRequest<'_>) -> Result<PageProperties>;
}

/// Default [`PropertyBuilder`] driven by the target database's schema
pub struct SchemaPropertyBuilder {
    citations: Arc<dyn CitationFormatter>,
}

impl SchemaPropertyBuilder {
    pub fn new(citations: Arc<dyn CitationFormatter>) -> Self {
        Self { citations }
    }

    async fn citation(&self, item: &Item, format: &str, kind: CitationKind) -> Result<String> {
        let text = self.citations.format_citation(item, format, kind).await?;
        Ok(text.trim().to_string())
    }

    async fn title(&self, item: &Item, format: &str, mode: PageTitleFormat) -> Result<String> {
        let title = match mode {
            PageTitleFormat::ItemTitle => item.title.clone(),
            PageTitleFormat::ItemShortTitle => item.short_title.clone().unwrap_or_default(),
            PageTitleFormat::ItemCitationKey => {
                item.citation_key().map(str::to_string).unwrap_or_default()
            }
            PageTitleFormat::ItemAuthorDateCitation => author_date(item),
            PageTitleFormat::ItemInTextCitation => {
                self.citation(item, format, CitationKind::InText).await?
            }
            PageTitleFormat::ItemFullCitation => {
                self.citation(item, format, CitationKind::Bibliography)
                    .await?
            }
        };

        if title.trim().is_empty() {
            debug!(item_id = item.id, mode = %mode, "Empty title for format; using item title");
            return Ok(item.title.clone());
        }
        Ok(title)
    }
}

#[async_trait]
impl PropertyBuilder for SchemaPropertyBuilder {
    async fn build_properties(&self, request: PropertyRequest<'_>) -> Result<PageProperties> {
        let PropertyRequest {
            item: sync_item,
            citation_format,
            schema,
            page_title_format,
        } = request;
        let item = &sync_item.item;
        let mut properties = PageProperties::new();

        let title = self.title(item, citation_format, page_title_format).await?;
        match schema.title_property() {
            Some(name) => {
                properties.insert(name.to_string(), PropertyValue::title(&title));
            }
            None => warn!(database_id = %schema.id, "Database has no title property"),
        }

        let authors = item
            .creators
            .iter()
            .map(|creator| creator.display_name())
            .collect::<Vec<_>>()
            .join("; ");
        insert_text(&mut properties, schema, AUTHORS, &authors);

        match schema.property_type(YEAR) {
            Some(PropertyType::Number) => {
                properties.insert(
                    YEAR.to_string(),
                    PropertyValue::Number(item.year().map(f64::from)),
                );
            }
            _ => {
                let year = item.year().map(|y| y.to_string()).unwrap_or_default();
                insert_text(&mut properties, schema, YEAR, &year);
            }
        }

        insert_text(&mut properties, schema, DOI, item.doi.as_deref().unwrap_or(""));
        insert_text(&mut properties, schema, URL, item.url.as_deref().unwrap_or(""));
        insert_text(&mut properties, schema, ITEM_TYPE, &item.item_type);
        insert_text(
            &mut properties,
            schema,
            PUBLICATION,
            item.publication_title.as_deref().unwrap_or(""),
        );
        insert_text(
            &mut properties,
            schema,
            ABSTRACT,
            item.abstract_note.as_deref().unwrap_or(""),
        );
        insert_text(&mut properties, schema, NOTES, &sync_item.notes);
        insert_text(&mut properties, schema, ZOTERO_URI, &item.select_uri());

        if schema.accepts(TAGS, PropertyType::MultiSelect) {
            properties.insert(
                TAGS.to_string(),
                PropertyValue::multi_select(item.tags.iter().cloned()),
            );
        }

        if schema.accepts(DATE_ADDED, PropertyType::Date) {
            let value = match item.date_added {
                Some(added) => PropertyValue::date(added.to_rfc3339()),
                None => PropertyValue::Date(None),
            };
            properties.insert(DATE_ADDED.to_string(), value);
        }

        if schema.accepts(FULL_CITATION, PropertyType::RichText) {
            let text = self
                .citation(item, citation_format, CitationKind::Bibliography)
                .await?;
            properties.insert(FULL_CITATION.to_string(), PropertyValue::rich_text(&text));
        }

        if schema.accepts(IN_TEXT_CITATION, PropertyType::RichText) {
            let text = self
                .citation(item, citation_format, CitationKind::InText)
                .await?;
            properties.insert(
                IN_TEXT_CITATION.to_string(),
                PropertyValue::rich_text(&text),
            );
        }

        debug!(item_id = item.id, count = properties.len(), "Built page properties");
        Ok(properties)
    }
}

/// Insert a text-like value in whatever text-capable type `name` is declared
/// with. Empty text clears the property.
fn insert_text(properties: &mut PageProperties, schema: &DatabaseSchema, name: &str, text: &str) {
    let text = text.trim();
    let value = match schema.property_type(name) {
        Some(PropertyType::RichText) => PropertyValue::rich_text(text),
        Some(PropertyType::Url) if text.is_empty() => PropertyValue::Url(None),
        Some(PropertyType::Url) => PropertyValue::Url(Some(text.to_string())),
        Some(PropertyType::Select) if text.is_empty() => PropertyValue::Select(None),
        // Commas are not allowed in option names
        Some(PropertyType::Select) => PropertyValue::select(text.replace(',', ";")),
        _ => return,
    };
    properties.insert(name.to_string(), value);
}

/// "Smith (2020)", "Smith and Jones (2020)" or "Smith et al. (2020)"
fn author_date(item: &Item) -> String {
    let authors: Vec<&str> = item
        .creators
        .iter()
        .filter(|c| c.creator_type == "author")
        .map(|c| c.last_name.as_str())
        .collect();
    let creators: Vec<&str> = if authors.is_empty() {
        item.creators.iter().map(|c| c.last_name.as_str()).collect()
    } else {
        authors
    };

    let names = match creators.as_slice() {
        [] => return String::new(),
        [one] => one.to_string(),
        [first, second] => format!("{} and {}", first, second),
        [first, ..] => format!("{} et al.", first),
    };

    match item.year() {
        Some(year) => format!("{} ({})", names, year),
        None => format!("{} (n.d.)", names),
    }
}
