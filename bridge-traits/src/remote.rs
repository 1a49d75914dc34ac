//! Remote Document Database Abstractions
//!
//! Types and traits describing the hosted document database the core writes
//! to: database schemas, page property values, page responses and API error
//! codes. Values serialize to the remote API's JSON shape directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Maximum characters in one rich-text content object
pub const RICH_TEXT_CONTENT_LIMIT: usize = 2000;

/// Maximum rich-text objects in one property value
pub const RICH_TEXT_ARRAY_LIMIT: usize = 100;

// ============================================================================
// Error Codes
// ============================================================================

/// Error codes returned by the remote API in error response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    InvalidJson,
    InvalidRequestUrl,
    InvalidRequest,
    InvalidGrant,
    ValidationError,
    MissingVersion,
    Unauthorized,
    RestrictedResource,
    ObjectNotFound,
    ConflictError,
    RateLimited,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
    DatabaseConnectionUnavailable,
    GatewayTimeout,
    /// Code not recognized, or no parseable error body
    #[serde(other)]
    Unknown,
}

impl ApiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidJson => "invalid_json",
            ApiErrorCode::InvalidRequestUrl => "invalid_request_url",
            ApiErrorCode::InvalidRequest => "invalid_request",
            ApiErrorCode::InvalidGrant => "invalid_grant",
            ApiErrorCode::ValidationError => "validation_error",
            ApiErrorCode::MissingVersion => "missing_version",
            ApiErrorCode::Unauthorized => "unauthorized",
            ApiErrorCode::RestrictedResource => "restricted_resource",
            ApiErrorCode::ObjectNotFound => "object_not_found",
            ApiErrorCode::ConflictError => "conflict_error",
            ApiErrorCode::RateLimited => "rate_limited",
            ApiErrorCode::InternalServerError => "internal_server_error",
            ApiErrorCode::BadGateway => "bad_gateway",
            ApiErrorCode::ServiceUnavailable => "service_unavailable",
            ApiErrorCode::DatabaseConnectionUnavailable => "database_connection_unavailable",
            ApiErrorCode::GatewayTimeout => "gateway_timeout",
            ApiErrorCode::Unknown => "unknown",
        }
    }

    /// Parse a wire code; unrecognized codes become [`ApiErrorCode::Unknown`]
    pub fn from_code(code: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(code.to_string()))
            .unwrap_or(ApiErrorCode::Unknown)
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Database Schema
// ============================================================================

/// Declared type of a database property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Title,
    RichText,
    Number,
    Select,
    MultiSelect,
    Status,
    Date,
    People,
    Files,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    Formula,
    Relation,
    Rollup,
    CreatedTime,
    CreatedBy,
    LastEditedTime,
    LastEditedBy,
    /// Types the core never writes
    #[serde(other)]
    Unsupported,
}

/// One property declared by a database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}

/// Property schema of a remote database, keyed by property name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub id: String,
    pub title: String,
    pub properties: HashMap<String, PropertySchema>,
}

impl DatabaseSchema {
    /// Declared type of property `name`
    pub fn property_type(&self, name: &str) -> Option<PropertyType> {
        self.properties.get(name).map(|p| p.property_type)
    }

    /// Name of the database's title property (every database has exactly one)
    pub fn title_property(&self) -> Option<&str> {
        self.properties
            .values()
            .find(|p| p.property_type == PropertyType::Title)
            .map(|p| p.name.as_str())
    }

    /// Whether the database declares `name` with type `property_type`
    pub fn accepts(&self, name: &str, property_type: PropertyType) -> bool {
        self.property_type(name) == Some(property_type)
    }
}

// ============================================================================
// Property Values
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

/// Rich-text object (plain text only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub text: TextContent,
}

impl RichText {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            text: TextContent {
                content: content.into(),
            },
        }
    }

    /// Split `text` into rich-text objects that respect the content and array
    /// limits. Text beyond the array limit is dropped.
    pub fn chunked(text: &str) -> Vec<RichText> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(RICH_TEXT_CONTENT_LIMIT)
            .take(RICH_TEXT_ARRAY_LIMIT)
            .map(|chunk| RichText::plain(chunk.iter().collect::<String>()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
}

/// Value written to one page property
///
/// Serializes externally tagged, which is the remote API's request shape:
/// `{"rich_text": [{"text": {"content": "..."}}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Number(Option<f64>),
    Select(Option<SelectOption>),
    MultiSelect(Vec<SelectOption>),
    Date(Option<DateValue>),
    Url(Option<String>),
}

impl PropertyValue {
    pub fn title(text: &str) -> Self {
        PropertyValue::Title(RichText::chunked(text))
    }

    pub fn rich_text(text: &str) -> Self {
        PropertyValue::RichText(RichText::chunked(text))
    }

    pub fn select(name: impl Into<String>) -> Self {
        PropertyValue::Select(Some(SelectOption { name: name.into() }))
    }

    pub fn multi_select<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyValue::MultiSelect(
            names
                .into_iter()
                .map(|name| SelectOption {
                    // Commas are not allowed in option names
                    name: name.into().replace(',', ";"),
                })
                .collect(),
        )
    }

    pub fn date(start: impl Into<String>) -> Self {
        PropertyValue::Date(Some(DateValue {
            start: start.into(),
        }))
    }

    /// Schema type this value can be written to
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Title(_) => PropertyType::Title,
            PropertyValue::RichText(_) => PropertyType::RichText,
            PropertyValue::Number(_) => PropertyType::Number,
            PropertyValue::Select(_) => PropertyType::Select,
            PropertyValue::MultiSelect(_) => PropertyType::MultiSelect,
            PropertyValue::Date(_) => PropertyType::Date,
            PropertyValue::Url(_) => PropertyType::Url,
        }
    }

    /// Concatenated plain text of title/rich-text values
    pub fn plain_text(&self) -> Option<String> {
        match self {
            PropertyValue::Title(parts) | PropertyValue::RichText(parts) => Some(
                parts
                    .iter()
                    .map(|part| part.text.content.as_str())
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// Property set for one page, keyed by property name
pub type PageProperties = BTreeMap<String, PropertyValue>;

// ============================================================================
// Page Responses
// ============================================================================

/// Complete page representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub url: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Page {
    /// URL that opens the page in the desktop app instead of the browser
    pub fn app_url(&self) -> String {
        match self.url.strip_prefix("https://") {
            Some(rest) => format!("notion://{}", rest),
            None => self.url.clone(),
        }
    }
}

/// Restricted page representation (integration lacks read access)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialPage {
    pub id: String,
}

/// Result of a page create or update call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResponse {
    Full(Page),
    Partial(PartialPage),
}

impl PageResponse {
    pub fn id(&self) -> &str {
        match self {
            PageResponse::Full(page) => &page.id,
            PageResponse::Partial(page) => &page.id,
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Remote page and database operations
///
/// Implementations must report API failures as
/// [`BridgeError::Api`](crate::error::BridgeError::Api) with the API's error
/// code preserved.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Create a page in `database_id`
    async fn create_page(
        &self,
        database_id: &str,
        properties: &PageProperties,
    ) -> Result<PageResponse>;

    /// Replace the given properties on an existing page
    async fn update_page(&self, page_id: &str, properties: &PageProperties)
        -> Result<PageResponse>;

    /// Retrieve the property schema of `database_id`
    async fn retrieve_database(&self, database_id: &str) -> Result<DatabaseSchema>;
}

/// Builds an authenticated [`PageStore`]
pub trait PageStoreFactory: Send + Sync {
    fn connect(&self, auth_token: &str) -> Result<Arc<dyn PageStore>>;
}
