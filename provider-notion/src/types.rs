//! Notion API request and response types
//!
//! Data structures for (de)serializing Notion API payloads. Page responses
//! deserialize directly into [`bridge_traits::remote::PageResponse`].

use bridge_traits::remote::{ApiErrorCode, DatabaseSchema, PageProperties, PropertySchema};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error body returned with every non-2xx response
///
/// See: https://developers.notion.com/reference/status-codes
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub code: ApiErrorCode,
    pub message: String,
}

/// Page parent
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parent<'a> {
    DatabaseId(&'a str),
}

/// POST /v1/pages body
///
/// See: https://developers.notion.com/reference/post-page
#[derive(Debug, Serialize)]
pub struct CreatePageRequest<'a> {
    pub parent: Parent<'a>,
    pub properties: &'a PageProperties,
}

/// PATCH /v1/pages/{page_id} body
///
/// See: https://developers.notion.com/reference/patch-page
#[derive(Debug, Serialize)]
pub struct UpdatePageRequest<'a> {
    pub properties: &'a PageProperties,
}

/// Rich-text item as returned by the API (only the plain text is kept)
#[derive(Debug, Deserialize)]
pub struct RichTextItem {
    #[serde(default)]
    pub plain_text: String,
}

/// GET /v1/databases/{database_id} response
///
/// See: https://developers.notion.com/reference/retrieve-a-database
#[derive(Debug, Deserialize)]
pub struct DatabaseObject {
    pub id: String,
    #[serde(default)]
    pub title: Vec<RichTextItem>,
    pub properties: HashMap<String, PropertySchema>,
}

impl From<DatabaseObject> for DatabaseSchema {
    fn from(database: DatabaseObject) -> Self {
        DatabaseSchema {
            id: database.id,
            title: database.title.into_iter().map(|t| t.plain_text).collect(),
            properties: database.properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::remote::{PropertyType, PropertyValue};

    #[test]
    fn test_deserialize_error_body() {
        let json = r#"{
            "object": "error",
            "status": 404,
            "code": "object_not_found",
            "message": "Could not find page with ID: abc. Make sure the relevant pages and databases are shared with your integration."
        }"#;

        let body: ErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.status, 404);
        assert_eq!(body.code, ApiErrorCode::ObjectNotFound);
    }

    #[test]
    fn test_deserialize_database() {
        let json = r#"{
            "object": "database",
            "id": "bc1211ca-e3f1-4939-ae34-5260b16f627c",
            "title": [{ "type": "text", "plain_text": "Reading ", "text": { "content": "Reading " } },
                      { "type": "text", "plain_text": "List", "text": { "content": "List" } }],
            "properties": {
                "Name": { "id": "title", "name": "Name", "type": "title", "title": {} },
                "Year": { "id": "%3AGz", "name": "Year", "type": "number", "number": { "format": "number" } },
                "Status": { "id": "abc", "name": "Status", "type": "button", "button": {} }
            }
        }"#;

        let database: DatabaseObject = serde_json::from_str(json).unwrap();
        let schema = DatabaseSchema::from(database);
        assert_eq!(schema.title, "Reading List");
        assert_eq!(schema.title_property(), Some("Name"));
        assert_eq!(schema.property_type("Year"), Some(PropertyType::Number));
        assert_eq!(schema.property_type("Status"), Some(PropertyType::Unsupported));
    }

    #[test]
    fn test_serialize_create_request() {
        let mut properties = PageProperties::new();
        properties.insert("Name".to_string(), PropertyValue::title("Paper"));

        let request = CreatePageRequest {
            parent: Parent::DatabaseId("db-1"),
            properties: &properties,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "parent": { "database_id": "db-1" },
                "properties": { "Name": { "title": [{ "text": { "content": "Paper" } }] } }
            })
        );
    }
}
