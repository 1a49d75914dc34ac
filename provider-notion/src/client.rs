//! Notion API client implementation
//!
//! Implements the `PageStore` trait for the Notion REST API.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::remote::{
    ApiErrorCode, DatabaseSchema, PageProperties, PageResponse, PageStore, PageStoreFactory,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::NotionError;
use crate::types::{CreatePageRequest, DatabaseObject, ErrorBody, Parent, UpdatePageRequest};

/// Notion API base URL
pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";

/// API version pinned in the `Notion-Version` header
pub const NOTION_VERSION: &str = "2022-06-28";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Notion API client
///
/// Implements `PageStore` for the Notion API.
///
/// Requests go out exactly once: the sync core owns the only recovery path
/// (update → create on `object_not_found`), and a retried page creation could
/// leave duplicate pages behind.
///
/// # Example
///
/// ```ignore
/// use provider_notion::NotionClient;
/// use bridge_traits::remote::PageStore;
///
/// let client = NotionClient::new(http_client, "secret_token".to_string());
/// let schema = client.retrieve_database("bc1211ca...").await?;
/// ```
pub struct NotionClient {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Integration token
    auth_token: String,

    /// API base URL (overridable for tests and proxies)
    base_url: String,
}

impl NotionClient {
    /// Create a new Notion client
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `auth_token` - Internal integration token
    pub fn new(http_client: Arc<dyn HttpClient>, auth_token: String) -> Self {
        Self::with_base_url(http_client, auth_token, NOTION_API_BASE)
    }

    pub fn with_base_url(
        http_client: Arc<dyn HttpClient>,
        auth_token: String,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            auth_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.base_url, path))
            .bearer_token(&self.auth_token)
            .header("Notion-Version", NOTION_VERSION)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
    }

    /// Send a request and map non-2xx responses to `NotionError::Api`
    #[instrument(skip(self, body))]
    async fn send<B: Serialize + Sync>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> std::result::Result<HttpResponse, NotionError> {
        let mut request = self.build_request(method, path);
        if let Some(body) = body {
            request = request.json(body)?;
        }

        // Single attempt; page creation is not idempotent
        let response = self.http_client.execute(request).await?;

        if response.is_success() {
            debug!("API request succeeded: status={}", response.status);
            return Ok(response);
        }

        let error = Self::parse_error(&response);
        warn!("API request failed: {}", error);
        Err(error)
    }

    /// Turn an error response into `NotionError::Api`
    fn parse_error(response: &HttpResponse) -> NotionError {
        match serde_json::from_slice::<ErrorBody>(&response.body) {
            Ok(body) => NotionError::Api {
                status: body.status,
                code: body.code,
                message: body.message,
            },
            Err(_) => NotionError::Api {
                status: response.status,
                code: ApiErrorCode::Unknown,
                message: String::from_utf8_lossy(&response.body).to_string(),
            },
        }
    }

    fn parse_body<T: DeserializeOwned>(
        response: &HttpResponse,
        what: &str,
    ) -> std::result::Result<T, NotionError> {
        serde_json::from_slice(&response.body)
            .map_err(|e| NotionError::ParseError(format!("Failed to parse {}: {}", what, e)))
    }
}

#[async_trait]
impl PageStore for NotionClient {
    #[instrument(skip(self, properties), fields(database_id = %database_id))]
    async fn create_page(
        &self,
        database_id: &str,
        properties: &PageProperties,
    ) -> Result<PageResponse> {
        info!("Creating page with {} properties", properties.len());

        let body = CreatePageRequest {
            parent: Parent::DatabaseId(database_id),
            properties,
        };
        let response = self.send(HttpMethod::Post, "/pages", Some(&body)).await?;
        let page: PageResponse = Self::parse_body(&response, "page response")?;

        info!(page_id = %page.id(), "Created page");
        Ok(page)
    }

    #[instrument(skip(self, properties), fields(page_id = %page_id))]
    async fn update_page(
        &self,
        page_id: &str,
        properties: &PageProperties,
    ) -> Result<PageResponse> {
        info!("Updating page with {} properties", properties.len());

        let path = format!("/pages/{}", urlencoding::encode(page_id));
        let body = UpdatePageRequest { properties };
        let response = self.send(HttpMethod::Patch, &path, Some(&body)).await?;
        let page: PageResponse = Self::parse_body(&response, "page response")?;

        Ok(page)
    }

    #[instrument(skip(self), fields(database_id = %database_id))]
    async fn retrieve_database(&self, database_id: &str) -> Result<DatabaseSchema> {
        info!("Retrieving database schema");

        let path = format!("/databases/{}", urlencoding::encode(database_id));
        let response = self.send::<()>(HttpMethod::Get, &path, None).await?;
        let database: DatabaseObject = Self::parse_body(&response, "database")?;

        let schema = DatabaseSchema::from(database);
        debug!("Database declares {} properties", schema.properties.len());
        Ok(schema)
    }
}

/// Builds [`NotionClient`]s sharing one HTTP client
pub struct NotionClientFactory {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl NotionClientFactory {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(http_client, NOTION_API_BASE)
    }

    pub fn with_base_url(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }
}

impl PageStoreFactory for NotionClientFactory {
    fn connect(&self, auth_token: &str) -> Result<Arc<dyn PageStore>> {
        let auth_token = auth_token.trim();
        if auth_token.is_empty() {
            return Err(NotionError::MissingToken.into());
        }

        Ok(Arc::new(NotionClient::with_base_url(
            Arc::clone(&self.http_client),
            auth_token.to_string(),
            self.base_url.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::remote::{PropertyType, PropertyValue};
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn sample_properties() -> PageProperties {
        let mut properties = PageProperties::new();
        properties.insert("Name".to_string(), PropertyValue::title("Attention Is All You Need"));
        properties
    }

    const FULL_PAGE: &str = r#"{
        "object": "page",
        "id": "page-1",
        "url": "https://www.notion.so/Attention-page1",
        "properties": {}
    }"#;

    #[tokio::test]
    async fn test_create_page_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|req| {
                assert_eq!(req.method, HttpMethod::Post);
                assert_eq!(req.url, "https://api.notion.com/v1/pages");
                assert_eq!(req.headers.get("Notion-Version"), Some(&NOTION_VERSION.to_string()));
                assert_eq!(
                    req.headers.get("Authorization"),
                    Some(&"Bearer test_token".to_string())
                );

                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                assert_eq!(body["parent"]["database_id"], "db-1");
                assert!(body["properties"]["Name"]["title"].is_array());

                Ok(json_response(200, FULL_PAGE))
            });

        let client = NotionClient::new(Arc::new(mock_http), "test_token".to_string());
        let page = client
            .create_page("db-1", &sample_properties())
            .await
            .unwrap();

        assert!(matches!(page, PageResponse::Full(_)));
        assert_eq!(page.id(), "page-1");
    }

    #[tokio::test]
    async fn test_update_page_partial_response() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|req| {
                assert_eq!(req.method, HttpMethod::Patch);
                assert_eq!(req.url, "https://api.notion.com/v1/pages/page-1");
                Ok(json_response(200, r#"{ "object": "page", "id": "page-1" }"#))
            });

        let client = NotionClient::new(Arc::new(mock_http), "test_token".to_string());
        let page = client
            .update_page("page-1", &sample_properties())
            .await
            .unwrap();

        assert!(matches!(page, PageResponse::Partial(_)));
    }

    #[tokio::test]
    async fn test_update_page_not_found_keeps_code() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    404,
                    r#"{"object":"error","status":404,"code":"object_not_found","message":"Could not find page with ID: page-1."}"#,
                ))
            });

        let client = NotionClient::new(Arc::new(mock_http), "test_token".to_string());
        let error = client
            .update_page("page-1", &sample_properties())
            .await
            .unwrap_err();

        assert!(error.is_object_not_found());
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(502, "Bad Gateway")));

        let client = NotionClient::new(Arc::new(mock_http), "test_token".to_string());
        let error = client.retrieve_database("db-1").await.unwrap_err();

        match error {
            BridgeError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 502);
                assert_eq!(code, ApiErrorCode::Unknown);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retrieve_database() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|req| {
                assert_eq!(req.method, HttpMethod::Get);
                assert!(req.body.is_none());
                assert_eq!(req.url, "https://api.notion.com/v1/databases/db-1");
                Ok(json_response(
                    200,
                    r#"{
                        "object": "database",
                        "id": "db-1",
                        "title": [],
                        "properties": {
                            "Name": { "id": "title", "name": "Name", "type": "title", "title": {} },
                            "DOI": { "id": "x", "name": "DOI", "type": "rich_text", "rich_text": {} }
                        }
                    }"#,
                ))
            });

        let client = NotionClient::new(Arc::new(mock_http), "test_token".to_string());
        let schema = client.retrieve_database("db-1").await.unwrap();

        assert_eq!(schema.id, "db-1");
        assert_eq!(schema.property_type("DOI"), Some(PropertyType::RichText));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("Request timed out".to_string())));

        let client = NotionClient::new(Arc::new(mock_http), "test_token".to_string());
        let error = client.retrieve_database("db-1").await.unwrap_err();

        assert!(matches!(error, BridgeError::OperationFailed(_)));
    }

    #[test]
    fn test_factory_rejects_empty_token() {
        let factory = NotionClientFactory::new(Arc::new(MockHttpClient::new()));

        assert!(matches!(
            factory.connect("   "),
            Err(BridgeError::NotAvailable(_))
        ));
        assert!(factory.connect("secret_abc").is_ok());
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|req| {
                assert_eq!(req.url, "http://localhost:8080/v1/pages");
                Ok(json_response(200, FULL_PAGE))
            });

        let factory =
            NotionClientFactory::with_base_url(Arc::new(mock_http), "http://localhost:8080/v1/");
        let client = factory.connect("token").unwrap();
        client
            .create_page("db-1", &sample_properties())
            .await
            .unwrap();
    }
}
