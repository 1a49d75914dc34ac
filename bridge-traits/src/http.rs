//! HTTP Client Abstraction
//!
//! The remote page store talks to its API through [`HttpClient`]; hosts
//! supply the transport (reqwest on desktop, the host's own fetch elsewhere).

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Methods the remote API is called with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
        }
    }
}

/// Outgoing request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.into()))
    }

    /// Serialize `body` as the JSON payload
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let payload = serde_json::to_vec(body).map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to encode request body: {}", e))
        })?;
        self.body = Some(Bytes::from(payload));
        Ok(self.header("Content-Type", "application/json"))
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// Response as received; non-2xx statuses are not errors at this layer
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Async HTTP transport
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest, HttpMethod};
///
/// async fn fetch_database(client: &dyn HttpClient) -> Result<HttpResponse> {
///     let request = HttpRequest::new(HttpMethod::Get, "https://api.notion.com/v1/databases/abc")
///         .bearer_token("secret_token")
///         .header("Notion-Version", "2022-06-28");
///
///     client.execute(request).await
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send `request` once.
    ///
    /// # Errors
    ///
    /// Transport failures only (connection, TLS, timeout). Error statuses
    /// come back as responses.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}
