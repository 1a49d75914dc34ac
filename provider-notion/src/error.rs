//! Error types for the Notion provider

use bridge_traits::remote::ApiErrorCode;
use thiserror::Error;

/// Notion provider errors
#[derive(Error, Debug)]
pub enum NotionError {
    /// API request returned an error body
    #[error("Notion API error (status {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: ApiErrorCode,
        message: String,
    },

    /// Missing or empty integration token
    #[error("Notion integration token is missing")]
    MissingToken,

    /// Failed to build a request or parse an API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Notion operations
pub type Result<T> = std::result::Result<T, NotionError>;

impl From<NotionError> for bridge_traits::error::BridgeError {
    fn from(error: NotionError) -> Self {
        match error {
            NotionError::Api {
                status,
                code,
                message,
            } => bridge_traits::error::BridgeError::Api {
                status,
                code,
                message,
            },
            NotionError::MissingToken => bridge_traits::error::BridgeError::NotAvailable(
                "Notion integration token is missing".to_string(),
            ),
            NotionError::ParseError(msg) => {
                bridge_traits::error::BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            NotionError::BridgeError(e) => e,
        }
    }
}
