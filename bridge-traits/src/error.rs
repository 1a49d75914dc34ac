use thiserror::Error;

use crate::remote::ApiErrorCode;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Remote API error (status {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: ApiErrorCode,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// The remote API error code, if this error came from the remote API.
    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            BridgeError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True when the remote object addressed by the request does not exist
    /// (or is not shared with the integration).
    pub fn is_object_not_found(&self) -> bool {
        self.api_code() == Some(ApiErrorCode::ObjectNotFound)
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_not_found_detection() {
        let error = BridgeError::Api {
            status: 404,
            code: ApiErrorCode::ObjectNotFound,
            message: "Could not find page".to_string(),
        };
        assert!(error.is_object_not_found());

        let error = BridgeError::Api {
            status: 400,
            code: ApiErrorCode::ValidationError,
            message: "bad".to_string(),
        };
        assert!(!error.is_object_not_found());
        assert!(!BridgeError::OperationFailed("boom".to_string()).is_object_not_found());
    }

    #[test]
    fn test_api_error_display() {
        let error = BridgeError::Api {
            status: 401,
            code: ApiErrorCode::Unauthorized,
            message: "API token is invalid.".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Remote API error (status 401, code unauthorized): API token is invalid."
        );
    }
}
