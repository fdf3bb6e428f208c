//! Error Types
//!
//! Errors raised by the REST gateway, client-side validation and batch commits.

/// Result alias for gateway calls
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// No token, or the stored token has expired
    #[error("Not signed in")]
    Unauthenticated,

    /// Transport failure before any HTTP status was received
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status with the server's detail text
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Success status but an unreadable body
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Rejected locally before any request was made
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthenticated | ApiError::Status { status: 401, .. })
    }

    /// Only transport and server-side failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Prefix the message with the action that failed, keeping the variant
    pub fn context(self, action: &str) -> ApiError {
        match self {
            ApiError::Network(msg) => ApiError::Network(format!("Failed to {action}: {msg}")),
            ApiError::Status { status, message } => ApiError::Status {
                status,
                message: format!("Failed to {action}: {message}"),
            },
            ApiError::Decode(msg) => ApiError::Decode(format!("Failed to {action}: {msg}")),
            other => other,
        }
    }
}

impl From<serde_wasm_bindgen::Error> for ApiError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_variant() {
        let err = ApiError::Status { status: 404, message: "Yarn item not found".into() }
            .context("update yarn item");
        assert_eq!(err.to_string(), "Failed to update yarn item: Yarn item not found");
        assert!(matches!(err, ApiError::Status { status: 404, .. }));

        assert_eq!(ApiError::Unauthenticated.context("x"), ApiError::Unauthenticated);
    }

    #[test]
    fn test_retryable() {
        assert!(ApiError::Network("offline".into()).is_retryable());
        assert!(ApiError::Status { status: 503, message: String::new() }.is_retryable());
        assert!(!ApiError::Status { status: 422, message: String::new() }.is_retryable());
        assert!(!ApiError::Unauthenticated.is_retryable());
        assert!(ApiError::Status { status: 401, message: String::new() }.is_auth());
    }
}
