//! Remote call error types
//!
//! Error definitions with transient/permanent classification for retry logic.

use thiserror::Error;

/// Error returned by a remote IAM service call.
#[derive(Debug, Error)]
pub enum RemoteError {
    // Transient errors (retried with backoff)
    /// The service rejected the call because of rate limiting.
    #[error("request throttled: {message}")]
    Throttled { message: String },

    /// The service is temporarily unavailable.
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Network error while talking to the service.
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Permanent errors
    /// The call did not settle within the per-call timeout.
    #[error("call timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The resource already exists.
    #[error("resource already exists: {identifier}")]
    AlreadyExists { identifier: String },

    /// The resource does not exist.
    #[error("resource not found: {identifier}")]
    NotFound { identifier: String },

    /// The caller lacks permission for the operation.
    #[error("access denied for {operation}")]
    AccessDenied { operation: String },

    /// The service rejected the request payload.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Any other failure.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RemoteError {
    /// Check if this error is transient and the call should be retried.
    ///
    /// Timeouts are not transient: the call may have taken effect remotely,
    /// so the next observed snapshot decides what is left to do.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::Throttled { .. }
                | RemoteError::ServiceUnavailable { .. }
                | RemoteError::Network { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            RemoteError::Throttled { .. } => "THROTTLED",
            RemoteError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            RemoteError::Network { .. } => "NETWORK_ERROR",
            RemoteError::Timeout { .. } => "TIMEOUT",
            RemoteError::AlreadyExists { .. } => "ALREADY_EXISTS",
            RemoteError::NotFound { .. } => "NOT_FOUND",
            RemoteError::AccessDenied { .. } => "ACCESS_DENIED",
            RemoteError::InvalidRequest { .. } => "INVALID_REQUEST",
            RemoteError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Create a throttling error.
    pub fn throttled(message: impl Into<String>) -> Self {
        RemoteError::Throttled {
            message: message.into(),
        }
    }

    /// Create a service unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        RemoteError::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Create a network error without a source.
    pub fn network(message: impl Into<String>) -> Self {
        RemoteError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with a source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RemoteError::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        RemoteError::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        RemoteError::Internal {
            message: message.into(),
        }
    }
}

/// Result type for remote calls.
pub type RemoteResult<T> = Result<T, RemoteError>;
