//! Error Handling
//!
//! One error enum covers the whole pipeline: request construction,
//! transport, response decoding, and cache refreshes. Helpers expose the
//! coarse category, the HTTP status where one exists, and whether the retry
//! layer may re-attempt the operation.
//!
//! # Example
//!
//! ```rust
//! use anygen::error::{ErrorCategory, GenError};
//!
//! let error = GenError::provider_error("openai", 503, "overloaded", None);
//! assert_eq!(error.category(), ErrorCategory::Server);
//! assert!(error.is_retryable());
//! ```

use std::time::Duration;

/// Errors surfaced by the generation pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenError {
    /// Required input is missing or malformed; raised before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A parameter value is outside its accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Profile or client configuration is unusable
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Connection-level failure before or during the exchange
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request exceeded its time budget
    #[error("Request timed out: {0}")]
    TimeoutError(String),

    /// The provider rejected the credential (401/403)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// The provider throttled the request (429)
    #[error("Rate limited: {message}")]
    RateLimitError {
        message: String,
        /// Parsed `Retry-After` hint, when the provider sent one
        retry_after: Option<Duration>,
    },

    /// The requested resource does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider rejected the request shape (other 4xx)
    #[error("Invalid request ({status}): {message}")]
    InvalidRequest { status: u16, message: String },

    /// Provider-side failure (5xx) or an unclassifiable status
    #[error("Provider error from {provider} ({status}): {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
        /// Raw body excerpt for diagnostics
        body: Option<String>,
    },

    /// The response body could not be interpreted; not retried
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The target or profile cannot perform the requested operation
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A cooperative cancellation signal ended the operation
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

/// Coarse error classification for callers that branch on failure class
/// rather than individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Network,
    Authentication,
    RateLimit,
    Client,
    Server,
    Parsing,
    Unsupported,
    Cancelled,
}

impl GenError {
    /// Convenience constructor for provider-side failures.
    pub fn provider_error(
        provider: impl Into<String>,
        status: u16,
        message: impl Into<String>,
        body: Option<String>,
    ) -> Self {
        Self::ProviderError {
            provider: provider.into(),
            status,
            message: message.into(),
            body,
        }
    }

    /// Coarse category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput(_) | Self::InvalidParameter(_) => ErrorCategory::Validation,
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::ConnectionError(_) | Self::TimeoutError(_) => ErrorCategory::Network,
            Self::AuthenticationError(_) => ErrorCategory::Authentication,
            Self::RateLimitError { .. } => ErrorCategory::RateLimit,
            Self::NotFound(_) | Self::InvalidRequest { .. } => ErrorCategory::Client,
            Self::ProviderError { status, .. } => {
                if *status >= 500 {
                    ErrorCategory::Server
                } else {
                    ErrorCategory::Client
                }
            }
            Self::ParseError(_) => ErrorCategory::Parsing,
            Self::UnsupportedOperation(_) => ErrorCategory::Unsupported,
            Self::Cancelled(_) => ErrorCategory::Cancelled,
        }
    }

    /// Whether the retry layer may re-attempt the failed operation.
    ///
    /// Connection and timeout failures and 5xx provider errors qualify.
    /// No 4xx-derived kind does, rate limits included; those carry a
    /// `Retry-After` hint for the caller instead of being retried here.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::TimeoutError(_) => true,
            Self::ProviderError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status associated with this error, when one exists.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::AuthenticationError(_) => Some(401),
            Self::RateLimitError { .. } => Some(429),
            Self::NotFound(_) => Some(404),
            Self::InvalidRequest { status, .. } | Self::ProviderError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GenError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(err.to_string())
        } else {
            Self::ConnectionError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GenError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}
