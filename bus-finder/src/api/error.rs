//! Bus API error types.

use crate::error::NetworkError;

use super::convert::ConversionError;

/// Errors from the bus backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure (connection refused, DNS, reset, ...)
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Backend answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Response parsed but contained unusable values
    #[error("invalid response: {0}")]
    Invalid(#[from] ConversionError),

    /// Client could not be set up
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Http(err)
        }
    }
}

impl ApiError {
    /// HTTP status of the backend's answer, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// User-facing form of this error.
    ///
    /// Backend-supplied messages are shown as-is; everything else falls
    /// back to the operation's generic message.
    pub fn to_network_error(&self, fallback: &str) -> NetworkError {
        match self {
            ApiError::Api { status, message } if !message.trim().is_empty() => {
                NetworkError::new(message.clone(), Some(*status))
            }
            ApiError::Api { status, .. } => NetworkError::new(fallback, Some(*status)),
            _ => NetworkError::new(fallback, None),
        }
    }
}
