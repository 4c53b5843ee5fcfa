//! Error types surfaced to the session.
//!
//! Unlike `api::ApiError`, these are cloneable values that views hold on
//! to and render inline next to a retry action.

use std::fmt;

/// A failed backend request, in user-facing form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NetworkError {
    pub message: String,
    /// HTTP status, when the backend answered at all.
    pub status: Option<u16>,
}

impl NetworkError {
    pub fn new(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }
}

/// Failure codes reported by a location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    /// The device has no positioning capability at all.
    Unsupported,
}

impl PositionErrorCode {
    /// Whether a failed high-accuracy attempt may be escalated to the
    /// relaxed tier.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PositionErrorCode::Timeout | PositionErrorCode::PositionUnavailable
        )
    }
}

impl fmt::Display for PositionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionErrorCode::PermissionDenied => "permission denied",
            PositionErrorCode::PositionUnavailable => "position unavailable",
            PositionErrorCode::Timeout => "timeout",
            PositionErrorCode::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

/// A terminal geolocation failure with its remediation text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GeolocationError {
    pub code: PositionErrorCode,
    pub message: String,
}

/// Input rejected before any request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Address query shorter than the minimum length
    #[error("query must be at least {min} characters")]
    QueryTooShort { min: usize },
}
