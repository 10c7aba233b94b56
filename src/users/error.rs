//! User management error types
//!
//! Errors raised by the admin API and by local validation of form input.

use thiserror::Error;

/// Failure of a single admin API call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never reached the server or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The server answered with a success status but an unreadable body
    #[error("Parse error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    pub fn is_server(&self) -> bool {
        matches!(self, ApiError::Server { .. })
    }

    /// Short text for banners and toasts
    pub fn summary(&self) -> String {
        match self {
            ApiError::Network(_) => "Server not reachable".to_string(),
            ApiError::Server { status, message } if message.trim().is_empty() => {
                format!("Server rejected the request ({})", status)
            }
            ApiError::Server { status, message } => {
                format!("Server rejected the request ({}): {}", status, message.trim())
            }
            ApiError::Decode(_) => "Unexpected response from server".to_string(),
        }
    }
}

/// Result type alias for admin API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// A table cell edit that cannot be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {0} is read-only")]
    ReadOnly(String),

    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

/// Form input rejected before any request is sent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("User name must not be empty")]
    EmptyUserName,

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid date: {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Invalid start time: {hour:02}:{minute:02}")]
    InvalidStartTime { hour: u32, minute: u32 },

    #[error("{0} must be greater than zero")]
    ZeroCount(&'static str),

    #[error("{num_slots} slots of {slot_duration_min} min do not fit into the day")]
    SlotsExceedDay { num_slots: u32, slot_duration_min: u32 },
}
