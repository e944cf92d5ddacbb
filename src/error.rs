use crate::storage::StorageError;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: StatusCode, message: String, body: Option<Value> },
    #[error("{}", SESSION_EXPIRED_MESSAGE)]
    SessionExpired,
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Builds an application error from a decoded (or undecodable) error response.
    ///
    /// The message prefers the server's `detail`, then `message`, and falls back to a
    /// generic text when neither is a string.
    #[must_use]
    pub fn from_status(status: StatusCode, body: Option<Value>) -> Self {
        let message = body
            .as_ref()
            .and_then(|b| {
                b.get("detail").and_then(Value::as_str).or_else(|| b.get("message").and_then(Value::as_str))
            })
            .unwrap_or(GENERIC_ERROR_MESSAGE)
            .to_string();

        Self::Status { status, message, body }
    }

    /// HTTP status carried by the error, when it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
