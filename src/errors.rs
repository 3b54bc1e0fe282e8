use axum::http::StatusCode;
use serde_json::{json, Value};
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// A mandatory credential or setting is missing.
    Configuration(String),
    /// Missing or invalid input; the caller must correct it.
    BadRequest(String),
    /// The action requires a different HTTP method.
    MethodNotAllowed,
    /// The action name is not recognized.
    UnknownAction(String),
    /// Request body longer than the given number of bytes.
    PayloadTooLarge(usize),
    /// Non-2xx response from the ledger provider (or from the gateway, when
    /// seen by the wallet client). Status and body are kept verbatim.
    Upstream {
        /// Status code returned by the remote side.
        status: StatusCode,
        /// Parsed JSON body, or `{"raw": <text>}` when it was not JSON.
        body: Value,
    },
    /// Network failure or an unreadable response.
    Transport(String),
    /// Local key-value store could not be read or written.
    Storage(String),
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::UnknownAction(action) => write!(f, "Unknown action: {}", action),
            AppError::PayloadTooLarge(limit) => {
                write!(f, "Request body exceeds {} bytes", limit)
            }
            AppError::Upstream { status, body } => {
                write!(f, "Upstream returned {}: {}", status, body)
            }
            AppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status the error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UnknownAction(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upstream { status, .. } => *status,
            AppError::Configuration(_) | AppError::Transport(_) | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// JSON body the error maps to. Upstream bodies pass through untouched.
    pub fn body(&self) -> Value {
        match self {
            AppError::Upstream { body, .. } => body.clone(),
            AppError::Configuration(msg)
            | AppError::BadRequest(msg)
            | AppError::Transport(msg)
            | AppError::Storage(msg) => json!({ "error": msg }),
            AppError::MethodNotAllowed => json!({ "error": "Method not allowed" }),
            AppError::UnknownAction(_) | AppError::PayloadTooLarge(_) => {
                json!({ "error": self.to_string() })
            }
        }
    }

    /// Short text suitable for a transient notification.
    ///
    /// Prefers the body's `error` field, then `message`, then the raw text.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Upstream { body, .. } => body
                .get("error")
                .or_else(|| body.get("message"))
                .or_else(|| body.get("raw"))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| "Request failed".to_string()),
            AppError::BadRequest(msg)
            | AppError::Configuration(msg)
            | AppError::Transport(msg)
            | AppError::Storage(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Transport(format!("JSON error: {}", err))
    }
}
