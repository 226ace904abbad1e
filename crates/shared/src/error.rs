//! Error envelope and client-side error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback text used when an error response carries no readable message.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Structured error carried by a failed [`ApiResponse`](crate::ApiResponse).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorField>,
    #[serde(default)]
    message: Option<String>,
}

/// Servers are not consistent about the shape of `error`: most send the
/// structured triple, some send a bare string.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Structured {
        #[serde(default)]
        message: String,
    },
    Text(String),
}

/// Pull a user-facing message out of an error response body.
///
/// Prefers `error.message`, falls back to the top-level `message`.
pub fn try_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok()?;
    let nested = parsed.error.map(|e| match e {
        ErrorField::Structured { message } => message,
        ErrorField::Text(text) => text,
    });
    nested
        .into_iter()
        .chain(parsed.message)
        .find(|m| !m.trim().is_empty())
}

/// API error type for client-side use
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },
    #[error("Response carried no data")]
    MissingData,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Build an HTTP error from a raw status and body, extracting the message
    /// from the structured error envelope when there is one.
    pub fn from_response(status: u16, body: String) -> Self {
        let message = try_error_message(&body).unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
        ApiError::Http {
            status,
            message,
            body,
        }
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message suitable for surfacing to a user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { message, .. } | ApiError::Api { message, .. } => message.clone(),
            ApiError::Timeout => "The request timed out".to_string(),
            ApiError::Network(_) => "Network error, please check your connection".to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialize(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_nested_error_message() {
        let body = r#"{"success":false,"error":{"code":"E_SLOT","message":"Slot taken"},"message":"Bad"}"#;
        assert_eq!(try_error_message(body).as_deref(), Some("Slot taken"));
    }

    #[test]
    fn falls_back_to_top_level_message() {
        let body = r#"{"success":false,"message":"Validation failed"}"#;
        assert_eq!(try_error_message(body).as_deref(), Some("Validation failed"));
    }

    #[test]
    fn accepts_string_error_field() {
        let body = r#"{"error":"Forbidden"}"#;
        assert_eq!(try_error_message(body).as_deref(), Some("Forbidden"));
    }

    #[test]
    fn non_json_body_uses_generic_message() {
        let err = ApiError::from_response(502, "<html>bad gateway</html>".to_string());
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }
}
