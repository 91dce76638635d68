//! Normalized API error.
//!
//! Every failure coming out of [`ApiClient`](super::ApiClient) is turned into
//! a single [`ApiError`] shape here, so callers match on [`ErrorKind`]
//! instead of digging through transport errors and response bodies.

use reqwest::StatusCode;
use thiserror::Error;

/// Longest body excerpt kept in [`ApiError::detail`].
const DETAIL_LIMIT: usize = 500;

/// Broad classification of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection refused, DNS failure, reset, etc.
    Network,
    /// The request exceeded the configured timeout.
    Timeout,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 400 or 422
    BadRequest,
    /// 409
    Conflict,
    /// Any 5xx status.
    Server,
    /// The body could not be parsed into the expected type.
    Decode,
    /// Any other non-success status.
    Http,
}

impl ErrorKind {
    /// Classify an HTTP status code.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 | 422 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            500..=599 => Self::Server,
            _ => Self::Http,
        }
    }

    /// Failures that never reached a server response.
    #[must_use]
    pub const fn is_transport(self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }
}

/// An error returned by the SheShape backend or the transport beneath it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// The most specific human readable message available.
    pub message: String,
    /// Whether `message` was supplied by the backend rather than derived
    /// from the status or the transport failure.
    pub from_server: bool,
    /// Raw body excerpt or transport error text, for logs.
    pub detail: Option<String>,
}

impl ApiError {
    /// Build an error from a non-success response.
    ///
    /// The message comes from the body when the backend supplied one,
    /// otherwise from the status line.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let extracted = extract_message(body);
        let from_server = extracted.is_some();
        let message = extracted
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
        Self {
            kind: ErrorKind::from_status(status),
            status: Some(status.as_u16()),
            message,
            from_server,
            detail: excerpt(body),
        }
    }

    /// Build an error for a body that could not be decoded.
    #[must_use]
    pub fn decode(status: StatusCode, err: &serde_json::Error, body: &str) -> Self {
        Self {
            kind: ErrorKind::Decode,
            status: Some(status.as_u16()),
            message: format!("Unexpected response from server: {err}"),
            from_server: false,
            detail: excerpt(body),
        }
    }

    /// Build an error that was raised before a request could be sent.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Http,
            status: None,
            message: message.into(),
            from_server: false,
            detail: None,
        }
    }

    /// The backend's own message, if it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        self.from_server.then_some(self.message.as_str())
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// 401 or 403.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self.kind, ErrorKind::Unauthorized | ErrorKind::Forbidden)
    }

    #[must_use]
    pub fn is_server(&self) -> bool {
        self.kind == ErrorKind::Server
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if let Some(status) = err.status() {
            ErrorKind::from_status(status)
        } else if err.is_decode() {
            ErrorKind::Decode
        } else {
            ErrorKind::Network
        };
        let message = match kind {
            ErrorKind::Timeout => "Request timed out".to_string(),
            ErrorKind::Network => "Network error: unable to reach the server".to_string(),
            _ => err.to_string(),
        };
        Self {
            kind,
            status: err.status().map(|s| s.as_u16()),
            message,
            from_server: false,
            detail: Some(err.to_string()),
        }
    }
}

/// Pull a human readable message out of an error body.
///
/// Tries `{"message": ..}`, then `{"error": ..}`, then a bare JSON string,
/// then the body as plain text. Returns `None` for empty bodies and for JSON
/// documents that carry neither field.
#[must_use]
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => ["message", "error"].iter().find_map(|key| {
            map.get(*key)
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        }),
        Ok(serde_json::Value::String(s)) => Some(s).filter(|s| !s.trim().is_empty()),
        Ok(_) => None,
        // HTML error pages are not worth showing to a user
        Err(_) if trimmed.starts_with('<') => None,
        Err(_) => Some(trimmed.chars().take(200).collect()),
    }
}

fn excerpt(body: &str) -> Option<String> {
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.chars().take(DETAIL_LIMIT).collect())
}
