//! Error types for studio shot generation.

use std::time::Duration;

/// Message shown when a failed generation carries no text of its own.
pub const DEFAULT_FAILURE_MESSAGE: &str = "An unexpected error occurred during generation.";

/// Longest error message kept from an API response body.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while generating or saving a studio shot.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Billing is not enabled for the API key.
    #[error("billing error: {0}")]
    Billing(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized message from the response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay from the `Retry-After` header, if sent.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters or an action not allowed in the current state.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The API answered successfully but without a usable image.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data or a data URL.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (reading the photo, saving the result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generation failed with nothing more than a message.
    #[error("{0}")]
    Generation(String),
}

impl StudioError {
    /// Returns true if this error is likely transient.
    ///
    /// Nothing in this crate retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network(_))
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::Network(_) => Some(Duration::from_secs(2)),
            _ => None,
        }
    }

    /// The text shown to the user when this error ends a generation attempt.
    pub fn failure_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            DEFAULT_FAILURE_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;

/// Cleans an API error body before it is surfaced to the user.
///
/// Redacts anything that looks like a Google API key, collapses whitespace
/// and caps the length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let cleaned = text
        .split_whitespace()
        .map(redact_token)
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return cleaned;
    }
    let mut truncated: String = cleaned.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    truncated.push_str("...");
    truncated
}

fn redact_token(token: &str) -> String {
    if let Some(pos) = token.find("key=") {
        let value_start = pos + "key=".len();
        let value_end = token[value_start..]
            .find(['&', '"', '\'', ',', ')'])
            .map_or(token.len(), |i| value_start + i);
        return format!(
            "{}[REDACTED]{}",
            &token[..value_start],
            &token[value_end..]
        );
    }
    if let Some(pos) = token.find("AIza") {
        return format!("{}[REDACTED]", &token[..pos]);
    }
    token.to_string()
}

/// Reads the `Retry-After` header as whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
