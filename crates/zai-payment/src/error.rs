//! Error types for Zai client operations.
//!
//! Every failure the library can produce is classified into one of a small
//! number of kinds so callers can tell "fix your setup" apart from "retry
//! later" without string matching:
//!
//! - [`ConfigError`] - missing or invalid setup, raised before any network call
//! - [`AuthError`] - the token endpoint rejected the request or answered garbage
//! - [`NetworkError`] - timeouts and connection failures
//! - [`ApiError`] - non-success HTTP statuses from resource endpoints
//! - [`ValidationError`] - client-side input validation
//! - [`SignatureError`] - malformed webhook signature headers or missing keys

use std::time::Duration;

use reqwest::header::HeaderMap;
use thiserror::Error;

/// Crate-level error aggregating every error kind.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Token acquisition failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Non-success HTTP response from the API.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Client-side input validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Webhook signature header or key problem.
    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),
}

impl Error {
    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// The library never retries on its own; this is a hint for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Configuration(_) => false,
            Self::Auth(e) => e.is_transient(),
            Self::Network(_) => true,
            Self::Api(e) => e.is_transient(),
            Self::Validation(_) => false,
            Self::Signature(_) => false,
        }
    }
}

/// Configuration errors.
///
/// Messages name the offending field but never include its value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is missing or empty.
    #[error("Required setting missing: {field}")]
    MissingField { field: String },

    /// A setting has an unusable value.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Configuration sources could not be loaded or deserialized.
    #[error("Failed to load configuration: {message}")]
    Load { message: String },

    /// The process-wide facade was used before a configuration was installed.
    #[error("Zai client has not been configured")]
    NotConfigured,
}

/// Transport failures, normalized away from the HTTP client's own error type.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connect, read or overall request timeout elapsed.
    #[error("Request timed out: {message}")]
    Timeout { message: String },

    /// The connection could not be established.
    #[error("Connection failed: {message}")]
    Connection { message: String },

    /// Any other transport failure (TLS, broken body stream, redirects).
    #[error("Transport failure: {message}")]
    Transport { message: String },
}

impl NetworkError {
    /// Convert a `reqwest` failure into the library's own network error kind.
    ///
    /// This is the only place `reqwest::Error` is inspected.
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        // Strip the URL so query strings never end up in error messages.
        let error = error.without_url();
        let message = error.to_string();

        if error.is_timeout() {
            Self::Timeout { message }
        } else if error.is_connect() {
            Self::Connection { message }
        } else {
            Self::Transport { message }
        }
    }
}

/// Token acquisition errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint answered with a non-success status (e.g. bad credentials).
    #[error("Token request rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The token endpoint answered successfully but the body was unusable.
    #[error("Invalid token response: {message}")]
    InvalidResponse { message: String },

    /// The token endpoint could not be reached.
    #[error("Token request failed: {0}")]
    Network(#[from] NetworkError),

    /// Credentials are missing or invalid locally.
    #[error("Token provider misconfigured: {0}")]
    Configuration(#[from] ConfigError),
}

impl AuthError {
    /// Check if this error represents a transient condition.
    ///
    /// Rejections are transient only when the auth server itself failed (5xx)
    /// or throttled the request (429).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidResponse { .. } => false,
            Self::Network(_) => true,
            Self::Configuration(_) => false,
        }
    }
}

/// Errors returned by resource endpoints, keyed by HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 Bad Request.
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// 401 Unauthorized.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// 403 Forbidden.
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// 404 Not Found.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// 422 Unprocessable Entity.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// 429 Too Many Requests.
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Any 5xx status.
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status.
    #[error("HTTP error: {status} - {message}")]
    Unexpected {
        status: u16,
        message: String,
        body: String,
    },

    /// A success response did not match the expected shape.
    #[error("Failed to decode response: {message}")]
    Decode { message: String },
}

impl ApiError {
    /// Map a non-success response onto an error kind.
    ///
    /// The message comes from the body's `error`, `message` or `errors` field
    /// when present and falls back to `HTTP <status>`.
    pub fn from_status(status: u16, headers: &HeaderMap, body: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| format!("HTTP {}", status));

        match status {
            400 => Self::BadRequest { message },
            401 => Self::Unauthorized { message },
            403 => Self::Forbidden { message },
            404 => Self::NotFound { message },
            422 => Self::Validation { message },
            429 => Self::RateLimited {
                message,
                retry_after: parse_retry_after(headers),
            },
            500..=599 => Self::Server { status, message },
            _ => Self::Unexpected {
                status,
                message,
                body: body.to_string(),
            },
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { .. } => Some(400),
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Validation { .. } => Some(422),
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } | Self::Unexpected { status, .. } => Some(*status),
            Self::Decode { .. } => None,
        }
    }

    /// Check if this error represents a transient condition.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Server { .. })
    }
}

/// Input validation errors raised before a request is sent.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing.
    #[error("Required field missing: {field}")]
    Required { field: String },

    /// A field has an invalid format.
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    /// A field value is out of the acceptable range.
    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

/// Webhook signature errors.
///
/// These describe inputs that could not be checked at all. A well-formed
/// header carrying the wrong signature is not an error; see
/// [`crate::webhook::SignatureVerdict`].
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The header has no `t=` component.
    #[error("Signature header is missing the timestamp")]
    MissingTimestamp,

    /// The header has no `v=` component.
    #[error("Signature header is missing a signature")]
    MissingSignature,

    /// The `t=` component is not an integer number of seconds.
    #[error("Signature header timestamp is not a valid unix time")]
    InvalidTimestamp,

    /// The header could not be split into key/value components.
    #[error("Malformed signature header: {message}")]
    Malformed { message: String },

    /// No secret key is registered to verify against.
    #[error("No webhook secret key registered")]
    NoSecretKey,

    /// A secret key could not be used as an HMAC key.
    #[error("Invalid secret key: {message}")]
    InvalidKey { message: String },
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    for key in ["error", "message", "errors"] {
        match value.get(key) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(serde_json::Value::Null) | None => continue,
            Some(other) => {
                let flattened = flatten_errors(other);
                if !flattened.is_empty() {
                    return Some(flattened);
                }
            }
        }
    }

    None
}

// Error bodies nest field errors, e.g. {"errors": {"email": ["is invalid"]}}.
fn flatten_errors(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(flatten_errors)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(field, v)| format!("{} {}", field, flatten_errors(v)))
            .collect::<Vec<_>>()
            .join("; "),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
