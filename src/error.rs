//! Errors surfaced by the request pipeline.
//!
//! DESIGN
//! ======
//! Every failure a caller can observe is a `PlatformError`. Variants carry
//! owned strings rather than source errors so the same value can be handed to
//! plugins (through the event target) and to the caller's future.
//!
//! Application-level failures are NOT errors here: a well-formed envelope
//! whose `ErrorCode` is not success resolves the caller's future and must be
//! inspected through `Response::is_error`.

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// PLATFORM ERROR
// =============================================================================

/// Errors produced by the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The transport failed or the server answered with a non-2xx status.
    #[error("network error: {message}")]
    Network { status: Option<u16>, message: String },

    /// The response body was not a valid JSON envelope.
    #[error("corrupt response: {0}")]
    CorruptResponse(String),

    /// The session holds no usable CSRF token.
    #[error("CSRF token missing")]
    CsrfTokenMissing,

    /// User context is enabled but no cookie provider was configured.
    #[error("cookie provider missing")]
    CookieProviderMissing,

    /// A required cookie is not present in the provider.
    #[error("cookie not found: {name}")]
    CookieNotFound { name: String },

    /// The resolved request URI could not be parsed.
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// A header name or value could not be encoded.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The request body could not be serialized.
    #[error("request body serialization failed: {0}")]
    Serialize(String),

    /// The bounded queue is full; the request was not accepted.
    #[error("request queue full (max {max})")]
    QueueFull { max: usize },

    /// The frame was dropped before it settled (see `Platform::cancel_all`).
    #[error("request cancelled")]
    Cancelled,

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for PlatformError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network_error",
            Self::CorruptResponse(_) => "corrupt_response",
            Self::CsrfTokenMissing => "csrf_token_missing",
            Self::CookieProviderMissing => "cookie_provider_missing",
            Self::CookieNotFound { .. } => "cookie_not_found",
            Self::InvalidUri(_) => "invalid_uri",
            Self::InvalidHeader(_) => "invalid_header",
            Self::Serialize(_) => "serialize_error",
            Self::QueueFull { .. } => "queue_full",
            Self::Cancelled => "cancelled",
            Self::Config(_) => "config_error",
            Self::HttpClientBuild(_) => "http_client_build",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { status: None | Some(429 | 500..=599), .. } | Self::QueueFull { .. }
        )
    }
}

impl PlatformError {
    /// Build a network error from an HTTP status and the body the server sent.
    #[must_use]
    pub fn http_status(status: u16, body: &str) -> Self {
        let snippet: String = body.chars().take(200).collect();
        Self::Network {
            status: Some(status),
            message: if snippet.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {snippet}")
            },
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
