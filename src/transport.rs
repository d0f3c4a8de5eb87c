//! HTTP transport seam.
//!
//! `PlatformRequest` only ever talks to a `Transport`. The production
//! implementation is a thin `reqwest` wrapper; tests swap in a mock.
//!
//! ERROR HANDLING
//! ==============
//! A transport error means no HTTP status was received. Non-2xx statuses are
//! NOT transport errors: they come back as a `TransportResponse` and the
//! lifecycle classifies them.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, Url};

use crate::error::PlatformError;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// One fully bound HTTP exchange, ready to send.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(String),

    #[error("response body read failed: {0}")]
    Body(String),
}

impl From<TransportError> for PlatformError {
    fn from(err: TransportError) -> Self {
        PlatformError::Network { status: None, message: err.to_string() }
    }
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// Performs one HTTP exchange. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and collect the full response body.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no HTTP response was received.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

// =============================================================================
// REQWEST TRANSPORT
// =============================================================================

pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the given connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::HttpClientBuild`] if the client cannot be built.
    pub fn new(connect_timeout: Duration) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| PlatformError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http })
    }

    /// Wrap an existing client (shared connection pool, custom TLS, ...).
    #[must_use]
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Body(e.to_string())
            }
        })?;

        Ok(TransportResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(err.to_string())
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
