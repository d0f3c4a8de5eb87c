//! Request and response value types.
//!
//! `Request` is what a caller hands to `Platform::service_request`; `Response`
//! is the parsed JSON envelope every endpoint of the remote API returns.
//! Both are immutable once constructed.

use std::collections::HashMap;

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::PlatformError;

/// `ErrorCode` value the remote API uses for success.
pub const SUCCESS_CODE: i32 = 1;

// =============================================================================
// REQUEST
// =============================================================================

/// Endpoint descriptor: relative URI, HTTP method, optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub uri: String,
    pub method: Method,
    pub data: Option<Value>,
}

impl Request {
    /// Create a request for `uri` with the default method (`GET`) and no body.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into(), method: Method::GET, data: None }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(uri)
    }

    pub fn post(uri: impl Into<String>, data: Value) -> Self {
        Self { uri: uri.into(), method: Method::POST, data: Some(data) }
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize the body for the wire. `None` when the request has no body.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Serialize`] if the body cannot be encoded.
    pub fn body(&self) -> Result<Option<String>, PlatformError> {
        self.data
            .as_ref()
            .map(|data| serde_json::to_string(data).map_err(|e| PlatformError::Serialize(e.to_string())))
            .transpose()
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new("/")
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// The JSON envelope wrapping every platform response.
///
/// Only `ErrorCode` is required. Every other field reads a missing key and an
/// explicit `null` the same way: as its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Response {
    pub error_code: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "message_data")]
    pub message_data: HashMap<String, String>,
    #[serde(default)]
    pub response: Value,
    /// Seconds the server asks clients to back off. May be fractional.
    #[serde(default, deserialize_with = "null_as_default")]
    pub throttle_seconds: f64,
}

impl Response {
    /// Parse a response body into the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::CorruptResponse`] if the body is not JSON or
    /// does not carry an `ErrorCode`.
    pub fn parse(body: &str) -> Result<Self, PlatformError> {
        serde_json::from_str(body).map_err(|e| PlatformError::CorruptResponse(e.to_string()))
    }

    /// `true` when the envelope reports an application-level failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error_code != SUCCESS_CODE
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `MessageData` may be `null`, and so may any of its values.
fn message_data<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
