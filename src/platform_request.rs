//! PlatformRequest — drives one frame's network call through its lifecycle.
//!
//! ARCHITECTURE
//! ============
//! `execute` consumes the request, so a call is driven at most once. Each
//! event first advances the `RequestPhase` machine and only then reaches the
//! `LifecycleHandler`; an event the machine refuses is logged and dropped.
//!
//! The handler (the `Platform` in production) owns all bookkeeping: frame
//! state, settling the caller, plugin fan-out. This type only reports.
//!
//! ERROR HANDLING
//! ==============
//! - no HTTP response, or non-2xx status → `Network` (httpFail path)
//! - 2xx with an unparseable body → `CorruptResponse`
//! - options transform failure → the transform's error, before any I/O
//! - valid envelope with a non-success `ErrorCode` → success path; the caller
//!   inspects `Response::is_error`

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error};

use crate::error::PlatformError;
use crate::frame::FrameId;
use crate::lifecycle::{EventKind, RequestPhase};
use crate::transport::{Transport, TransportRequest};
use crate::types::{Request, Response};

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const CSRF_HEADER: &str = "X-CSRF";

// =============================================================================
// OPTIONS
// =============================================================================

/// Outgoing options that plugins may reshape during `beforeSend`.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Options carrying the API key and JSON content type.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InvalidHeader`] if the key is not a valid
    /// header value.
    pub fn for_api_key(api_key: &str, timeout: Option<Duration>) -> Result<Self, PlatformError> {
        Self { headers: HeaderMap::new(), timeout }
            .with_header(API_KEY_HEADER, api_key)?
            .with_header(CONTENT_TYPE.as_str(), "application/json")
    }

    /// Return these options with `name` set to `value`, replacing any
    /// previous value.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InvalidHeader`] if either part is invalid.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, PlatformError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| PlatformError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value).map_err(|e| PlatformError::InvalidHeader(format!("{name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

// =============================================================================
// HANDLER
// =============================================================================

/// Receiver of one request's lifecycle.
#[async_trait::async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// Produce the final options. Runs after the `beforeSend` event.
    ///
    /// # Errors
    ///
    /// An error here fails the request with `error, done`; no I/O happens.
    async fn before_send(&self, target: &PlatformRequest) -> Result<RequestOptions, PlatformError>;

    /// Observe one event. `target` reflects the state after the transition.
    fn on_event(&self, event: EventKind, target: &PlatformRequest);
}

// =============================================================================
// PLATFORM REQUEST
// =============================================================================

#[derive(Debug, Clone)]
pub struct PlatformRequest {
    frame_id: FrameId,
    request: Request,
    url: Url,
    options: RequestOptions,
    phase: RequestPhase,
    status: Option<u16>,
    response: Option<Response>,
    error: Option<PlatformError>,
}

impl PlatformRequest {
    /// Bind `request` to its resolved URL and base options.
    #[must_use]
    pub fn new(frame_id: FrameId, request: Request, url: Url, options: RequestOptions) -> Self {
        Self {
            frame_id,
            request,
            url,
            options,
            phase: RequestPhase::Idle,
            status: None,
            response: None,
            error: None,
        }
    }

    #[must_use]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    #[must_use]
    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    /// HTTP status, once the transport has answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Parsed envelope, from `responseParsed` on.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Failure reported with the `error` event.
    #[must_use]
    pub fn error(&self) -> Option<&PlatformError> {
        self.error.as_ref()
    }

    /// Run the call to completion, reporting every event to `handler`.
    /// Returns the request in its finished phase.
    pub async fn execute<T, H>(mut self, transport: &T, handler: &H) -> Self
    where
        T: Transport + ?Sized,
        H: LifecycleHandler + ?Sized,
    {
        self.emit(EventKind::BeforeSend, handler);

        let outgoing = match handler.before_send(&self).await {
            Ok(options) => {
                self.options = options;
                self.transport_request()
            }
            Err(err) => Err(err),
        };
        let outgoing = match outgoing {
            Ok(outgoing) => outgoing,
            Err(err) => {
                self.error = Some(err);
                self.emit(EventKind::Error, handler);
                self.emit(EventKind::Done, handler);
                return self;
            }
        };

        let body = match transport.send(outgoing).await {
            Ok(resp) if resp.is_success() => {
                self.status = Some(resp.status);
                Ok(resp.body)
            }
            Ok(resp) => {
                self.status = Some(resp.status);
                Err(PlatformError::http_status(resp.status, &resp.body))
            }
            Err(err) => Err(err.into()),
        };

        match body {
            Err(err) => {
                self.error = Some(err);
                self.emit(EventKind::HttpFail, handler);
                self.emit(EventKind::HttpDone, handler);
                self.emit(EventKind::Error, handler);
            }
            Ok(body) => {
                self.emit(EventKind::HttpSuccess, handler);
                self.emit(EventKind::HttpDone, handler);
                match Response::parse(&body) {
                    Ok(response) => {
                        self.response = Some(response);
                        self.emit(EventKind::ResponseParsed, handler);
                        self.emit(EventKind::Success, handler);
                    }
                    Err(err) => {
                        self.error = Some(err);
                        self.emit(EventKind::Error, handler);
                    }
                }
            }
        }
        self.emit(EventKind::Done, handler);
        self
    }

    fn transport_request(&self) -> Result<TransportRequest, PlatformError> {
        Ok(TransportRequest {
            url: self.url.clone(),
            method: self.request.method.clone(),
            headers: self.options.headers.clone(),
            body: self.request.body()?,
            timeout: self.options.timeout,
        })
    }

    fn emit<H: LifecycleHandler + ?Sized>(&mut self, event: EventKind, handler: &H) {
        match self.phase.next(event) {
            Ok(phase) => {
                self.phase = phase;
                debug!(frame_id = %self.frame_id, %event, status = ?self.status, "lifecycle event");
                handler.on_event(event, self);
            }
            Err(e) => {
                error!(frame_id = %self.frame_id, error = %e, "lifecycle event out of order; dropped");
            }
        }
    }
}

#[cfg(test)]
#[path = "platform_request_test.rs"]
mod tests;
