//! Mock collaborators shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::error::PlatformError;
use crate::frame::FrameId;
use crate::lifecycle::EventKind;
use crate::platform_request::{LifecycleHandler, PlatformRequest, RequestOptions};
use crate::plugin::{PlatformEvent, Plugin};
use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

pub const OK_BODY: &str = r#"{"ErrorCode":1,"ErrorStatus":"Success","Message":"Ok","Response":{"ok":true}}"#;

pub fn reply(status: u16, body: &str) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse { status, body: body.to_string() })
}

// =========================================================================
// MockTransport
// =========================================================================

/// Replays queued replies in order, then `OK_BODY` forever.
///
/// When gated, every call waits for one permit from the gate before
/// answering, so tests control exactly when calls complete.
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    sent: Mutex<Vec<TransportRequest>>,
    gate: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new(replies: Vec<Result<TransportResponse, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
            gate: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn ok() -> Self {
        Self::new(Vec::new())
    }

    /// Transport whose calls block until a permit is added to the gate.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Self { gate: Some(Arc::clone(&gate)), ..Self::ok() };
        (transport, gate)
    }

    pub fn sent(&self) -> Vec<TransportRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_paths(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.sent.lock().unwrap().push(request);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let queued = self.replies.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| reply(200, OK_BODY))
    }
}

// =========================================================================
// RecordingHandler
// =========================================================================

/// `LifecycleHandler` that records event names and optionally fails
/// `before_send`.
#[derive(Default)]
pub struct RecordingHandler {
    pub events: Mutex<Vec<EventKind>>,
    pub fail_before_send: Option<PlatformError>,
    pub extra_header: Option<(&'static str, &'static str)>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LifecycleHandler for RecordingHandler {
    async fn before_send(&self, target: &PlatformRequest) -> Result<RequestOptions, PlatformError> {
        if let Some(err) = &self.fail_before_send {
            return Err(err.clone());
        }
        let options = target.options().clone();
        match self.extra_header {
            Some((name, value)) => options.with_header(name, value),
            None => Ok(options),
        }
    }

    fn on_event(&self, event: EventKind, _target: &PlatformRequest) {
        self.events.lock().unwrap().push(event);
    }
}

// =========================================================================
// RecordingPlugin
// =========================================================================

#[derive(Default)]
pub struct RecordingPlugin {
    seen: Mutex<Vec<(FrameId, EventKind)>>,
}

impl RecordingPlugin {
    pub fn events_for(&self, id: FrameId) -> Vec<EventKind> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(frame_id, _)| *frame_id == id)
            .map(|(_, kind)| *kind)
            .collect()
    }
}

impl Plugin for RecordingPlugin {
    fn update(&self, event: &PlatformEvent<'_>) {
        self.seen
            .lock()
            .unwrap()
            .push((event.target.frame_id(), event.kind));
    }
}
