//! Frame — one unit of queued, in-flight, or completed request work.
//!
//! DESIGN
//! ======
//! A frame is a pure state holder: identity, lifecycle state, the caller's
//! request, the parsed response, the lifecycle driver, and the settle handle
//! that completes the caller's future. It performs no I/O.
//!
//! Only the frame returned by `Frame::new` owns the settle handle. Clones
//! (a filtered `FrameSet`, for one) are read-only views: they observe whether
//! the frame settled but can never settle it, and holding one does not keep
//! the caller's channel open. Settling is crate-internal and takes effect
//! once; every later attempt is a no-op.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll};

use reqwest::Url;
use tokio::sync::oneshot;

use crate::error::PlatformError;
use crate::platform_request::PlatformRequest;
use crate::types::{Request, Response};

/// Outcome delivered to the caller for one frame.
pub type Outcome = Result<Response, PlatformError>;

// =============================================================================
// IDENTITY
// =============================================================================

/// Frame identifier. Unique and strictly increasing per generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(u64);

impl FrameId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out frame ids. Each `Platform` owns one.
#[derive(Debug)]
pub struct FrameIdGenerator {
    next: AtomicU64,
}

impl FrameIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn next_id(&self) -> FrameId {
        FrameId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for FrameIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Lifecycle position of a frame. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameState {
    None,
    Waiting,
    Active,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame {id}: illegal state transition {from:?} -> {to:?}")]
    IllegalTransition { id: FrameId, from: FrameState, to: FrameState },
}

// =============================================================================
// SETTLE HANDLE
// =============================================================================

type SettleSlot = Mutex<Option<oneshot::Sender<Outcome>>>;

/// Sending half of the caller's future. Taken exactly once, by the owner.
enum Settle {
    Owner(Arc<SettleSlot>),
    View(Weak<SettleSlot>),
}

impl Settle {
    fn new() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (Self::Owner(Arc::new(Mutex::new(Some(tx)))), rx)
    }

    fn view(&self) -> Self {
        match self {
            Self::Owner(slot) => Self::View(Arc::downgrade(slot)),
            Self::View(slot) => Self::View(slot.clone()),
        }
    }

    fn send(&self, outcome: Outcome) -> bool {
        let Self::Owner(slot) = self else {
            return false;
        };
        let sender = slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        let Some(sender) = sender else {
            return false;
        };
        // The receiver may already be gone; the frame still counts as settled.
        let _ = sender.send(outcome);
        true
    }

    /// A view whose owner was dropped counts as settled (`Cancelled`).
    fn is_settled(&self) -> bool {
        let slot = match self {
            Self::Owner(slot) => Arc::clone(slot),
            Self::View(slot) => match slot.upgrade() {
                Some(slot) => slot,
                None => return true,
            },
        };
        slot.lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_none()
    }
}

/// Caller-facing future for one frame.
///
/// Resolves to the parsed response or the error that rejected the frame. If
/// the frame is dropped without settling, resolves to
/// [`PlatformError::Cancelled`].
#[derive(Debug)]
pub struct PendingResponse {
    id: FrameId,
    rx: oneshot::Receiver<Outcome>,
}

impl PendingResponse {
    #[must_use]
    pub fn id(&self) -> FrameId {
        self.id
    }
}

impl Future for PendingResponse {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(PlatformError::Cancelled)))
    }
}

// =============================================================================
// FRAME
// =============================================================================

pub struct Frame {
    id: FrameId,
    state: FrameState,
    request: Request,
    uri: Option<Url>,
    response: Option<Response>,
    platform_request: Option<PlatformRequest>,
    settle: Settle,
}

impl Frame {
    /// Create a frame in state `None` along with the future it will settle.
    pub fn new(id: FrameId, request: Request) -> (Self, PendingResponse) {
        let (settle, rx) = Settle::new();
        let frame = Self {
            id,
            state: FrameState::None,
            request,
            uri: None,
            response: None,
            platform_request: None,
            settle,
        };
        (frame, PendingResponse { id, rx })
    }

    #[must_use]
    pub fn with_platform_request(mut self, platform_request: PlatformRequest) -> Self {
        self.uri = Some(platform_request.url().clone());
        self.platform_request = Some(platform_request);
        self
    }

    #[must_use]
    pub fn id(&self) -> FrameId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> FrameState {
        self.state
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Fully resolved URI, once a lifecycle driver is bound.
    #[must_use]
    pub fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Store the parsed response. Set once, after a successful parse.
    pub fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// Lifecycle driver, if it has not been taken for execution yet.
    #[must_use]
    pub fn platform_request(&self) -> Option<&PlatformRequest> {
        self.platform_request.as_ref()
    }

    /// Take the lifecycle driver. Returns `None` on every call after the first.
    pub fn take_platform_request(&mut self) -> Option<PlatformRequest> {
        self.platform_request.take()
    }

    /// Move the frame to `next`. Re-entering the current state is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::IllegalTransition`] if `next` is behind the
    /// current state.
    pub fn advance(&mut self, next: FrameState) -> Result<(), FrameError> {
        if next < self.state {
            return Err(FrameError::IllegalTransition { id: self.id, from: self.state, to: next });
        }
        self.state = next;
        Ok(())
    }

    /// Resolve the caller's future. Returns `false` if already settled or if
    /// this frame is a view.
    pub(crate) fn resolve(&self, response: Response) -> bool {
        self.settle.send(Ok(response))
    }

    /// Reject the caller's future. Returns `false` if already settled or if
    /// this frame is a view.
    pub(crate) fn reject(&self, error: PlatformError) -> bool {
        self.settle.send(Err(error))
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settle.is_settled()
    }
}

/// Clones are read-only views; see the module docs.
impl Clone for Frame {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            state: self.state,
            request: self.request.clone(),
            uri: self.uri.clone(),
            response: self.response.clone(),
            platform_request: self.platform_request.clone(),
            settle: self.settle.view(),
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("request", &self.request)
            .field("uri", &self.uri.as_ref().map(Url::as_str))
            .field("response", &self.response)
            .field("settled", &self.is_settled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
