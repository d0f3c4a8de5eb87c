//! Lifecycle events and the phase machine that orders them.
//!
//! Every call walks one of four paths:
//!
//! ```text
//! beforeSend → httpFail    → httpDone → error                   → done
//! beforeSend → httpSuccess → httpDone → error                   → done
//! beforeSend → httpSuccess → httpDone → responseParsed → success → done
//! beforeSend → error                                            → done
//! ```
//!
//! The last path is taken when an options transform fails (missing
//! credentials) before any transport call. `RequestPhase::next` is the only
//! way to move between phases, so an out-of-order event is an error value,
//! never an observed event.

use serde::Serialize;

// =============================================================================
// EVENTS
// =============================================================================

/// Lifecycle event names, as observed by plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    BeforeSend,
    HttpSuccess,
    HttpFail,
    HttpDone,
    ResponseParsed,
    Success,
    Error,
    Done,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeSend => "beforeSend",
            Self::HttpSuccess => "httpSuccess",
            Self::HttpFail => "httpFail",
            Self::HttpDone => "httpDone",
            Self::ResponseParsed => "responseParsed",
            Self::Success => "success",
            Self::Error => "error",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PHASES
// =============================================================================

/// Where a `PlatformRequest` is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestPhase {
    /// Bound, not yet executed.
    Idle,
    /// `beforeSend` emitted; options are being transformed or the call is in flight.
    Sending,
    /// Transport failed or returned a non-2xx status.
    HttpFailed,
    /// Transport returned a 2xx status.
    HttpSucceeded,
    /// Transport phase over. `ok` records which branch led here.
    HttpFinished { ok: bool },
    /// Body parsed into a `Response`.
    Parsed,
    /// Terminal failure reported.
    Failed,
    /// Terminal success reported.
    Succeeded,
    /// `done` emitted. No further events.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event {event} is not valid in phase {phase:?}")]
pub struct LifecycleError {
    pub phase: RequestPhase,
    pub event: EventKind,
}

impl RequestPhase {
    /// Phase reached by emitting `event` from `self`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when `event` is out of order.
    pub fn next(self, event: EventKind) -> Result<Self, LifecycleError> {
        use EventKind as E;
        use RequestPhase as P;

        let next = match (self, event) {
            (P::Idle, E::BeforeSend) => P::Sending,
            (P::Sending, E::HttpSuccess) => P::HttpSucceeded,
            (P::Sending, E::HttpFail) => P::HttpFailed,
            (P::HttpSucceeded, E::HttpDone) => P::HttpFinished { ok: true },
            (P::HttpFailed, E::HttpDone) => P::HttpFinished { ok: false },
            (P::HttpFinished { ok: true }, E::ResponseParsed) => P::Parsed,
            (P::Sending | P::HttpFinished { .. }, E::Error) => P::Failed,
            (P::Parsed, E::Success) => P::Succeeded,
            (P::Failed | P::Succeeded, E::Done) => P::Finished,
            (phase, event) => return Err(LifecycleError { phase, event }),
        };
        Ok(next)
    }

    #[must_use]
    pub fn is_finished(self) -> bool {
        self == Self::Finished
    }
}

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod tests;
