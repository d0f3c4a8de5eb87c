//! Client for the remote platform JSON API.
//!
//! ARCHITECTURE
//! ============
//! Every call travels as a `Frame` through a queue owned by the `Platform`:
//!
//! ```text
//! service_request ─► Frame(Waiting) ─► FrameManager ─► admission ─► Frame(Active)
//!                                                                      │
//!                                          PlatformRequest::execute ◄──┘
//!                                                │
//!                 plugins ◄── lifecycle events ──┤
//!                                                ▼
//!                                   Frame(Done) ─► caller resolved / rejected
//! ```
//!
//! - `frame`, `frame_set`, `frame_manager`: the queue and its states
//! - `lifecycle`, `platform_request`: the per-call event machine
//! - `plugin`, `session`: options transforms and credentials
//! - `transport`, `uri`: the wire
//! - `platform`: admission control and settlement
//!
//! Logging goes through `tracing`; install a subscriber to see it.

pub mod config;
pub mod error;
pub mod frame;
pub mod frame_manager;
pub mod frame_set;
pub mod lifecycle;
pub mod platform;
pub mod platform_request;
pub mod plugin;
pub mod session;
pub mod transport;
pub mod types;
pub mod uri;

#[cfg(test)]
mod test_helpers;

pub use config::PlatformConfig;
pub use error::{ErrorCode, PlatformError};
pub use frame::{Frame, FrameId, FrameState, PendingResponse};
pub use frame_manager::FrameManager;
pub use frame_set::FrameSet;
pub use lifecycle::EventKind;
pub use platform::{Platform, PlatformBuilder};
pub use platform_request::{PlatformRequest, RequestOptions};
pub use plugin::{AccessTokenPlugin, CsrfPlugin, PlatformEvent, Plugin};
pub use session::{Cookie, CookieProvider, CookieSession, MemoryCookies, SessionSource};
pub use transport::{HttpTransport, Transport};
pub use types::{Request, Response};
