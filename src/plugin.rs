//! Plugins — observers of the request lifecycle.
//!
//! DESIGN
//! ======
//! A plugin sees every lifecycle event through `update` and may reshape the
//! outgoing options in `before_send`. `before_send` is a pure transform: it
//! receives the options produced by the previous plugin and returns a new
//! value. Plugins run in registration order for `before_send`; no ordering is
//! promised for `update`. Plugins never move frames between states.

use std::sync::{Arc, RwLock};

use crate::error::PlatformError;
use crate::lifecycle::EventKind;
use crate::platform_request::{CSRF_HEADER, PlatformRequest, RequestOptions};
use crate::session::SessionSource;

/// One lifecycle event as delivered to plugins.
#[derive(Debug, Clone, Copy)]
pub struct PlatformEvent<'a> {
    pub kind: EventKind,
    pub target: &'a PlatformRequest,
}

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Observe one lifecycle event.
    fn update(&self, event: &PlatformEvent<'_>) {
        let _ = event;
    }

    /// Produce the options to send. Called once per request, after the
    /// `beforeSend` event and before any network I/O.
    ///
    /// # Errors
    ///
    /// Returning an error fails the request before the transport is called.
    async fn before_send(
        &self,
        target: &PlatformRequest,
        options: RequestOptions,
    ) -> Result<RequestOptions, PlatformError> {
        let _ = target;
        Ok(options)
    }
}

// =============================================================================
// ACCESS TOKEN
// =============================================================================

/// Attaches `Authorization: Bearer <token>` while a token is set.
#[derive(Debug, Default)]
pub struct AccessTokenPlugin {
    token: RwLock<Option<String>>,
}

impl AccessTokenPlugin {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: RwLock::new(Some(token.into())) }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }

    fn current(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl Plugin for AccessTokenPlugin {
    fn name(&self) -> &'static str {
        "access_token"
    }

    async fn before_send(
        &self,
        _target: &PlatformRequest,
        options: RequestOptions,
    ) -> Result<RequestOptions, PlatformError> {
        match self.current() {
            Some(token) => options.with_header("Authorization", &format!("Bearer {token}")),
            None => Ok(options),
        }
    }
}

// =============================================================================
// CSRF
// =============================================================================

/// Attaches the session's CSRF token. Installed when user context is on.
pub struct CsrfPlugin {
    session: Arc<dyn SessionSource>,
}

impl CsrfPlugin {
    #[must_use]
    pub fn new(session: Arc<dyn SessionSource>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl Plugin for CsrfPlugin {
    fn name(&self) -> &'static str {
        "csrf"
    }

    async fn before_send(
        &self,
        _target: &PlatformRequest,
        options: RequestOptions,
    ) -> Result<RequestOptions, PlatformError> {
        let token = self.session.csrf_token().await?;
        options.with_header(CSRF_HEADER, &token)
    }
}

#[cfg(test)]
#[path = "plugin_test.rs"]
mod tests;
