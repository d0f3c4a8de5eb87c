//! Session collaborator: CSRF token and locale lookup backed by cookies.
//!
//! DESIGN
//! ======
//! The pipeline consumes only [`SessionSource`]. [`CookieSession`] is the
//! stock implementation on top of any [`CookieProvider`] (browser jar,
//! persisted store, or the in-memory [`MemoryCookies`]).
//!
//! The CSRF token is the value of the session cookie. The locale cookie is a
//! query string (`lc=fr&lcin=true`) whose `lc` pair names the locale.

use std::sync::{Arc, RwLock};

use crate::error::PlatformError;

/// Cookie holding the CSRF token.
pub const CSRF_COOKIE: &str = "bungled";

/// Cookie holding the user's locale preference.
pub const LOCALE_COOKIE: &str = "bungleloc";

// =============================================================================
// COOKIES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    /// `true` for session cookies (no expiry).
    pub session: bool,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), session: true, value: value.into() }
    }
}

/// Source of cookies for the current user context.
#[async_trait::async_trait]
pub trait CookieProvider: Send + Sync {
    /// Every cookie visible to the platform origin.
    ///
    /// # Errors
    ///
    /// Implementations return a [`PlatformError`] when the store is unreadable.
    async fn get_all(&self) -> Result<Vec<Cookie>, PlatformError>;
}

/// In-memory cookie store.
#[derive(Debug, Default, Clone)]
pub struct MemoryCookies {
    cookies: Arc<RwLock<Vec<Cookie>>>,
}

impl MemoryCookies {
    #[must_use]
    pub fn new(cookies: Vec<Cookie>) -> Self {
        Self { cookies: Arc::new(RwLock::new(cookies)) }
    }

    /// Insert or replace a cookie by name.
    pub fn set(&self, cookie: Cookie) {
        let mut cookies = self
            .cookies
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cookies.retain(|c| c.name != cookie.name);
        cookies.push(cookie);
    }

    pub fn remove(&self, name: &str) {
        self.cookies
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|c| c.name != name);
    }
}

#[async_trait::async_trait]
impl CookieProvider for MemoryCookies {
    async fn get_all(&self) -> Result<Vec<Cookie>, PlatformError> {
        Ok(self
            .cookies
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }
}

// =============================================================================
// SESSION SOURCE
// =============================================================================

/// What the pipeline needs from the user's session.
#[async_trait::async_trait]
pub trait SessionSource: Send + Sync {
    /// Token sent in the `X-CSRF` header.
    ///
    /// # Errors
    ///
    /// Returns a credential error when the token cannot be produced.
    async fn csrf_token(&self) -> Result<String, PlatformError>;

    /// Locale preferred by the session.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::CookieNotFound`] when the session expresses no
    /// preference, or another credential error.
    async fn locale(&self) -> Result<String, PlatformError>;
}

/// [`SessionSource`] reading well-known cookies from a provider.
#[derive(Clone, Default)]
pub struct CookieSession {
    provider: Option<Arc<dyn CookieProvider>>,
}

impl CookieSession {
    #[must_use]
    pub fn new(provider: Arc<dyn CookieProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    /// Session with no provider. Every lookup fails with
    /// [`PlatformError::CookieProviderMissing`].
    #[must_use]
    pub fn without_provider() -> Self {
        Self { provider: None }
    }

    async fn cookie(&self, name: &str) -> Result<Cookie, PlatformError> {
        let Some(provider) = &self.provider else {
            return Err(PlatformError::CookieProviderMissing);
        };
        provider
            .get_all()
            .await?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| PlatformError::CookieNotFound { name: name.to_string() })
    }
}

#[async_trait::async_trait]
impl SessionSource for CookieSession {
    async fn csrf_token(&self) -> Result<String, PlatformError> {
        let cookie = self.cookie(CSRF_COOKIE).await?;
        if cookie.value.trim().is_empty() {
            return Err(PlatformError::CsrfTokenMissing);
        }
        Ok(cookie.value)
    }

    async fn locale(&self) -> Result<String, PlatformError> {
        let cookie = self.cookie(LOCALE_COOKIE).await?;
        parse_locale(&cookie.value).ok_or_else(|| PlatformError::CookieNotFound { name: LOCALE_COOKIE.to_string() })
    }
}

/// Extract the `lc` value from a locale cookie (`lc=fr&lcin=true`).
fn parse_locale(value: &str) -> Option<String> {
    value
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == "lc")
        .map(|(_, lc)| lc.trim().to_string())
        .filter(|lc| !lc.is_empty())
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
