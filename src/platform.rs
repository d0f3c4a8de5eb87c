//! Platform — the request orchestrator.
//!
//! ARCHITECTURE
//! ============
//! `service_request` wraps a `Request` in a `Frame`, resolves the final URI,
//! queues the frame, and runs admission. Admitted frames hand their
//! `PlatformRequest` to a spawned task; that task reports every lifecycle
//! event back here (`LifecycleHandler`), where events fan out to plugins and
//! drive bookkeeping:
//!
//! - `httpDone`       → frame `Done`
//! - `responseParsed` → response stored on the frame
//! - `error`          → frame removed, caller rejected
//! - `success`        → frame removed, caller resolved
//! - `done`           → admission re-run
//!
//! CONCURRENCY
//! ===========
//! All frame state sits behind one `std::sync::Mutex`, held only for short
//! synchronous sections and never across an `.await`. Plugins are called
//! outside the lock. Admission is FIFO over waiting frames and is checked
//! only when a frame is pulled, so lowering the limit never preempts.
//!
//! TRADE-OFFS
//! ==========
//! `cancel_all` aborts in-flight calls and drops every queued frame without
//! settling it. Callers holding a `PendingResponse` see `Cancelled` only
//! because the channel closes, not because the pipeline rejected them.
//!
//! An abort lands at the task's next `.await`, so a call may finish after
//! it was cancelled. Events are only delivered for frames still in flight:
//! once cancelled, plugins hear nothing more and the caller keeps
//! `Cancelled` even if the call succeeded.
//!
//! Calls are spawned on the runtime current at the call site, or else on the
//! runtime captured at `build` or the first `submit`. With neither,
//! admission is deferred until a later `submit` or `done` re-runs it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, RwLock};

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::config::PlatformConfig;
use crate::error::{ErrorCode, PlatformError};
use crate::frame::{Frame, FrameId, FrameIdGenerator, FrameState, PendingResponse};
use crate::frame_manager::FrameManager;
use crate::frame_set::FrameSet;
use crate::lifecycle::EventKind;
use crate::platform_request::{LifecycleHandler, PlatformRequest, RequestOptions};
use crate::plugin::{CsrfPlugin, PlatformEvent, Plugin};
use crate::session::{CookieProvider, CookieSession, SessionSource};
use crate::transport::{HttpTransport, Transport};
use crate::types::{Request, Response};
use crate::uri::resolve_uri;

// =============================================================================
// STATE
// =============================================================================

struct PlatformInner {
    config: PlatformConfig,
    transport: Arc<dyn Transport>,
    session: Option<Arc<dyn SessionSource>>,
    plugins: RwLock<Vec<Arc<dyn Plugin>>>,
    ids: FrameIdGenerator,
    runtime: OnceLock<Handle>,
    state: Mutex<PlatformState>,
}

struct PlatformState {
    frames: FrameManager,
    max_concurrent: Option<usize>,
    /// Abort handles for frames whose call task is running.
    in_flight: HashMap<FrameId, AbortHandle>,
}

impl PlatformState {
    fn admits(&self) -> bool {
        self.max_concurrent
            .is_none_or(|max| self.frames.active_count() < max)
    }
}

/// Client for the remote platform API. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Platform {
    inner: Arc<PlatformInner>,
}

// =============================================================================
// BUILDER
// =============================================================================

pub struct PlatformBuilder {
    config: PlatformConfig,
    transport: Option<Arc<dyn Transport>>,
    session: Option<Arc<dyn SessionSource>>,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PlatformBuilder {
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn session(mut self, session: Arc<dyn SessionSource>) -> Self {
        self.session = Some(session);
        self
    }

    /// Shorthand for a [`CookieSession`] over `provider`.
    #[must_use]
    pub fn cookie_provider(self, provider: Arc<dyn CookieProvider>) -> Self {
        self.session(Arc::new(CookieSession::new(provider)))
    }

    #[must_use]
    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Build the platform. Without an explicit transport, a `reqwest`-backed
    /// [`HttpTransport`] is created. With user context on, a [`CsrfPlugin`]
    /// runs ahead of every other plugin; if no session was supplied, it fails
    /// each request with [`PlatformError::CookieProviderMissing`].
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::HttpClientBuild`] if the default transport
    /// cannot be built.
    pub fn build(self) -> Result<Platform, PlatformError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.config.connect_timeout)?),
        };

        let mut session = self.session;
        let mut plugins = Vec::with_capacity(self.plugins.len() + 1);
        if self.config.user_context {
            let source = session
                .get_or_insert_with(|| Arc::new(CookieSession::without_provider()))
                .clone();
            plugins.push(Arc::new(CsrfPlugin::new(source)) as Arc<dyn Plugin>);
        }
        plugins.extend(self.plugins);

        let frames = match self.config.max_queued {
            Some(max) => FrameSet::bounded(max),
            None => FrameSet::new(),
        };
        let state = PlatformState {
            frames: FrameManager::new(frames),
            max_concurrent: self.config.max_concurrent,
            in_flight: HashMap::new(),
        };

        Ok(Platform {
            inner: Arc::new(PlatformInner {
                config: self.config,
                transport,
                session,
                plugins: RwLock::new(plugins),
                ids: FrameIdGenerator::new(),
                runtime: Handle::try_current().map(OnceLock::from).unwrap_or_default(),
                state: Mutex::new(state),
            }),
        })
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl Platform {
    #[must_use]
    pub fn builder(config: PlatformConfig) -> PlatformBuilder {
        PlatformBuilder { config, transport: None, session: None, plugins: Vec::new() }
    }

    /// Platform with the default HTTP transport and no plugins.
    ///
    /// # Errors
    ///
    /// See [`PlatformBuilder::build`].
    pub fn new(config: PlatformConfig) -> Result<Self, PlatformError> {
        Self::builder(config).build()
    }

    #[must_use]
    pub fn config(&self) -> &PlatformConfig {
        &self.inner.config
    }

    /// Issue `request` and wait for its outcome.
    ///
    /// Resolves with the parsed envelope, including application-level
    /// failures (`Response::is_error`).
    ///
    /// # Errors
    ///
    /// Transport, parse, credential, and queueing failures.
    pub async fn service_request(&self, request: Request) -> Result<Response, PlatformError> {
        self.submit(request).await?.await
    }

    /// Queue `request` and return its future without waiting for it.
    ///
    /// # Errors
    ///
    /// Fails before queueing if the locale or URI cannot be resolved, the
    /// base options are invalid, or the queue is full.
    pub async fn submit(&self, request: Request) -> Result<PendingResponse, PlatformError> {
        if let Ok(runtime) = Handle::try_current() {
            let _ = self.inner.runtime.set(runtime);
        }
        let config = &self.inner.config;
        let locale = self.resolve_locale().await?;
        let url = resolve_uri(&config.base_url, &request.uri, &locale)?;
        let options = RequestOptions::for_api_key(&config.api_key, Some(config.timeout))?;

        let id = self.inner.ids.next_id();
        let platform_request = PlatformRequest::new(id, request.clone(), url, options);
        let (frame, pending) = Frame::new(id, request);
        let mut frame = frame.with_platform_request(platform_request);
        if let Err(e) = frame.advance(FrameState::Waiting) {
            error!(error = %e, "new frame refused waiting state");
        }

        {
            let mut state = self.lock_state();
            if state.frames.is_full() {
                let max = state.frames.max_size().unwrap_or_default();
                warn!(frame_id = %id, max, "request queue full; request rejected");
                return Err(PlatformError::QueueFull { max });
            }
            state.frames.add_frame(frame);
            debug!(frame_id = %id, waiting = state.frames.waiting_count(), "frame queued");
        }

        self.try_frame();
        Ok(pending)
    }

    /// Register a plugin. It observes requests admitted from now on.
    pub fn add_plugin(&self, plugin: Arc<dyn Plugin>) {
        self.inner
            .plugins
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(plugin);
    }

    /// Change the concurrency limit (`None` = unlimited) and re-run
    /// admission. Frames already active keep running.
    pub fn set_max_concurrent(&self, max_concurrent: Option<usize>) {
        self.lock_state().max_concurrent = max_concurrent;
        self.try_frame();
    }

    #[must_use]
    pub fn max_concurrent(&self) -> Option<usize> {
        self.lock_state().max_concurrent
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.lock_state().frames.active_count()
    }

    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.lock_state().frames.waiting_count()
    }

    /// Abort every in-flight call and drop every queued frame.
    ///
    /// Frames are not settled by the pipeline. Their futures resolve to
    /// [`PlatformError::Cancelled`] once the dropped frame closes the channel.
    /// Returns the number of frames dropped.
    pub fn cancel_all(&self) -> usize {
        let (handles, frames) = {
            let mut state = self.lock_state();
            let handles: Vec<AbortHandle> = state.in_flight.drain().map(|(_, h)| h).collect();
            (handles, state.frames.clear())
        };
        for handle in &handles {
            handle.abort();
        }
        info!(aborted = handles.len(), dropped = frames.len(), "cancelled all frames");
        frames.len()
    }
}

// =============================================================================
// ADMISSION
// =============================================================================

impl Platform {
    /// Admit waiting frames, FIFO, while the concurrency limit allows.
    fn try_frame(&self) {
        let Some(runtime) = self.runtime() else {
            warn!("no tokio runtime available; admission deferred");
            return;
        };
        let mut state = self.lock_state();
        while state.admits() {
            let Some(id) = state.frames.get_frame().map(Frame::id) else {
                break;
            };
            let Some(frame) = state.frames.frame_mut(id) else {
                break;
            };
            if let Err(e) = frame.advance(FrameState::Active) {
                error!(error = %e, "waiting frame refused admission");
                break;
            }
            let Some(request) = frame.take_platform_request() else {
                error!(frame_id = %id, "admitted frame has no request bound; dropping it");
                state.frames.remove_frame(id);
                continue;
            };

            let platform = self.clone();
            let transport = Arc::clone(&self.inner.transport);
            let task = runtime.spawn(async move {
                request.execute(transport.as_ref(), &platform).await;
            });
            state.in_flight.insert(id, task.abort_handle());
            debug!(frame_id = %id, active = state.frames.active_count(), "frame admitted");
        }
    }

    async fn resolve_locale(&self) -> Result<String, PlatformError> {
        let config = &self.inner.config;
        let session = match &self.inner.session {
            Some(session) if config.user_context => session,
            _ => return Ok(config.locale.clone()),
        };
        match session.locale().await {
            Ok(locale) => Ok(locale),
            Err(PlatformError::CookieNotFound { .. }) => Ok(config.locale.clone()),
            Err(e) => Err(e),
        }
    }

    fn runtime(&self) -> Option<Handle> {
        Handle::try_current()
            .ok()
            .or_else(|| self.inner.runtime.get().cloned())
    }

    fn plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.inner
            .plugins
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, PlatformState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn take_frame(&self, id: FrameId) -> Option<Frame> {
        let mut frame = self.lock_state().frames.remove_frame(id)?;
        if let Err(e) = frame.advance(FrameState::Done) {
            error!(error = %e, "settled frame refused done state");
        }
        Some(frame)
    }
}

// =============================================================================
// LIFECYCLE HANDLING
// =============================================================================

#[async_trait::async_trait]
impl LifecycleHandler for Platform {
    async fn before_send(&self, target: &PlatformRequest) -> Result<RequestOptions, PlatformError> {
        let mut options = target.options().clone();
        for plugin in self.plugins() {
            options = plugin.before_send(target, options).await.inspect_err(|e| {
                warn!(frame_id = %target.frame_id(), plugin = plugin.name(), error = %e, "before_send failed");
            })?;
        }
        Ok(options)
    }

    fn on_event(&self, event: EventKind, target: &PlatformRequest) {
        let id = target.frame_id();
        if !self.lock_state().in_flight.contains_key(&id) {
            debug!(frame_id = %id, %event, "event for cancelled frame dropped");
            return;
        }

        let platform_event = PlatformEvent { kind: event, target };
        for plugin in self.plugins() {
            plugin.update(&platform_event);
        }

        match event {
            EventKind::HttpDone => {
                let mut state = self.lock_state();
                if let Some(frame) = state.frames.frame_mut(id) {
                    if let Err(e) = frame.advance(FrameState::Done) {
                        error!(error = %e, "frame refused done state");
                    }
                }
            }
            EventKind::ResponseParsed => {
                if let Some(response) = target.response() {
                    let mut state = self.lock_state();
                    if let Some(frame) = state.frames.frame_mut(id) {
                        frame.set_response(response.clone());
                    }
                }
            }
            EventKind::Error => {
                let Some(frame) = self.take_frame(id) else {
                    return;
                };
                let err = target.error().cloned().unwrap_or_else(|| PlatformError::Network {
                    status: target.status(),
                    message: "request failed".into(),
                });
                warn!(frame_id = %id, code = err.error_code(), error = %err, "request rejected");
                frame.reject(err);
            }
            EventKind::Success => {
                let Some(frame) = self.take_frame(id) else {
                    return;
                };
                match frame.response().or(target.response()).cloned() {
                    Some(response) => {
                        debug!(frame_id = %id, error_code = response.error_code, "request resolved");
                        frame.resolve(response);
                    }
                    None => {
                        frame.reject(PlatformError::CorruptResponse("no parsed response".into()));
                    }
                }
            }
            EventKind::Done => {
                self.lock_state().in_flight.remove(&id);
                self.try_frame();
            }
            EventKind::BeforeSend | EventKind::HttpSuccess | EventKind::HttpFail => {}
        }
    }
}

#[cfg(test)]
#[path = "platform_test.rs"]
mod tests;
