//! Request-scoped CAS context.
//!
//! Every request that passes the CAS layer gets a fresh [`RequestContext`]
//! tying it to the client that handled it and to the session resolved for
//! it. The context only remembers the session index: reading the session
//! always goes back to the ticket store, so a Single Logout that lands
//! mid-request is seen by the next read.
//!
//! The context lives exactly as long as its [`ContextScope`]. Dropping the
//! scope clears the binding, including when the handler panics.

use std::fmt;
use std::sync::Arc;

use cas_ticket::{SessionIndex, TicketRecord};
use parking_lot::Mutex;

use crate::client::CasClient;
use crate::error::CasResult;

/// Session state attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionBinding {
    /// No live session.
    #[default]
    Unauthenticated,
    /// Bound to the session with this index.
    Authenticated(SessionIndex),
}

/// What the response must do with the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum CookieAction {
    #[default]
    Keep,
    Issue(SessionIndex),
    Clear,
}

#[derive(Debug, Default)]
struct ContextState {
    binding: SessionBinding,
    cookie: CookieAction,
    released: bool,
}

struct ContextInner {
    client: CasClient,
    state: Mutex<ContextState>,
}

/// The CAS context of one in-flight request.
///
/// Cheap to clone; clones share state. Handlers obtain it as an extractor.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

impl RequestContext {
    fn new(client: CasClient) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                client,
                state: Mutex::new(ContextState::default()),
            }),
        }
    }

    /// Returns the client that handled the request.
    #[must_use]
    pub fn client(&self) -> &CasClient {
        &self.inner.client
    }

    /// Returns the current binding.
    #[must_use]
    pub fn binding(&self) -> SessionBinding {
        self.inner.state.lock().binding.clone()
    }

    /// Returns the bound session index, if any.
    #[must_use]
    pub fn session_index(&self) -> Option<SessionIndex> {
        match &self.inner.state.lock().binding {
            SessionBinding::Authenticated(index) => Some(index.clone()),
            SessionBinding::Unauthenticated => None,
        }
    }

    /// Returns whether a session is bound.
    ///
    /// Reflects the binding, not the store; use [`Self::session`] to confirm
    /// the session is still live.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.inner.state.lock().binding, SessionBinding::Authenticated(_))
    }

    /// Returns whether the request has finished and the context was cleared.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.inner.state.lock().released
    }

    /// Reads the bound session from the ticket store.
    ///
    /// Returns `None` when unauthenticated or when the session has since
    /// been revoked or has expired; in that case the binding is dropped.
    ///
    /// ## Errors
    ///
    /// Propagates ticket store failures.
    pub async fn session(&self) -> CasResult<Option<TicketRecord>> {
        let Some(index) = self.session_index() else {
            return Ok(None);
        };

        let record = self.inner.client.store().get(&index).await?;
        if record.is_none() {
            self.detach(&index);
        }
        Ok(record)
    }

    /// Binds the request. Ignored once the context is released.
    pub(crate) fn attach(&self, binding: SessionBinding) {
        let mut state = self.inner.state.lock();
        if !state.released {
            state.binding = binding;
        }
    }

    /// Unbinds the request if it is bound to `index`.
    pub(crate) fn detach(&self, index: &SessionIndex) -> bool {
        let mut state = self.inner.state.lock();
        if state.binding == SessionBinding::Authenticated(index.clone()) {
            state.binding = SessionBinding::Unauthenticated;
            true
        } else {
            false
        }
    }

    pub(crate) fn set_cookie_action(&self, action: CookieAction) {
        self.inner.state.lock().cookie = action;
    }

    pub(crate) fn take_cookie_action(&self) -> CookieAction {
        std::mem::take(&mut self.inner.state.lock().cookie)
    }

    fn release(&self) {
        let mut state = self.inner.state.lock();
        state.binding = SessionBinding::Unauthenticated;
        state.cookie = CookieAction::Keep;
        state.released = true;
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("RequestContext")
            .field("binding", &state.binding)
            .field("released", &state.released)
            .finish_non_exhaustive()
    }
}

/// Owns a [`RequestContext`] for the duration of one request.
///
/// Dropping the scope releases the context and decrements the client's
/// active context count.
pub struct ContextScope {
    context: RequestContext,
}

impl ContextScope {
    /// Creates an unauthenticated context for `client`.
    #[must_use]
    pub fn acquire(client: &CasClient) -> Self {
        client.context_acquired();
        Self {
            context: RequestContext::new(client.clone()),
        }
    }

    /// Returns the scoped context.
    #[must_use]
    pub const fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        self.context.release();
        self.context.client().context_released();
    }
}
