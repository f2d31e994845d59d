//! The CAS client handle.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{middleware, Router};
use cas_ticket::TicketStore;

use crate::config::{ClientConfig, CookieName};
use crate::dispatcher::dispatch;
use crate::error::CasResult;
use crate::validator::{HttpTicketValidator, TicketValidator};

struct ClientInner {
    config: ClientConfig,
    cookie_name: CookieName,
    store: Arc<dyn TicketStore>,
    validator: Option<Arc<dyn TicketValidator>>,
    active_contexts: AtomicUsize,
}

/// Shared CAS client.
///
/// Cheap to clone; clones share the store, cookie name and context count.
#[derive(Clone)]
pub struct CasClient {
    inner: Arc<ClientInner>,
}

impl CasClient {
    /// Starts building a client over `store`.
    #[must_use]
    pub fn builder(config: ClientConfig, store: Arc<dyn TicketStore>) -> CasClientBuilder {
        CasClientBuilder {
            config,
            store,
            validator: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the ticket store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TicketStore> {
        &self.inner.store
    }

    /// Returns the ticket validator, if one is configured.
    #[must_use]
    pub fn validator(&self) -> Option<&Arc<dyn TicketValidator>> {
        self.inner.validator.as_ref()
    }

    /// Returns the current session cookie name.
    #[must_use]
    pub fn cookie_name(&self) -> Arc<str> {
        self.inner.cookie_name.get()
    }

    /// Renames the session cookie for subsequent requests.
    ///
    /// ## Errors
    ///
    /// Returns [`crate::CasError::Config`] if `name` is not a valid cookie name.
    pub fn set_cookie_name(&self, name: &str) -> CasResult<()> {
        self.inner.cookie_name.set(name)?;
        tracing::info!(cookie = name, "session cookie renamed");
        Ok(())
    }

    /// Returns the number of requests currently holding a context.
    #[must_use]
    pub fn active_contexts(&self) -> usize {
        self.inner.active_contexts.load(Ordering::Acquire)
    }

    /// Wraps `router` so every request passes through [`dispatch`].
    #[must_use]
    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self.clone(), dispatch))
    }

    pub(crate) fn context_acquired(&self) {
        self.inner.active_contexts.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn context_released(&self) {
        self.inner.active_contexts.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for CasClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasClient")
            .field("cas_url", &self.inner.config.cas_url.as_str())
            .field("cookie_name", &self.cookie_name())
            .field("validator", &self.inner.validator.is_some())
            .field("active_contexts", &self.active_contexts())
            .finish_non_exhaustive()
    }
}

/// Builder for [`CasClient`].
pub struct CasClientBuilder {
    config: ClientConfig,
    store: Arc<dyn TicketStore>,
    validator: Option<Arc<dyn TicketValidator>>,
}

impl CasClientBuilder {
    /// Validates incoming service tickets with `validator`.
    ///
    /// Without a validator, requests carrying a `ticket` parameter are
    /// treated like any other unauthenticated request.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn TicketValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Validates incoming service tickets over HTTP against the CAS server.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn http_validator(self) -> CasResult<Self> {
        let validator = HttpTicketValidator::new(&self.config)?;
        Ok(self.validator(Arc::new(validator)))
    }

    /// Builds the client.
    ///
    /// ## Errors
    ///
    /// Returns [`crate::CasError::Config`] if the configured cookie name is invalid.
    pub fn build(self) -> CasResult<CasClient> {
        let cookie_name = CookieName::new(&self.config.cookie_name)?;
        Ok(CasClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                cookie_name,
                store: self.store,
                validator: self.validator,
                active_contexts: AtomicUsize::new(0),
            }),
        })
    }
}
