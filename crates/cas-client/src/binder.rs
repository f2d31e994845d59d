//! Session binding.
//!
//! Resolves the session token a request carries into a binding on its
//! [`RequestContext`]. A token whose record is missing, revoked or expired
//! leaves the request unauthenticated; it never fails the request.

use axum::http::{HeaderMap, Uri};
use cas_ticket::{PutOutcome, SessionIndex};

use crate::client::CasClient;
use crate::config::TICKET_PARAM;
use crate::context::{CookieAction, RequestContext, SessionBinding};
use crate::cookie::session_token;
use crate::error::{CasError, CasResult};

/// Binds requests to their sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionBinder<'a> {
    client: &'a CasClient,
}

impl<'a> SessionBinder<'a> {
    /// Creates a binder for `client`.
    #[must_use]
    pub const fn new(client: &'a CasClient) -> Self {
        Self { client }
    }

    /// Binds a request from its headers and URI.
    ///
    /// The session cookie is tried first. Without a live session, a `ticket`
    /// query parameter is validated (when a validator is configured) and, on
    /// success, opens a new session.
    ///
    /// ## Errors
    ///
    /// Only ticket store failures are errors.
    pub async fn bind(
        &self,
        headers: &HeaderMap,
        uri: &Uri,
        context: &RequestContext,
    ) -> CasResult<SessionBinding> {
        let cookie_name = self.client.cookie_name();
        let token = session_token(headers, &cookie_name);

        let binding = self.resolve(token, context).await?;
        if binding != SessionBinding::Unauthenticated {
            return Ok(binding);
        }

        if token.is_some() {
            context.set_cookie_action(CookieAction::Clear);
        }

        if let Some(ticket) = ticket_param(uri) {
            return self.establish(ticket, uri, context).await;
        }
        Ok(binding)
    }

    /// Resolves a session token and attaches the outcome to `context`.
    ///
    /// An absent or blank token, or one with no live record, resolves to
    /// [`SessionBinding::Unauthenticated`].
    ///
    /// ## Errors
    ///
    /// Propagates ticket store failures.
    pub async fn resolve(
        &self,
        token: Option<&str>,
        context: &RequestContext,
    ) -> CasResult<SessionBinding> {
        let binding = match token.map(SessionIndex::new) {
            Some(Ok(index)) => match self.client.store().get(&index).await? {
                Some(record) => {
                    tracing::debug!(
                        session_index = %index,
                        user = %record.user,
                        "request bound to session"
                    );
                    SessionBinding::Authenticated(index)
                }
                None => {
                    tracing::debug!(session_index = %index, "no live session for token");
                    SessionBinding::Unauthenticated
                }
            },
            Some(Err(_)) | None => SessionBinding::Unauthenticated,
        };

        context.attach(binding.clone());
        Ok(binding)
    }

    async fn establish(
        &self,
        ticket: SessionIndex,
        uri: &Uri,
        context: &RequestContext,
    ) -> CasResult<SessionBinding> {
        let Some(validator) = self.client.validator() else {
            return Ok(SessionBinding::Unauthenticated);
        };

        let service = self.client.config().service_for(uri);
        let assertion = match validator.validate(ticket.as_str(), &service).await {
            Ok(assertion) => assertion,
            Err(CasError::TicketRejected { code, message }) => {
                tracing::warn!(ticket = %ticket, %code, %message, "service ticket rejected");
                return Ok(SessionBinding::Unauthenticated);
            }
            Err(e) => {
                tracing::error!(ticket = %ticket, error = %e, "service ticket validation failed");
                return Ok(SessionBinding::Unauthenticated);
            }
        };

        let mut record = assertion.into_record(ticket.clone());
        if let Some(ttl) = self.client.config().session_ttl {
            record = record.expires_after(ttl);
        }

        match self.client.store().put(&record).await? {
            PutOutcome::Stored => {
                tracing::info!(session_index = %ticket, user = %record.user, "session established");
                let binding = SessionBinding::Authenticated(ticket.clone());
                context.attach(binding.clone());
                context.set_cookie_action(CookieAction::Issue(ticket));
                Ok(binding)
            }
            PutOutcome::Revoked => {
                tracing::info!(
                    session_index = %ticket,
                    "session was logged out before its ticket was validated"
                );
                Ok(SessionBinding::Unauthenticated)
            }
        }
    }
}

/// Returns the `ticket` query parameter, if present and non-blank.
fn ticket_param(uri: &Uri) -> Option<SessionIndex> {
    url::form_urlencoded::parse(uri.query()?.as_bytes())
        .find(|(key, _)| key == TICKET_PARAM)
        .and_then(|(_, value)| SessionIndex::new(value.into_owned()).ok())
}
