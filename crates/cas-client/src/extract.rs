//! Axum extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use cas_ticket::TicketRecord;

use crate::context::RequestContext;
use crate::error::CasError;

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = CasError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(CasError::MissingContext)
    }
}

/// The authenticated user of a request.
///
/// Extracting it confirms the session against the ticket store. Requests
/// without a live session are redirected to the CAS login page, with this
/// request's URL as the `service`.
#[derive(Debug, Clone)]
pub struct CasUser {
    /// The live session record.
    pub record: TicketRecord,
}

impl CasUser {
    /// Returns the principal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.user
    }
}

impl<S> FromRequestParts<S> for CasUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = RequestContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match context.session().await {
            Ok(Some(record)) => Ok(Self { record }),
            Ok(None) => {
                let config = context.client().config();
                let login = config.login_url(&config.service_for(&parts.uri));
                tracing::debug!(uri = %parts.uri, "redirecting unauthenticated request to CAS login");
                Err(Redirect::to(login.as_str()).into_response())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read session");
                Err(e.into_response())
            }
        }
    }
}
