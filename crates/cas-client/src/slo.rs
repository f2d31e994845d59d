//! Single Logout.
//!
//! The CAS server announces the end of a session by POSTing a form with a
//! single `logoutRequest` field holding a SAML `LogoutRequest`. The request
//! is answered here and never reaches the application.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use cas_protocol::LogoutRequest;
use cas_ticket::SessionIndex;

use crate::client::CasClient;
use crate::context::RequestContext;
use crate::error::CasResult;

/// Content type of a logout notification.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Form field carrying the logout payload.
pub const LOGOUT_FIELD: &str = "logoutRequest";

/// Returns whether a request is a Single Logout notification.
///
/// All three must hold: the method is POST, the content type is exactly
/// `application/x-www-form-urlencoded`, and the form has a non-empty
/// `logoutRequest` field.
#[must_use]
pub fn is_single_logout_request(method: &Method, headers: &HeaderMap, body: &[u8]) -> bool {
    *method == Method::POST && is_form(headers) && logout_payload(body).is_some()
}

/// Returns whether the content type is exactly the form content type.
pub(crate) fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes() == FORM_CONTENT_TYPE.as_bytes())
}

/// Returns the first `logoutRequest` form value, if present and non-empty.
///
/// Only the form body is read. A `logoutRequest` in the query string is
/// ignored, so a GET or a form POST with the field only in its URL is never
/// a logout notification.
#[must_use]
pub fn logout_payload(body: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == LOGOUT_FIELD)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Processes Single Logout notifications.
#[derive(Debug, Clone, Copy)]
pub struct SingleLogoutProcessor<'a> {
    client: &'a CasClient,
}

impl<'a> SingleLogoutProcessor<'a> {
    /// Creates a processor for `client`.
    #[must_use]
    pub const fn new(client: &'a CasClient) -> Self {
        Self { client }
    }

    /// Revokes the session named by a logout payload.
    ///
    /// Deleting an unknown session succeeds. If `context` is bound to the
    /// revoked session, it is unbound.
    ///
    /// ## Errors
    ///
    /// Fails if the payload does not parse or the store delete fails. The
    /// store is untouched when parsing fails.
    pub async fn process(&self, payload: &str, context: &RequestContext) -> CasResult<SessionIndex> {
        let request = LogoutRequest::parse(payload.as_bytes())?;
        let index = request.session_index;

        self.client.store().delete(&index).await?;
        context.detach(&index);

        tracing::info!(
            session_index = %index,
            request_id = %request.id,
            issued = %request.issue_instant,
            "session logged out by CAS server"
        );
        Ok(index)
    }

    /// Processes a logout payload and builds the response for the CAS server.
    ///
    /// `200 OK` with body `OK` on success, `500` with the error text otherwise.
    pub async fn respond(&self, payload: &str, context: &RequestContext) -> Response {
        match self.process(payload, context).await {
            Ok(_) => (StatusCode::OK, "OK").into_response(),
            Err(e) => {
                tracing::error!(error = %e, "single logout failed");
                e.into_response()
            }
        }
    }
}
