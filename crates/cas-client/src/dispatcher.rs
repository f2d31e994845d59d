//! Request dispatch.
//!
//! Every request is given a [`RequestContext`], then either answered as a
//! Single Logout notification or bound to its session and passed on. The
//! context is released when [`dispatch`] returns or unwinds.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::binder::SessionBinder;
use crate::client::CasClient;
use crate::context::{ContextScope, CookieAction, RequestContext};
use crate::cookie::{append_set_cookie, clear_cookie, session_cookie};
use crate::error::{CasError, CasResult};
use crate::slo::{is_form, is_single_logout_request, logout_payload, SingleLogoutProcessor};

/// CAS middleware.
///
/// Install with [`CasClient::protect`] or
/// `axum::middleware::from_fn_with_state(client, dispatch)`.
pub async fn dispatch(State(client): State<CasClient>, request: Request, next: Next) -> Response {
    tracing::debug!(method = %request.method(), uri = %request.uri(), "dispatching request");
    let scope = ContextScope::acquire(&client);
    let context = scope.context();

    let (request, logout) = match buffer_form(&client, request).await {
        Ok(buffered) => buffered,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read form body");
            return e.into_response();
        }
    };

    if let Some(payload) = logout {
        tracing::debug!("handling single logout notification");
        return SingleLogoutProcessor::new(&client)
            .respond(&payload, context)
            .await;
    }

    let (mut parts, body) = request.into_parts();
    if let Err(e) = SessionBinder::new(&client)
        .bind(&parts.headers, &parts.uri, context)
        .await
    {
        tracing::error!(error = %e, uri = %parts.uri, "failed to bind session");
        return e.into_response();
    }

    parts.extensions.insert(context.clone());
    let mut response = next.run(Request::from_parts(parts, body)).await;
    apply_cookie(&client, context, &mut response);
    response
}

/// Reads a form POST body into memory so it can be classified.
///
/// Returns the request, rebuilt with the buffered body, and the logout
/// payload when the request is a logout notification. Other requests pass
/// through unread.
async fn buffer_form(client: &CasClient, request: Request) -> CasResult<(Request, Option<String>)> {
    if *request.method() != Method::POST || !is_form(request.headers()) {
        return Ok((request, None));
    }

    let limit = client.config().max_form_body_bytes;
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared.is_some_and(|length| length > limit) {
        return Err(CasError::BodyTooLarge { limit });
    }

    let (parts, body) = request.into_parts();
    let bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                CasError::BodyTooLarge { limit }
            } else {
                CasError::Body(e.to_string())
            }
        })?
        .to_bytes();

    let payload = if is_single_logout_request(&parts.method, &parts.headers, &bytes) {
        logout_payload(&bytes)
    } else {
        None
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), payload))
}

fn apply_cookie(client: &CasClient, context: &RequestContext, response: &mut Response) {
    let name = client.cookie_name();
    let secure = client.config().secure_cookie;

    let cookie = match context.take_cookie_action() {
        CookieAction::Keep => return,
        CookieAction::Issue(index) => session_cookie(&name, &index, secure),
        CookieAction::Clear => clear_cookie(&name, secure),
    };

    if !append_set_cookie(response.headers_mut(), &cookie) {
        tracing::warn!(cookie = %name, "session cookie value is not a valid header");
    }
}
