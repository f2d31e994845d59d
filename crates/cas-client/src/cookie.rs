//! Session cookie helpers.
//!
//! The cookie value is the session index itself. `HttpOnly` and
//! `SameSite=Lax` are always set; `Lax` keeps the cookie on the top-level
//! redirect back from the CAS server.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use cas_ticket::SessionIndex;

/// Finds the value of cookie `name` in the request headers.
///
/// Looks through every `Cookie` header. Empty values count as absent.
#[must_use]
pub fn session_token<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Builds the `Set-Cookie` value that establishes a session.
#[must_use]
pub fn session_cookie(name: &str, index: &SessionIndex, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!("{name}={index}; Path=/; HttpOnly{secure_flag}; SameSite=Lax")
}

/// Builds the `Set-Cookie` value that removes a session cookie.
#[must_use]
pub fn clear_cookie(name: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!("{name}=; Path=/; HttpOnly{secure_flag}; SameSite=Lax; Max-Age=0")
}

/// Appends a `Set-Cookie` header, keeping any the handler already set.
///
/// Returns `false` if the value is not a valid header value.
pub fn append_set_cookie(headers: &mut HeaderMap, cookie: &str) -> bool {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
            true
        }
        Err(_) => false,
    }
}
