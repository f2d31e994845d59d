//! Client configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults,
//! or built in code with the `with_*` setters.

use std::env;
use std::sync::Arc;

use axum::http::Uri;
use chrono::Duration;
use parking_lot::RwLock;
use url::Url;

use crate::error::{CasError, CasResult};

/// Cookie carrying the session index when none is configured.
pub const DEFAULT_COOKIE_NAME: &str = "_cas_session";

/// Largest form body buffered while checking for a logout notification.
pub const DEFAULT_MAX_FORM_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Longest accepted local session lifetime, ten years.
pub const MAX_SESSION_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Query parameter carrying a service ticket on the login redirect.
pub const TICKET_PARAM: &str = "ticket";

/// CAS client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the CAS server, e.g. `https://cas.example.com/cas`.
    pub cas_url: Url,

    /// Public origin of this application, used to build `service` URLs.
    pub service_url: Url,

    /// Initial name of the session cookie.
    pub cookie_name: String,

    /// Mark the session cookie `Secure`.
    pub secure_cookie: bool,

    /// Local lifetime of a session record; `None` keeps it until revoked.
    pub session_ttl: Option<Duration>,

    /// Largest form body inspected for a logout notification.
    pub max_form_body_bytes: usize,
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but the URLs.
    #[must_use]
    pub fn new(cas_url: Url, service_url: Url) -> Self {
        Self {
            cas_url,
            service_url,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secure_cookie: false,
            session_ttl: None,
            max_form_body_bytes: DEFAULT_MAX_FORM_BODY_BYTES,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `CAS_URL` | required |
    /// | `CAS_SERVICE_URL` | `http://localhost:8080` |
    /// | `CAS_COOKIE_NAME` | `_cas_session` |
    /// | `CAS_SECURE_COOKIE` | `false` |
    /// | `CAS_SESSION_TTL` | unset (seconds, at most ten years) |
    /// | `CAS_MAX_FORM_BODY` | 10 MiB |
    ///
    /// ## Errors
    ///
    /// Returns [`CasError::Config`] if `CAS_URL` is missing or a URL does not parse.
    pub fn from_env() -> CasResult<Self> {
        let cas_url = env::var("CAS_URL")
            .map_err(|_| CasError::Config("CAS_URL environment variable is required".into()))?;
        let cas_url = parse_url("CAS_URL", &cas_url)?;

        let service_url = env::var("CAS_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let service_url = parse_url("CAS_SERVICE_URL", &service_url)?;

        let mut config = Self::new(cas_url, service_url);

        if let Ok(name) = env::var("CAS_COOKIE_NAME") {
            validate_cookie_name(&name)?;
            config.cookie_name = name;
        }

        config.secure_cookie = env::var("CAS_SECURE_COOKIE")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        config.session_ttl = env::var("CAS_SESSION_TTL")
            .ok()
            .and_then(|v| parse_session_ttl(&v));

        if let Some(limit) = env::var("CAS_MAX_FORM_BODY")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_form_body_bytes = limit;
        }

        Ok(config)
    }

    /// Sets the initial cookie name.
    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Marks the session cookie `Secure`.
    #[must_use]
    pub const fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    /// Sets the local session lifetime.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// Sets the largest form body inspected for logout notifications.
    #[must_use]
    pub const fn with_max_form_body_bytes(mut self, limit: usize) -> Self {
        self.max_form_body_bytes = limit;
        self
    }

    /// Returns the CAS login URL that sends the user back to `service`.
    #[must_use]
    pub fn login_url(&self, service: &Url) -> Url {
        let mut url = self.endpoint("login");
        url.query_pairs_mut().append_pair("service", service.as_str());
        url
    }

    /// Returns the CAS logout URL, optionally redirecting to `service` afterwards.
    #[must_use]
    pub fn logout_url(&self, service: Option<&Url>) -> Url {
        let mut url = self.endpoint("logout");
        if let Some(service) = service {
            url.query_pairs_mut().append_pair("service", service.as_str());
        }
        url
    }

    /// Returns the ticket validation URL.
    #[must_use]
    pub fn service_validate_url(&self, service: &Url, ticket: &str) -> Url {
        let mut url = self.endpoint("serviceValidate");
        url.query_pairs_mut()
            .append_pair("service", service.as_str())
            .append_pair(TICKET_PARAM, ticket);
        url
    }

    /// Returns the `service` URL for a request, without its `ticket` parameter.
    ///
    /// The request path is joined onto the path of `service_url`, so an
    /// application mounted under `/app` yields `/app/...` service URLs.
    #[must_use]
    pub fn service_for(&self, uri: &Uri) -> Url {
        let mut url = self.service_url.clone();
        let base = self.service_url.path().trim_end_matches('/');
        url.set_path(&format!("{base}{}", uri.path()));
        url.set_query(None);

        let pairs: Vec<(String, String)> = uri
            .query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .filter(|(key, _)| key != TICKET_PARAM)
                    .map(|(key, value)| (key.into_owned(), value.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        url
    }

    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.cas_url.clone();
        url.set_query(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }
}

/// Parses a session lifetime in seconds, capped at [`MAX_SESSION_TTL_SECS`].
fn parse_session_ttl(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(|secs| Duration::seconds(secs.min(MAX_SESSION_TTL_SECS)))
}

fn parse_url(var: &str, value: &str) -> CasResult<Url> {
    Url::parse(value).map_err(|e| CasError::Config(format!("{var}: {e}")))
}

/// Characters RFC 6265 excludes from a cookie name.
const SEPARATORS: &[u8] = b"()<>@,;:\\\"/[]?={}";

/// Checks that `name` is a valid cookie name token.
fn validate_cookie_name(name: &str) -> CasResult<()> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !SEPARATORS.contains(&b));
    if valid {
        Ok(())
    } else {
        Err(CasError::Config(format!("invalid cookie name: {name:?}")))
    }
}

/// Live name of the session cookie.
///
/// Shared by every clone of the client. A rename applies to every cookie
/// read or written after it.
#[derive(Debug, Clone)]
pub struct CookieName(Arc<RwLock<Arc<str>>>);

impl CookieName {
    /// Creates the cell.
    ///
    /// ## Errors
    ///
    /// Returns [`CasError::Config`] if `name` is not a valid cookie name.
    pub fn new(name: &str) -> CasResult<Self> {
        validate_cookie_name(name)?;
        Ok(Self(Arc::new(RwLock::new(Arc::from(name)))))
    }

    /// Returns the current name.
    #[must_use]
    pub fn get(&self) -> Arc<str> {
        self.0.read().clone()
    }

    /// Replaces the name.
    ///
    /// ## Errors
    ///
    /// Returns [`CasError::Config`] if `name` is not a valid cookie name.
    pub fn set(&self, name: &str) -> CasResult<()> {
        validate_cookie_name(name)?;
        *self.0.write() = Arc::from(name);
        Ok(())
    }
}

impl Default for CookieName {
    fn default() -> Self {
        Self(Arc::new(RwLock::new(Arc::from(DEFAULT_COOKIE_NAME))))
    }
}
