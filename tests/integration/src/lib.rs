//! Shared fixtures for the end-to-end tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::Method;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use cas_client::{CasClient, CasError, CasResult, ClientConfig, CasUser, RequestContext, TicketValidator};
use cas_protocol::{Assertion, LogoutRequest};
use cas_ticket::{
    Attributes, MemoryTicketStore, PutOutcome, SessionIndex, StoreError, StoreResult,
    TicketRecord, TicketStore,
};
use tower::ServiceExt;
use url::Url;

/// Form content type sent by the CAS server.
pub const FORM: &str = "application/x-www-form-urlencoded";

/// Initializes test logging once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("cas_client=debug,cas_server=debug")
        .with_test_writer()
        .try_init();
}

/// Client configuration pointing at a fictional CAS server.
pub fn client_config() -> ClientConfig {
    ClientConfig::new(
        Url::parse("https://cas.example.com/cas").unwrap(),
        Url::parse("https://app.example.com").unwrap(),
    )
}

/// Accepts every ticket starting with `ST-`, as user `alice`.
#[derive(Debug, Default)]
pub struct StubValidator;

#[async_trait]
impl TicketValidator for StubValidator {
    async fn validate(&self, ticket: &str, _service: &Url) -> CasResult<Assertion> {
        if !ticket.starts_with("ST-") {
            return Err(CasError::TicketRejected {
                code: "INVALID_TICKET".to_string(),
                message: format!("ticket {ticket} not recognized"),
            });
        }
        let mut attributes = Attributes::new();
        attributes.insert("mail".to_string(), vec!["alice@example.com".to_string()]);
        Ok(Assertion {
            user: "alice".to_string(),
            attributes,
            proxy_granting_ticket: None,
        })
    }
}

/// A ticket store whose backend never answers in time.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl TicketStore for FailingStore {
    async fn get(&self, _index: &SessionIndex) -> StoreResult<Option<TicketRecord>> {
        Err(StoreError::Timeout)
    }

    async fn put(&self, _record: &TicketRecord) -> StoreResult<PutOutcome> {
        Err(StoreError::Timeout)
    }

    async fn delete(&self, _index: &SessionIndex) -> StoreResult<()> {
        Err(StoreError::Timeout)
    }

    async fn remove_expired(&self) -> StoreResult<u64> {
        Err(StoreError::Timeout)
    }
}

/// Protects `routes` with a CAS client over a [`FailingStore`].
pub fn failing_store_router(routes: Router) -> Router {
    init_tracing();
    let client = CasClient::builder(client_config(), Arc::new(FailingStore))
        .validator(Arc::new(StubValidator))
        .build()
        .unwrap();
    client.protect(routes)
}

/// An application protected by a CAS client over an in-memory store.
pub struct TestApp {
    /// The CAS client.
    pub client: CasClient,
    /// The ticket store behind it.
    pub store: Arc<MemoryTicketStore>,
    router: Router,
}

impl TestApp {
    /// Creates the app with the default routes.
    pub fn new() -> Self {
        Self::with_routes(default_routes())
    }

    /// Creates the app with `routes` behind the CAS layer.
    pub fn with_routes(routes: Router) -> Self {
        init_tracing();
        let store = Arc::new(MemoryTicketStore::new());
        let client = CasClient::builder(client_config(), store.clone())
            .validator(Arc::new(StubValidator))
            .build()
            .unwrap();
        let router = client.protect(routes);
        Self {
            client,
            store,
            router,
        }
    }

    /// Stores a live session.
    pub async fn seed(&self, index: &str, user: &str) {
        self.store
            .put(&TicketRecord::new(session_index(index), user))
            .await
            .unwrap();
    }

    /// Returns whether a session is live in the store.
    pub async fn has_session(&self, index: &str) -> bool {
        self.store.get(&session_index(index)).await.unwrap().is_some()
    }

    /// Sends one request through the protected router.
    pub async fn send(&self, request: Request) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Returns the router, for tests that drive it themselves.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes used by most tests.
///
/// - `/` and `/whoami` report the session without forcing a login
/// - `/protected` requires a login
pub fn default_routes() -> Router {
    Router::new()
        .route("/", get(whoami).post(whoami))
        .route("/whoami", get(whoami))
        .route("/protected", get(|user: CasUser| async move { format!("hello {}", user.name()) }))
}

async fn whoami(context: RequestContext) -> Result<String, CasError> {
    Ok(match context.session().await? {
        Some(record) => format!("authenticated:{}", record.user),
        None => "anonymous".to_string(),
    })
}

/// Parses a session index.
pub fn session_index(value: &str) -> SessionIndex {
    SessionIndex::new(value).unwrap()
}

/// The XML payload the CAS server sends to log out `index`.
pub fn logout_xml(index: &str) -> String {
    LogoutRequest::new(session_index(index)).to_xml()
}

/// Form-encodes a `logoutRequest` payload.
pub fn logout_body(payload: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("logoutRequest", payload)
        .finish()
}

/// A Single Logout notification for `index`.
pub fn logout_request(path: &str, index: &str) -> Request {
    form_post(path, logout_body(&logout_xml(index)))
}

/// A form POST with `body`.
pub fn form_post(path: &str, body: String) -> Request {
    axum::http::Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(CONTENT_TYPE, FORM)
        .body(Body::from(body))
        .unwrap()
}

/// A GET carrying the session cookie `name=value`.
pub fn get_with_cookie(path: &str, name: &str, value: &str) -> Request {
    axum::http::Request::builder()
        .uri(path)
        .header(COOKIE, format!("{name}={value}"))
        .body(Body::empty())
        .unwrap()
}

/// A GET without cookies.
pub fn get_request(path: &str) -> Request {
    axum::http::Request::builder()
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

/// Reads a response body as text.
pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Returns every `Set-Cookie` value of a response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}
