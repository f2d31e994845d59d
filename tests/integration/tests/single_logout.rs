//! Single Logout tests.
//!
//! The CAS server POSTs a form with a `logoutRequest` field; the client
//! answers it without involving the application.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use cas_client::RequestContext;
use cas_integration_tests::{
    body_text, form_post, get_with_cookie, logout_body, logout_request, logout_xml, TestApp,
};
use tokio::sync::{Barrier, Notify};

/// A logout notification deletes the session and is answered with "OK".
#[tokio::test]
async fn test_logout_deletes_session() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;

    let response = app.send(logout_request("/", "ABC123")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
    assert!(!app.has_session("ABC123").await);
}

/// A malformed payload is a server error and leaves the store untouched.
#[tokio::test]
async fn test_malformed_payload_is_rejected() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;

    let response = app
        .send(form_post("/", logout_body("<malformed-xml>")))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_text(response).await.is_empty());
    assert!(app.has_session("ABC123").await);
}

/// A request without a session index is rejected like malformed XML.
#[tokio::test]
async fn test_missing_session_index_is_rejected() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;

    let payload = r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="LR-1" IssueInstant="2024-03-01T10:00:00Z"/>"#;
    let response = app.send(form_post("/", logout_body(payload))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.has_session("ABC123").await);
}

/// Logging out an unknown session still succeeds.
#[tokio::test]
async fn test_logout_of_unknown_session_succeeds() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;

    let response = app.send(logout_request("/", "NEVER-ISSUED")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.has_session("ABC123").await);
}

/// Repeated notifications for the same session are harmless.
#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;

    for _ in 0..3 {
        let response = app.send(logout_request("/", "ABC123")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert!(!app.has_session("ABC123").await);
}

/// A `logoutRequest` in the query string is not a notification.
#[tokio::test]
async fn test_query_string_payload_is_ignored() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;

    let path = format!("/?{}", logout_body(&logout_xml("ABC123")));
    let response = app.send(form_post(&path, "page=2".to_string())).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "anonymous");
    assert!(app.has_session("ABC123").await);
}

/// Notifications are intercepted on any protected route, whatever its methods.
#[tokio::test]
async fn test_logout_on_get_only_route() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;

    let response = app.send(logout_request("/protected", "ABC123")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
    assert!(!app.has_session("ABC123").await);
}

/// A logout that lands while a request is in flight is seen by its next read.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_logout_during_request_is_visible() {
    let bound = Arc::new(Barrier::new(2));
    let logged_out = Arc::new(Notify::new());

    let routes = {
        let bound = bound.clone();
        let logged_out = logged_out.clone();
        Router::new().route(
            "/slow",
            get(move |context: RequestContext| async move {
                let before = context.session().await.unwrap().is_some();
                bound.wait().await;
                logged_out.notified().await;
                let after = context.session().await.unwrap().is_some();
                format!("{before}/{after}")
            }),
        )
    };
    let app = TestApp::with_routes(routes);
    app.seed("ABC123", "alice").await;

    let router = app.router();
    let slow = tokio::spawn(async move {
        use tower::ServiceExt;
        let response = router
            .oneshot(get_with_cookie("/slow", "_cas_session", "ABC123"))
            .await
            .unwrap();
        body_text(response).await
    });

    bound.wait().await;
    let response = app.send(logout_request("/slow", "ABC123")).await;
    assert_eq!(response.status(), StatusCode::OK);
    logged_out.notify_one();

    assert_eq!(slow.await.unwrap(), "true/false");
}
