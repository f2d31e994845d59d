//! Session binding tests.

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{Method, StatusCode};
use cas_integration_tests::{
    body_text, form_post, get_request, get_with_cookie, logout_body, logout_request, logout_xml,
    set_cookies, TestApp,
};

/// A request with a valid session cookie is authenticated.
#[tokio::test]
async fn test_valid_cookie_is_authenticated() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;

    let response = app
        .send(get_with_cookie("/whoami", "_cas_session", "ABC123"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_text(response).await, "authenticated:alice");
}

/// A request without a cookie is unauthenticated but still served.
#[tokio::test]
async fn test_missing_cookie_is_anonymous() {
    let app = TestApp::new();

    let response = app.send(get_request("/whoami")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "anonymous");
}

/// A cookie naming a deleted session is unauthenticated and cleared.
#[tokio::test]
async fn test_logged_out_session_is_anonymous() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;
    app.send(logout_request("/", "ABC123")).await;

    let response = app
        .send(get_with_cookie("/whoami", "_cas_session", "ABC123"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("_cas_session=;"));
    assert!(cookies[0].contains("Max-Age=0"));
    assert_eq!(body_text(response).await, "anonymous");
}

/// Unknown tokens never fail the request.
#[tokio::test]
async fn test_unknown_token_is_anonymous() {
    let app = TestApp::new();

    let response = app
        .send(get_with_cookie("/whoami", "_cas_session", "FORGED"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "anonymous");
}

/// Routes that require a login redirect to the CAS server.
#[tokio::test]
async fn test_protected_route_redirects_to_login() {
    let app = TestApp::new();

    let response = app.send(get_request("/protected?page=2")).await;

    assert!(response.status().is_redirection());
    let location = response.headers()[LOCATION].to_str().unwrap();
    assert_eq!(
        location,
        "https://cas.example.com/cas/login?service=https%3A%2F%2Fapp.example.com%2Fprotected%3Fpage%3D2"
    );
}

/// Renaming the cookie applies to the next request.
#[tokio::test]
async fn test_cookie_rename_applies_to_next_request() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;

    app.client.set_cookie_name("app_sid").unwrap();

    let old = app
        .send(get_with_cookie("/whoami", "_cas_session", "ABC123"))
        .await;
    assert_eq!(body_text(old).await, "anonymous");

    let new = app.send(get_with_cookie("/whoami", "app_sid", "ABC123")).await;
    assert_eq!(body_text(new).await, "authenticated:alice");
}

/// Only a form POST with a `logoutRequest` field is a logout notification.
#[tokio::test]
async fn test_near_miss_logout_requests_reach_the_application() {
    let app = TestApp::new();
    app.seed("ABC123", "alice").await;

    // GET with the payload in the query string.
    let query = format!("/?{}", logout_body(&logout_xml("ABC123")));
    let response = app.send(get_request(&query)).await;
    assert_eq!(body_text(response).await, "anonymous");

    // POST with the wrong content type.
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from(logout_body(&logout_xml("ABC123"))))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(body_text(response).await, "anonymous");

    // Form POST without the field.
    let response = app.send(form_post("/", "name=alice".to_string())).await;
    assert_eq!(body_text(response).await, "anonymous");

    // Form POST with an empty field.
    let response = app.send(form_post("/", "logoutRequest=".to_string())).await;
    assert_eq!(body_text(response).await, "anonymous");

    assert!(app.has_session("ABC123").await);
}
