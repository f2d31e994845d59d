//! Service ticket validation tests.
//!
//! Tickets are validated by a stub that accepts every `ST-` ticket.

use axum::http::header::LOCATION;
use axum::http::StatusCode;
use cas_integration_tests::{
    body_text, get_request, get_with_cookie, logout_request, session_index, set_cookies, TestApp,
};
use cas_ticket::TicketStore;

/// Full lifecycle: ticket, cookie, Single Logout.
#[tokio::test]
async fn test_ticket_login_then_single_logout() {
    let app = TestApp::new();

    // Redirect back from CAS with a ticket.
    let response = app.send(get_request("/protected?ticket=ST-9-abc")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("_cas_session=ST-9-abc;"));
    assert!(cookies[0].contains("HttpOnly"));
    assert_eq!(body_text(response).await, "hello alice");

    let record = app
        .store
        .get(&session_index("ST-9-abc"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.attribute("mail"), Some("alice@example.com"));

    // Follow-up request with the cookie.
    let response = app
        .send(get_with_cookie("/whoami", "_cas_session", "ST-9-abc"))
        .await;
    assert_eq!(body_text(response).await, "authenticated:alice");

    // CAS server ends the session.
    let response = app.send(logout_request("/", "ST-9-abc")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(get_with_cookie("/whoami", "_cas_session", "ST-9-abc"))
        .await;
    assert_eq!(body_text(response).await, "anonymous");
}

/// A rejected ticket leaves the request unauthenticated.
#[tokio::test]
async fn test_rejected_ticket_redirects_to_login() {
    let app = TestApp::new();

    let response = app.send(get_request("/protected?ticket=PT-1")).await;

    assert!(response.status().is_redirection());
    assert!(set_cookies(&response).is_empty());
    let location = response.headers()[LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://cas.example.com/cas/login?service="));
    assert!(!location.contains("ticket"));
    assert!(!app.has_session("PT-1").await);
}

/// A logout that arrives before the ticket is validated wins.
#[tokio::test]
async fn test_logout_before_validation_wins() {
    let app = TestApp::new();

    let response = app.send(logout_request("/", "ST-5")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(get_request("/protected?ticket=ST-5")).await;

    assert!(response.status().is_redirection());
    assert!(set_cookies(&response).is_empty());
    assert!(!app.has_session("ST-5").await);
}

/// A live session takes precedence over a ticket in the URL.
#[tokio::test]
async fn test_live_session_ignores_ticket() {
    let app = TestApp::new();
    app.seed("ABC123", "bob").await;

    let request = get_with_cookie("/whoami?ticket=ST-77", "_cas_session", "ABC123");
    let response = app.send(request).await;

    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_text(response).await, "authenticated:bob");
    assert!(!app.has_session("ST-77").await);
}
