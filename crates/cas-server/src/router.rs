//! Router configuration.
//!
//! Application routes sit behind the CAS layer; health checks do not.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
    routing::get,
    Router,
};
use cas_client::{CasError, CasUser, RequestContext};
use cas_ticket::{Attributes, SessionIndex};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let app = Router::new()
        .route("/", get(root))
        .route("/me", get(me))
        .route("/session", get(session))
        .route("/logout", get(logout))
        .with_state(state.clone());

    // Single Logout notifications may arrive on any protected path.
    let protected = state.client().protect(app);

    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
        .with_state(state);

    Router::new()
        .merge(protected)
        .merge(health)
        .layer(TraceLayer::new_for_http())
}

/// Root endpoint.
async fn root(user: CasUser) -> String {
    format!("Hello, {}!", user.name())
}

/// Authenticated user details.
#[derive(Debug, Serialize)]
struct UserInfo {
    user: String,
    session_index: String,
    attributes: Attributes,
    authenticated_at: String,
    expires_at: Option<String>,
}

/// Returns the authenticated user, redirecting to CAS login if needed.
async fn me(user: CasUser) -> Json<UserInfo> {
    let record = user.record;
    Json(UserInfo {
        user: record.user,
        session_index: record.session_index.to_string(),
        attributes: record.attributes,
        authenticated_at: record.authenticated_at.to_rfc3339(),
        expires_at: record.expires_at.map(|at| at.to_rfc3339()),
    })
}

/// Session status as seen by this request.
#[derive(Debug, Serialize)]
struct SessionStatus {
    authenticated: bool,
    user: Option<String>,
}

/// Reports the session state without forcing a login.
async fn session(context: RequestContext) -> Result<Json<SessionStatus>, CasError> {
    let record = context.session().await?;
    Ok(Json(SessionStatus {
        authenticated: record.is_some(),
        user: record.map(|r| r.user),
    }))
}

/// Ends the local session and sends the user to the CAS logout page.
///
/// The CAS server follows up with Single Logout for every service.
async fn logout(State(state): State<AppState>, context: RequestContext) -> Result<Redirect, CasError> {
    if let Some(index) = context.session_index() {
        state.client().store().delete(&index).await?;
        tracing::info!(session_index = %index, "local logout");
    }
    let config = state.client().config();
    Ok(Redirect::to(config.logout_url(Some(&config.service_url)).as_str()))
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    active_contexts: usize,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        version: env!("CARGO_PKG_VERSION"),
        active_contexts: state.client().active_contexts(),
    })
}

/// Liveness check endpoint.
async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness check endpoint.
///
/// Probes the ticket store with a lookup.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let sentinel = match SessionIndex::new("__readiness__") {
        Ok(index) => index,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR,
    };
    match state.client().store().get(&sentinel).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "ticket store not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
