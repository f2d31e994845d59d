//! End-to-End Integration Tests
//!
//! These tests drive the CAS client through full axum routers, in process
//! with `tower::ServiceExt::oneshot`, and through a running server over HTTP.

mod server;
mod session_binding;
mod single_logout;
mod ticket_validation;
