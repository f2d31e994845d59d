//! # cas-client
//!
//! CAS single sign-on client for axum applications.
//!
//! The client sits in front of an application's routes and, for every
//! request, either processes a Single Logout notification from the CAS
//! server or binds the caller's session to a request-scoped context before
//! the application handler runs.
//!
//! ## Components
//!
//! - [`SessionBinder`] - resolves the session cookie (or a fresh service
//!   ticket) through the ticket store and attaches the outcome to the
//!   [`RequestContext`]
//! - [`SingleLogoutProcessor`] - recognises logout notifications and
//!   revokes the named session
//! - [`dispatch`] - the middleware that routes between the two and
//!   guarantees the context is released on every exit path
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use cas_client::{CasClient, ClientConfig, CasUser};
//! use cas_ticket::MemoryTicketStore;
//!
//! let config = ClientConfig::new(
//!     "https://cas.example.com/cas".parse()?,
//!     "https://app.example.com".parse()?,
//! );
//! let client = CasClient::builder(config, Arc::new(MemoryTicketStore::new())).build()?;
//!
//! let app = client.protect(
//!     Router::new().route("/", get(|user: CasUser| async move { user.record.user })),
//! );
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod binder;
pub mod client;
pub mod config;
pub mod context;
pub mod cookie;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod slo;
pub mod validator;

pub use binder::SessionBinder;
pub use client::{CasClient, CasClientBuilder};
pub use config::{ClientConfig, CookieName, DEFAULT_COOKIE_NAME};
pub use context::{ContextScope, RequestContext, SessionBinding};
pub use dispatcher::dispatch;
pub use error::{CasError, CasResult};
pub use extract::CasUser;
pub use slo::{is_single_logout_request, SingleLogoutProcessor};
pub use validator::{HttpTicketValidator, TicketValidator};
