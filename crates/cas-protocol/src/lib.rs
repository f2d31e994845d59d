//! CAS protocol messages for the CAS client.
//!
//! This crate parses the two documents a CAS client receives from the
//! authentication server:
//!
//! - **Single Logout requests** - the SAML `LogoutRequest` the server posts
//!   in the `logoutRequest` form field when a session ends ([`logout`])
//! - **Service validation responses** - the `cas:serviceResponse` returned
//!   when a service ticket is exchanged for an assertion ([`validation`])
//!
//! Both parsers ignore namespace prefixes and match elements by local name.
//!
//! # Example
//!
//! ```rust,ignore
//! use cas_protocol::LogoutRequest;
//!
//! let request = LogoutRequest::parse(form_value.as_bytes())?;
//! store.delete(&request.session_index).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod logout;
pub mod validation;
mod xml;

pub use error::{ProtocolError, ProtocolResult};
pub use logout::LogoutRequest;
pub use validation::{Assertion, ServiceResponse, ValidationFailure};
