//! CAS client error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cas_protocol::ProtocolError;
use cas_ticket::StoreError;
use thiserror::Error;

/// Result type for CAS client operations.
pub type CasResult<T> = Result<T, CasError>;

/// CAS client errors.
#[derive(Debug, Error)]
pub enum CasError {
    /// A CAS protocol document could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The ticket store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The CAS server rejected a service ticket.
    #[error("ticket rejected ({code}): {message}")]
    TicketRejected {
        /// CAS error code, e.g. `INVALID_TICKET`.
        code: String,
        /// Reason given by the server.
        message: String,
    },

    /// The CAS server could not be reached or answered with an error status.
    #[error("CAS server error: {0}")]
    Upstream(String),

    /// A form body exceeded the configured limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// A request body could not be read.
    #[error("failed to read request body: {0}")]
    Body(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A handler asked for the request context outside the CAS layer.
    #[error("request context missing; is the CAS layer installed?")]
    MissingContext,
}

impl CasError {
    /// Returns the HTTP status this error maps to.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::TicketRejected { .. } => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Protocol(_)
            | Self::Store(_)
            | Self::Body(_)
            | Self::Config(_)
            | Self::MissingContext => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CasError {
    fn into_response(self) -> Response {
        (self.http_status(), self.to_string()).into_response()
    }
}
