//! Service ticket validation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cas_protocol::{Assertion, ServiceResponse};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{CasError, CasResult};

/// Validates service tickets against the CAS server.
#[async_trait]
pub trait TicketValidator: Send + Sync {
    /// Validates `ticket`, issued for `service`.
    ///
    /// ## Errors
    ///
    /// Returns [`CasError::TicketRejected`] when the server refuses the
    /// ticket, and other errors when the server cannot be asked.
    async fn validate(&self, ticket: &str, service: &Url) -> CasResult<Assertion>;
}

#[async_trait]
impl<T: TicketValidator + ?Sized> TicketValidator for Arc<T> {
    async fn validate(&self, ticket: &str, service: &Url) -> CasResult<Assertion> {
        (**self).validate(ticket, service).await
    }
}

/// Validates tickets over HTTP with the CAS `/serviceValidate` endpoint.
#[derive(Debug, Clone)]
pub struct HttpTicketValidator {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpTicketValidator {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a validator for the CAS server in `config`.
    ///
    /// ## Errors
    ///
    /// Returns [`CasError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> CasResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| CasError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, config))
    }

    /// Creates a validator over an existing HTTP client.
    #[must_use]
    pub fn with_client(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl TicketValidator for HttpTicketValidator {
    async fn validate(&self, ticket: &str, service: &Url) -> CasResult<Assertion> {
        let url = self.config.service_validate_url(service, ticket);
        tracing::debug!(%service, "validating service ticket");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CasError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CasError::Upstream(format!(
                "ticket validation returned {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CasError::Upstream(e.to_string()))?;

        match ServiceResponse::parse(&body)? {
            ServiceResponse::Success(assertion) => Ok(assertion),
            ServiceResponse::Failure(failure) => Err(CasError::TicketRejected {
                code: failure.code,
                message: failure.message,
            }),
        }
    }
}
