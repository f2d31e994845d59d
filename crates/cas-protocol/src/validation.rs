//! Service ticket validation responses.
//!
//! Decodes the `cas:serviceResponse` document returned by the CAS 2.0
//! `/serviceValidate` and CAS 3.0 `/p3/serviceValidate` endpoints.

use cas_ticket::{Attributes, SessionIndex, TicketRecord};
use chrono::{DateTime, Utc};

use crate::error::{ProtocolError, ProtocolResult};
use crate::xml::{walk, Node};

/// Attribute carrying the authentication time in CAS 3.0 responses.
const AUTHENTICATION_DATE: &str = "authenticationDate";

/// A successful ticket validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    /// Authenticated principal.
    pub user: String,

    /// Released attributes.
    pub attributes: Attributes,

    /// Proxy-granting ticket IOU, if one was requested.
    pub proxy_granting_ticket: Option<String>,
}

impl Assertion {
    /// Returns the CAS 3.0 `authenticationDate` attribute, if present and valid.
    #[must_use]
    pub fn authentication_date(&self) -> Option<DateTime<Utc>> {
        self.attributes
            .get(AUTHENTICATION_DATE)
            .and_then(|values| values.first())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .map(|instant| instant.with_timezone(&Utc))
    }

    /// Builds the record stored for the session this ticket opened.
    #[must_use]
    pub fn into_record(self, session_index: SessionIndex) -> TicketRecord {
        let authenticated_at = self.authentication_date();
        let mut record = TicketRecord::new(session_index, self.user).with_attributes(self.attributes);
        if let Some(at) = authenticated_at {
            record.authenticated_at = at;
        }
        record
    }
}

/// A rejected ticket validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Error code, e.g. `INVALID_TICKET`.
    pub code: String,

    /// Human readable reason.
    pub message: String,
}

/// Decoded `cas:serviceResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceResponse {
    /// `cas:authenticationSuccess`.
    Success(Assertion),
    /// `cas:authenticationFailure`.
    Failure(ValidationFailure),
}

#[derive(Default)]
enum Outcome {
    #[default]
    Unknown,
    Success,
    Failure,
}

impl ServiceResponse {
    /// Decodes a validation response body.
    ///
    /// ## Errors
    ///
    /// Fails on ill-formed XML, a root other than `serviceResponse`, a body
    /// with neither success nor failure, or a success without a user.
    pub fn parse(xml: &[u8]) -> ProtocolResult<Self> {
        let mut outcome = Outcome::Unknown;
        let mut user = None;
        let mut attributes = Attributes::new();
        let mut proxy_granting_ticket = None;
        let mut code = String::new();
        let mut message = String::new();

        walk(xml, |node| {
            match node {
                Node::Start { path, attributes: attrs } => match path {
                    [root] if root != "serviceResponse" => {
                        return Err(ProtocolError::UnexpectedRoot {
                            expected: "serviceResponse",
                            actual: root.clone(),
                        });
                    }
                    [_, child] if child == "authenticationSuccess" => outcome = Outcome::Success,
                    [_, child] if child == "authenticationFailure" => {
                        outcome = Outcome::Failure;
                        if let Some((_, value)) = attrs.into_iter().find(|(key, _)| key == "code") {
                            code = value;
                        }
                    }
                    _ => {}
                },
                Node::Text { path, text } => match path {
                    [_, success, leaf] if success == "authenticationSuccess" => match leaf.as_str() {
                        "user" => user = Some(text),
                        "proxyGrantingTicket" => proxy_granting_ticket = Some(text),
                        _ => {}
                    },
                    [_, success, group, name]
                        if success == "authenticationSuccess" && group == "attributes" =>
                    {
                        attributes.entry(name.clone()).or_default().push(text);
                    }
                    [_, failure] if failure == "authenticationFailure" => message = text,
                    _ => {}
                },
            }
            Ok(())
        })?;

        match outcome {
            Outcome::Success => Ok(Self::Success(Assertion {
                user: user
                    .filter(|u| !u.trim().is_empty())
                    .ok_or(ProtocolError::MissingElement("user"))?,
                attributes,
                proxy_granting_ticket,
            })),
            Outcome::Failure => Ok(Self::Failure(ValidationFailure { code, message })),
            Outcome::Unknown => Err(ProtocolError::MissingElement(
                "authenticationSuccess or authenticationFailure",
            )),
        }
    }
}
