//! Single Logout request.
//!
//! When a CAS session ends, the CAS server posts a SAML `LogoutRequest` to
//! every service that received a ticket for it:
//!
//! ```xml
//! <samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
//!     ID="LR-1-abc" Version="2.0" IssueInstant="2024-03-01T10:00:00Z">
//!   <saml:NameID xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">@NOT_USED@</saml:NameID>
//!   <samlp:SessionIndex>ST-1-abc</samlp:SessionIndex>
//! </samlp:LogoutRequest>
//! ```

use cas_ticket::SessionIndex;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;

use crate::error::{ProtocolError, ProtocolResult};
use crate::xml::{walk, Node};

const SAMLP_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";
const SAML_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// A parsed Single Logout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutRequest {
    /// Request identifier (may be empty).
    pub id: String,

    /// SAML version, "2.0" when absent.
    pub version: String,

    /// When the CAS server issued the request.
    pub issue_instant: DateTime<Utc>,

    /// Principal name, when the server fills it in.
    pub name_id: Option<String>,

    /// The session to revoke.
    pub session_index: SessionIndex,
}

impl LogoutRequest {
    /// Creates a request for a session, issued now.
    #[must_use]
    pub fn new(session_index: SessionIndex) -> Self {
        Self {
            id: format!("LR-{}", uuid::Uuid::new_v4().simple()),
            version: "2.0".to_string(),
            issue_instant: Utc::now(),
            name_id: None,
            session_index,
        }
    }

    /// Sets the principal name.
    #[must_use]
    pub fn with_name_id(mut self, name_id: impl Into<String>) -> Self {
        self.name_id = Some(name_id.into());
        self
    }

    /// Decodes the raw `logoutRequest` payload.
    ///
    /// `IssueInstant` is accepted as RFC 3339 or RFC 2822.
    ///
    /// ## Errors
    ///
    /// Fails on ill-formed XML, a root other than `LogoutRequest`, a missing
    /// or unparsable `IssueInstant`, or a missing or blank `SessionIndex`.
    pub fn parse(xml: &[u8]) -> ProtocolResult<Self> {
        let mut id = String::new();
        let mut version = None;
        let mut issue_instant = None;
        let mut name_id = None;
        let mut session_index = None;

        walk(xml, |node| {
            match node {
                Node::Start { path, attributes } if path.len() == 1 => {
                    if path[0] != "LogoutRequest" {
                        return Err(ProtocolError::UnexpectedRoot {
                            expected: "LogoutRequest",
                            actual: path[0].clone(),
                        });
                    }
                    for (key, value) in attributes {
                        match key.as_str() {
                            "ID" => id = value,
                            "Version" => version = Some(value),
                            "IssueInstant" => issue_instant = Some(value),
                            _ => {}
                        }
                    }
                }
                Node::Text { path, text } if path.len() == 2 => match path[1].as_str() {
                    "NameID" => name_id = Some(text),
                    "SessionIndex" => session_index = Some(text),
                    _ => {}
                },
                _ => {}
            }
            Ok(())
        })?;

        let raw_instant = issue_instant.ok_or(ProtocolError::MissingElement("IssueInstant"))?;
        let session_index = session_index
            .and_then(|value| SessionIndex::new(value).ok())
            .ok_or(ProtocolError::MissingElement("SessionIndex"))?;

        Ok(Self {
            id,
            version: version.unwrap_or_else(|| "2.0".to_string()),
            issue_instant: parse_instant(&raw_instant)?,
            name_id,
            session_index,
        })
    }

    /// Encodes the request in the format the CAS server sends.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let name_id = self.name_id.as_deref().unwrap_or("@NOT_USED@");
        format!(
            r#"<samlp:LogoutRequest xmlns:samlp="{SAMLP_NS}" xmlns:saml="{SAML_NS}" ID="{}" Version="{}" IssueInstant="{}"><saml:NameID>{}</saml:NameID><samlp:SessionIndex>{}</samlp:SessionIndex></samlp:LogoutRequest>"#,
            escape(self.id.as_str()),
            escape(self.version.as_str()),
            self.issue_instant.to_rfc3339_opts(SecondsFormat::Secs, true),
            escape(name_id),
            escape(self.session_index.as_str()),
        )
    }
}

fn parse_instant(raw: &str) -> ProtocolResult<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| ProtocolError::InvalidTimestamp(format!("{raw}: {e}")))
}
