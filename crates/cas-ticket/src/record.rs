//! Ticket/session record model.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Multi-valued attributes released by the CAS server for a principal.
pub type Attributes = BTreeMap<String, Vec<String>>;

/// Returned when a session index would be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session index must not be empty")]
pub struct InvalidSessionIndex;

/// Identifier the CAS server issues for one authenticated session.
///
/// Used as the join key between a Single Logout notification and the
/// locally held record. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionIndex(String);

impl SessionIndex {
    /// Creates a session index, trimming surrounding whitespace.
    ///
    /// ## Errors
    ///
    /// Returns [`InvalidSessionIndex`] if nothing is left after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidSessionIndex> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(InvalidSessionIndex);
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Returns the index as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionIndex {
    type Error = InvalidSessionIndex;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for SessionIndex {
    type Err = InvalidSessionIndex;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<SessionIndex> for String {
    fn from(index: SessionIndex) -> Self {
        index.0
    }
}

impl AsRef<str> for SessionIndex {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SessionIndex {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One authenticated session known to this server instance.
///
/// Created when a service ticket validates, read on every request carrying
/// the session, deleted by Single Logout or expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// Primary key.
    pub session_index: SessionIndex,

    /// Authenticated principal.
    pub user: String,

    /// Attributes from the validation response, passed through untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,

    /// When the ticket was validated.
    pub authenticated_at: DateTime<Utc>,

    /// Local expiry; `None` means the record lives until revoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TicketRecord {
    /// Creates a record authenticated now, without expiry.
    #[must_use]
    pub fn new(session_index: SessionIndex, user: impl Into<String>) -> Self {
        Self {
            session_index,
            user: user.into(),
            attributes: Attributes::new(),
            authenticated_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Adds one attribute value.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Replaces all attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Expires the record `ttl` after it was authenticated.
    ///
    /// A `ttl` reaching past the representable range saturates at
    /// [`DateTime::<Utc>::MAX_UTC`].
    #[must_use]
    pub fn expires_after(mut self, ttl: Duration) -> Self {
        let expires_at = self
            .authenticated_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns the first value of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns whether the record has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Returns whether the record has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
