//! Protocol error types.

use thiserror::Error;

/// Result type for protocol parsing.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding CAS protocol documents.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The document is not well-formed XML.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// The document root is not the expected element.
    #[error("unexpected root element: expected {expected}, got {actual}")]
    UnexpectedRoot {
        /// Expected local name.
        expected: &'static str,
        /// Local name found.
        actual: String,
    },

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(&'static str),

    /// A timestamp could not be parsed.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl From<quick_xml::Error> for ProtocolError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ProtocolError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<std::str::Utf8Error> for ProtocolError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}
