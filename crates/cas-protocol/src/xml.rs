//! Minimal namespace-agnostic XML walker shared by the parsers.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ProtocolError, ProtocolResult};

/// A node reported by [`walk`].
///
/// `path` holds the local names from the root down to the current element.
pub(crate) enum Node<'a> {
    Start {
        path: &'a [String],
        attributes: Vec<(String, String)>,
    },
    Text {
        path: &'a [String],
        text: String,
    },
}

/// Walks a document, calling `visit` for every element start and text run.
///
/// Fails on ill-formed XML, text outside the root, a missing root, more than
/// one root, or a truncated document.
pub(crate) fn walk<F>(xml: &[u8], mut visit: F) -> ProtocolResult<()>
where
    F: FnMut(Node<'_>) -> ProtocolResult<()>,
{
    let xml = std::str::from_utf8(xml)?;
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut roots = 0_usize;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                open(&element, &mut path, &mut roots)?;
                visit(Node::Start {
                    path: &path,
                    attributes: attributes(&element)?,
                })?;
            }
            Event::Empty(element) => {
                open(&element, &mut path, &mut roots)?;
                visit(Node::Start {
                    path: &path,
                    attributes: attributes(&element)?,
                })?;
                path.pop();
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(text) => {
                let text = text.unescape()?.into_owned();
                emit_text(&path, text, &mut visit)?;
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)?.to_string();
                emit_text(&path, text, &mut visit)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(ProtocolError::XmlParse(format!(
            "unexpected end of document inside <{}>",
            path.join("/")
        )));
    }
    if roots == 0 {
        return Err(ProtocolError::XmlParse("document has no root element".to_string()));
    }
    Ok(())
}

fn open(element: &BytesStart<'_>, path: &mut Vec<String>, roots: &mut usize) -> ProtocolResult<()> {
    if path.is_empty() {
        *roots += 1;
        if *roots > 1 {
            return Err(ProtocolError::XmlParse("multiple root elements".to_string()));
        }
    }
    let name = std::str::from_utf8(element.local_name().as_ref())?.to_string();
    path.push(name);
    Ok(())
}

fn emit_text<F>(path: &[String], text: String, visit: &mut F) -> ProtocolResult<()>
where
    F: FnMut(Node<'_>) -> ProtocolResult<()>,
{
    if path.is_empty() {
        return Err(ProtocolError::XmlParse("text outside the root element".to_string()));
    }
    visit(Node::Text { path, text })
}

fn attributes(element: &BytesStart<'_>) -> ProtocolResult<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let key = std::str::from_utf8(attribute.key.local_name().as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}
