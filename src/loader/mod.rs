//! Document loading: type and encoding resolution, decoding, parsing.
//!
//! Loading never fails. Unparseable or empty content yields a valid, empty
//! document; unknown encoding labels fall back to UTF-8; malformed byte
//! sequences are replaced. The engines behind the load perform no I/O and
//! resolve no external entities, so there is no parser-global security state
//! to flip for the duration of a parse and restore afterwards.

pub(crate) mod html;
pub mod sniff;

use std::fmt;

use amxml::dom::{new_document, NodePtr};
use encoding_rs::Encoding;
use log::debug;

/// The encoding sentinel used when nothing is declared and no hint is given.
pub const DEFAULT_ENCODING: &str = "auto";

/// The kind of markup a document holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    Xml,
    Html,
}

impl DocType {
    /// The normalized lowercase name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Xml => "xml",
            DocType::Html => "html",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded document: parsed tree plus its resolved type and encoding.
///
/// Immutable once created; re-loading builds a fresh `Document` that
/// replaces the old one wholesale.
pub struct Document {
    tree: Option<NodePtr>,
    doc_type: DocType,
    encoding: String,
}

impl Document {
    /// Loads `content`, resolving type and encoding from the hints, the
    /// content itself, or `default_encoding`, in that order.
    pub fn load(
        content: &[u8],
        encoding_hint: Option<&str>,
        type_hint: Option<DocType>,
        default_encoding: &str,
    ) -> Document {
        let doc_type = type_hint.unwrap_or_else(|| sniff::guess_type(content));
        let encoding = encoding_hint
            .map(str::to_ascii_lowercase)
            .or_else(|| sniff::guess_encoding(content))
            .unwrap_or_else(|| default_encoding.to_ascii_lowercase());

        let text = decode(content, &encoding);
        let tree = match doc_type {
            DocType::Xml => parse_xml(text.trim()),
            DocType::Html => parse_html(text.trim()),
        };
        debug!(
            "loaded {} document (encoding {}, {})",
            doc_type,
            encoding,
            if tree.is_some() { "parsed" } else { "empty" }
        );

        Document {
            tree,
            doc_type,
            encoding,
        }
    }

    /// The resolved document type.
    pub fn doc_type(&self) -> DocType {
        self.doc_type
    }

    /// The resolved lowercase encoding label, or `"auto"`.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Whether the load produced no tree (empty or unparseable content).
    pub fn is_empty(&self) -> bool {
        self.tree.is_none()
    }

    pub(crate) fn tree(&self) -> Option<&NodePtr> {
        self.tree.as_ref()
    }
}

/// Decodes `content` to UTF-8 text. A byte-order mark wins over the label;
/// an unknown label silently falls back to UTF-8; malformed sequences are
/// replaced rather than failing the load.
fn decode(content: &[u8], label: &str) -> String {
    let encoding = if label == DEFAULT_ENCODING {
        encoding_rs::UTF_8
    } else {
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => encoding,
            None => {
                debug!("unsupported encoding label {label:?}, falling back to utf-8");
                encoding_rs::UTF_8
            }
        }
    };
    let (text, actual, had_errors) = encoding.decode(content);
    if had_errors {
        debug!(
            "content is not valid {}, malformed sequences replaced",
            actual.name()
        );
    }
    text.into_owned()
}

fn parse_xml(text: &str) -> Option<NodePtr> {
    if text.is_empty() {
        return None;
    }
    let text = sniff::strip_default_namespace(text);
    match new_document(&text) {
        Ok(tree) => Some(tree),
        Err(err) => {
            debug!("discarding unparseable xml content: {err}");
            None
        }
    }
}

fn parse_html(text: &str) -> Option<NodePtr> {
    if text.is_empty() {
        return None;
    }
    let normalized = html::to_well_formed_xml(text);
    match new_document(&normalized) {
        Ok(tree) => Some(tree),
        Err(err) => {
            debug!("discarding html content that did not normalize: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_win_over_sniffing() {
        let content = br#"<?xml version="1.0" encoding="UTF-8"?><root/>"#;
        let document = Document::load(content, Some("ISO-8859-1"), Some(DocType::Html), "auto");
        assert_eq!(document.doc_type(), DocType::Html);
        assert_eq!(document.encoding(), "iso-8859-1");
    }

    #[test]
    fn test_sniffed_type_and_encoding() {
        let content = br#"<?xml version="1.0" encoding="UTF-8"?><root><a>x</a></root>"#;
        let document = Document::load(content, None, None, "auto");
        assert_eq!(document.doc_type(), DocType::Xml);
        assert_eq!(document.encoding(), "utf-8");
        assert!(!document.is_empty());
    }

    #[test]
    fn test_default_encoding_substituted_when_undeclared() {
        let document = Document::load(b"<html><body>x</body></html>", None, None, "auto");
        assert_eq!(document.encoding(), "auto");

        let document = Document::load(b"<html><body>x</body></html>", None, None, "UTF-8");
        assert_eq!(document.encoding(), "utf-8");
    }

    #[test]
    fn test_empty_content_loads_as_empty_document() {
        let document = Document::load(b"   \n ", None, None, "auto");
        assert!(document.is_empty());
        assert_eq!(document.doc_type(), DocType::Html);
    }

    #[test]
    fn test_unparseable_xml_degrades_to_empty() {
        let document = Document::load(b"<?xml version=\"1.0\"?><open><unclosed>", None, None, "auto");
        assert_eq!(document.doc_type(), DocType::Xml);
        assert!(document.is_empty());
    }

    #[test]
    fn test_unknown_encoding_label_falls_back() {
        let document = Document::load(
            b"<html><head><meta charset=\"no-such-charset\"></head><body><p>x</p></body></html>",
            None,
            None,
            "auto",
        );
        assert_eq!(document.encoding(), "no-such-charset");
        assert!(!document.is_empty());
    }

    #[test]
    fn test_decode_windows_1251() {
        // "Привет" in windows-1251.
        let mut content =
            b"<html><head><meta charset=windows-1251></head><body><p>".to_vec();
        content.extend([0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2]);
        content.extend_from_slice(b"</p></body></html>");

        let document = Document::load(&content, None, None, "auto");
        assert_eq!(document.encoding(), "windows-1251");
        assert!(!document.is_empty());
    }

    #[test]
    fn test_utf8_bom_is_removed() {
        let mut content = vec![0xEF, 0xBB, 0xBF];
        content.extend_from_slice(b"<?xml version=\"1.0\"?><root><a>x</a></root>");
        // The BOM keeps the prefix heuristic from seeing the declaration,
        // but decoding still strips it.
        let document = Document::load(&content, Some("utf-8"), Some(DocType::Xml), "auto");
        assert!(!document.is_empty());
    }
}
