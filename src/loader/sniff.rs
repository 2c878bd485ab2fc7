//! Content sniffing for the document loader.
//!
//! Handles detection of the document type and the declared encoding from the
//! raw bytes, before any decoding has happened, plus removal of
//! default-namespace declarations from XML content. All scans are
//! byte-level; declared-encoding tokens are ASCII by definition, so
//! lowercasing the haystack once is enough for case-insensitive matching.

use std::borrow::Cow;

use memchr::{memchr, memmem};

use super::DocType;

/// The literal prefix that marks a document as XML.
const XML_DECLARATION_PREFIX: &[u8] = b"<?xml ";

/// Guess the document type from the content's trimmed prefix.
///
/// This is a prefix heuristic, not validation: anything that does not start
/// with the literal XML declaration prefix is treated as HTML, including
/// malformed or non-standard declarations.
pub fn guess_type(content: &[u8]) -> DocType {
    if content.trim_ascii_start().starts_with(XML_DECLARATION_PREFIX) {
        DocType::Xml
    } else {
        DocType::Html
    }
}

/// Guess the declared encoding from the content.
///
/// Looks for an XML declaration `encoding=` attribute first, then for a
/// `charset=` token inside a `<meta …>` tag (both the HTML5
/// `<meta charset=X>` form and the legacy
/// `<meta http-equiv=… content="…; charset=X">` form). Matching is
/// case-insensitive and quotes are optional. Returns the lowercase label,
/// or `None` when neither pattern is present; substituting the configured
/// default is the loader's job, not the sniffer's.
pub fn guess_encoding(content: &[u8]) -> Option<String> {
    let haystack = content.to_ascii_lowercase();
    xml_declaration_encoding(&haystack).or_else(|| meta_charset(&haystack))
}

fn xml_declaration_encoding(haystack: &[u8]) -> Option<String> {
    let declaration = memmem::find(haystack, b"<?xml")?;
    let rest = &haystack[declaration..];
    let end = memmem::find(rest, b"?>").unwrap_or(rest.len());
    let span = &rest[..end];
    let attribute = memmem::find(span, b"encoding")?;
    parse_label(&span[attribute + b"encoding".len()..])
}

fn meta_charset(haystack: &[u8]) -> Option<String> {
    for start in memmem::find_iter(haystack, b"<meta") {
        let rest = &haystack[start..];
        let end = memchr(b'>', rest).unwrap_or(rest.len());
        let span = &rest[..end];
        if let Some(attribute) = memmem::find(span, b"charset") {
            if let Some(label) = parse_label(&span[attribute + b"charset".len()..]) {
                return Some(label);
            }
        }
    }
    None
}

/// Parses the `= ["']? label` tail that follows an attribute name.
/// Label characters are `[a-z0-9_-]`; the haystack is already lowercase.
fn parse_label(bytes: &[u8]) -> Option<String> {
    let mut i = 0;
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    if bytes.get(i) != Some(&b'=') {
        return None;
    }
    i += 1;
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    if matches!(bytes.get(i), Some(&b'"') | Some(&b'\'')) {
        i += 1;
    }
    let start = i;
    while bytes
        .get(i)
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_')
    {
        i += 1;
    }
    if i == start {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes[start..i]).into_owned())
}

/// Removes default-namespace declarations (`xmlns="…"` or `xmlns='…'`) so
/// unprefixed path expressions match elements that were in the default
/// namespace. Prefixed declarations (`xmlns:p="…"`) are left untouched and
/// keep requiring their prefix in expressions.
pub fn strip_default_namespace(content: &str) -> Cow<'_, str> {
    let bytes = content.as_bytes();
    let mut stripped: Option<String> = None;
    let mut copied = 0usize;

    for position in memmem::find_iter(bytes, b"xmlns") {
        if position < copied || position == 0 {
            continue;
        }
        if !bytes[position - 1].is_ascii_whitespace() {
            continue;
        }
        let mut i = position + b"xmlns".len();
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        let quote = match bytes.get(i) {
            Some(&b'"') => b'"',
            Some(&b'\'') => b'\'',
            _ => continue,
        };
        i += 1;
        let Some(close) = memchr(quote, &bytes[i..]) else {
            continue;
        };
        let out = stripped.get_or_insert_with(|| String::with_capacity(content.len()));
        out.push_str(&content[copied..position - 1]);
        copied = i + close + 1;
    }

    match stripped {
        Some(mut out) => {
            out.push_str(&content[copied..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_type_xml_prefix() {
        assert_eq!(
            guess_type(br#"<?xml version="1.0"?><root/>"#),
            DocType::Xml
        );
        assert_eq!(
            guess_type(b"  \n\t<?xml version=\"1.0\"?><root/>"),
            DocType::Xml
        );
    }

    #[test]
    fn test_guess_type_falls_through_to_html() {
        assert_eq!(guess_type(b"<html><body/></html>"), DocType::Html);
        assert_eq!(guess_type(b""), DocType::Html);
        // Malformed declarations are not validated, they are just not XML.
        assert_eq!(guess_type(b"<?xmlversion='1.0'?><root/>"), DocType::Html);
    }

    #[test]
    fn test_guess_encoding_xml_declaration() {
        assert_eq!(
            guess_encoding(br#"<?xml version="1.0" encoding="UTF-8"?><root/>"#),
            Some("utf-8".to_owned())
        );
        // Quotes are optional, case is ignored.
        assert_eq!(
            guess_encoding(b"<?XML VERSION=\"1.0\" ENCODING=ISO-8859-1?><root/>"),
            Some("iso-8859-1".to_owned())
        );
    }

    #[test]
    fn test_guess_encoding_meta_charset() {
        assert_eq!(
            guess_encoding(b"<html><head><meta charset=\"windows-1251\"></head></html>"),
            Some("windows-1251".to_owned())
        );
        assert_eq!(
            guess_encoding(b"<meta charset=utf-8>"),
            Some("utf-8".to_owned())
        );
    }

    #[test]
    fn test_guess_encoding_legacy_meta_content() {
        let content: &[u8] =
            b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\">";
        assert_eq!(guess_encoding(content), Some("iso-8859-1".to_owned()));
    }

    #[test]
    fn test_guess_encoding_first_match_wins() {
        let content: &[u8] =
            b"<?xml version=\"1.0\" encoding=\"utf-16\"?><meta charset=\"utf-8\">";
        assert_eq!(guess_encoding(content), Some("utf-16".to_owned()));
    }

    #[test]
    fn test_guess_encoding_absent() {
        assert_eq!(guess_encoding(b""), None);
        assert_eq!(guess_encoding(b"<html><body>plain</body></html>"), None);
        // A meta tag without a charset token is not a declaration.
        assert_eq!(guess_encoding(b"<meta name=\"author\" content=\"x\">"), None);
    }

    #[test]
    fn test_strip_default_namespace() {
        assert_eq!(
            strip_default_namespace(r#"<feed xmlns="http://example.com/ns"><t/></feed>"#),
            r#"<feed><t/></feed>"#
        );
        assert_eq!(
            strip_default_namespace("<feed xmlns='http://example.com/ns'><t/></feed>"),
            "<feed><t/></feed>"
        );
    }

    #[test]
    fn test_strip_default_namespace_keeps_prefixed() {
        let content = r#"<feed xmlns:media="http://example.com/media"><t/></feed>"#;
        assert_eq!(strip_default_namespace(content), content);
    }

    #[test]
    fn test_strip_default_namespace_untouched_content_borrows() {
        let content = "<feed><t/></feed>";
        assert!(matches!(
            strip_default_namespace(content),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_strip_default_namespace_mixed_declarations() {
        let content =
            r#"<feed xmlns="http://a" xmlns:m="http://b"><m:t xmlns="http://c"/></feed>"#;
        assert_eq!(
            strip_default_namespace(content),
            r#"<feed xmlns:m="http://b"><m:t/></feed>"#
        );
    }
}
