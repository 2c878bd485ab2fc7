//! HTML-to-well-formed-XML normalization.
//!
//! HTML parsing is delegated to the lenient html5ever-based engine, which
//! never fails and inserts the implied `html`/`head`/`body` structure. The
//! resulting tree is then re-serialized as well-formed XML so that one
//! path-expression evaluator serves both document types. The normalization
//! drops constructs XML cannot carry: doctypes, comments (a `--` body cannot
//! be represented), processing instructions, `xmlns` attributes (which would
//! put elements back into a namespace and break unprefixed expressions), and
//! attribute names that are not XML names.

use ego_tree::iter::Edge;
use scraper::node::Node as HtmlNode;
use scraper::Html;

/// Parses `content` as HTML and serializes the tree as well-formed XML.
pub(crate) fn to_well_formed_xml(content: &str) -> String {
    let dom = Html::parse_document(content);
    let mut out = String::with_capacity(content.len() + content.len() / 4);

    for edge in dom.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                HtmlNode::Element(element) => {
                    out.push('<');
                    out.push_str(element.name());
                    for (name, value) in element.attrs() {
                        if !representable_attribute(name) {
                            continue;
                        }
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        escape_into(value, true, &mut out);
                        out.push('"');
                    }
                    if node.has_children() {
                        out.push('>');
                    } else {
                        out.push_str("/>");
                    }
                }
                HtmlNode::Text(text) => escape_into(&text.text, false, &mut out),
                _ => {}
            },
            Edge::Close(node) => {
                if let HtmlNode::Element(element) = node.value() {
                    if node.has_children() {
                        out.push_str("</");
                        out.push_str(element.name());
                        out.push('>');
                    }
                }
            }
        }
    }

    out
}

/// Whether an HTML attribute name survives as an XML attribute name.
/// Namespace declarations are dropped deliberately; the HTML engine treats
/// them as inert attributes, while the XML re-parse would not.
fn representable_attribute(name: &str) -> bool {
    if name == "xmlns" || name.starts_with("xmlns:") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

/// Escapes markup-significant characters; control characters XML 1.0 cannot
/// carry are dropped.
fn escape_into(raw: &str, in_attribute: bool, out: &mut String) {
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '\t' | '\n' | '\r' => out.push(ch),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
}
