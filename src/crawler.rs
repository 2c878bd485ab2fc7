//! The query accumulator.
//!
//! A `Crawler` owns a loaded document and a small amount of selection state:
//! the current result list, plus one of three mutually exclusive modes
//! (idle, holding a context for the next query, or holding the expression of
//! the last query so `and_query` can union onto it). The modes are a single
//! tagged enum, so a context and a pending expression can never coexist.

use std::mem;

use amxml::dom::{new_document, NodePtr};
use log::{debug, trace};

use crate::css::{CssEngine, CssToXPath};
use crate::error::CrawlerError;
use crate::loader::{DocType, Document, DEFAULT_ENCODING};
use crate::node::{Node, NodeList};

enum QueryState {
    /// No context, no pending expression.
    Idle,
    /// The next `query` runs once per context node.
    Contexted { context: Vec<NodePtr> },
    /// The last operation was a query; `and_query` may union onto it.
    Queried { expression: String },
}

/// A fluent query interface over one loaded XML or HTML document.
///
/// Not safe for concurrent use: every operation mutates instance state, and
/// the underlying tree handles are reference-counted, not atomic.
pub struct Crawler {
    document: Document,
    state: QueryState,
    result: NodeList,
    css: Option<CssEngine>,
    default_encoding: String,
}

impl Crawler {
    /// Loads `content`, inferring type and encoding from the content.
    pub fn new(content: impl AsRef<[u8]>) -> Crawler {
        Crawler::with_hints(content, None, None)
    }

    /// Loads `content` with explicit hints; a hint wins over sniffing.
    pub fn with_hints(
        content: impl AsRef<[u8]>,
        encoding: Option<&str>,
        doc_type: Option<DocType>,
    ) -> Crawler {
        let document = Document::load(content.as_ref(), encoding, doc_type, DEFAULT_ENCODING);
        Crawler {
            document,
            state: QueryState::Idle,
            result: NodeList::new(),
            css: None,
            default_encoding: DEFAULT_ENCODING.to_owned(),
        }
    }

    /// Replaces the document and resets all selection state.
    pub fn load_content(
        &mut self,
        content: impl AsRef<[u8]>,
        encoding: Option<&str>,
        doc_type: Option<DocType>,
    ) -> &mut Crawler {
        self.document = Document::load(
            content.as_ref(),
            encoding,
            doc_type,
            &self.default_encoding,
        );
        self.state = QueryState::Idle;
        self.result = NodeList::new();
        self
    }

    /// Sets the encoding used when nothing is declared and no hint is given.
    /// Applies to subsequent `load_content` calls.
    pub fn set_default_encoding(&mut self, label: &str) -> &mut Crawler {
        self.default_encoding = label.to_ascii_lowercase();
        self
    }

    /// Registers the optional CSS selector translator.
    pub fn set_css_translator(&mut self, translator: impl CssToXPath + 'static) -> &mut Crawler {
        self.css = Some(CssEngine::new(Box::new(translator)));
        self
    }

    /// The loaded document's resolved type.
    pub fn doc_type(&self) -> DocType {
        self.document.doc_type()
    }

    /// The loaded document's resolved encoding label.
    pub fn encoding(&self) -> &str {
        self.document.encoding()
    }

    /// Evaluates a path expression and replaces the current result.
    ///
    /// With no context set, the expression runs against the whole document
    /// and the result is the matches in document order. With a context set,
    /// the expression runs independently inside each context node (the
    /// subtree is serialized and re-parsed as a standalone document, so
    /// absolute expressions are scoped to the subtree); a context node with
    /// zero matches contributes one absent slot, keeping one output position
    /// per context position. The context applies to exactly this call.
    ///
    /// Invalid expressions and empty documents produce an empty result, not
    /// an error.
    pub fn query(&mut self, expression: &str) -> &mut Crawler {
        let state = mem::replace(&mut self.state, QueryState::Idle);
        let mut result = NodeList::new();

        match state {
            QueryState::Contexted { context } => {
                for node in &context {
                    let values = evaluate_within(node, expression);
                    if values.is_empty() {
                        result.push(Node::Absent);
                    } else {
                        for value in values {
                            result.push(Node::matched(value));
                        }
                    }
                }
            }
            QueryState::Idle | QueryState::Queried { .. } => {
                for value in self.evaluate(expression) {
                    result.push(Node::matched(value));
                }
            }
        }

        trace!("query {:?} produced {} slot(s)", expression, result.len());
        self.result = result;
        self.state = QueryState::Queried {
            expression: expression.to_owned(),
        };
        self
    }

    /// Unions another expression onto the previous query.
    ///
    /// Re-runs the previous expression and `expression` as a single native
    /// union (`a | b`), fully replacing the current result. Ordering follows
    /// the evaluator's document-order union semantics, not the call order of
    /// `and_query` invocations.
    ///
    /// # Errors
    ///
    /// [`CrawlerError::Sequencing`] when no query precedes this call (or a
    /// terminal materializer or `context` ran since).
    pub fn and_query(&mut self, expression: &str) -> Result<&mut Crawler, CrawlerError> {
        let QueryState::Queried {
            expression: pending,
        } = &self.state
        else {
            return Err(CrawlerError::Sequencing);
        };
        let combined = format!("{pending} | {expression}");
        Ok(self.query(&combined))
    }

    /// Falls back to another query when the previous one came up empty.
    ///
    /// The previous result counts as a success when any of its nodes has a
    /// non-empty value; a mix of empty and non-empty slots suppresses the
    /// fallback. Otherwise the result is discarded and `expression` runs as
    /// a full replacement.
    pub fn or_query(&mut self, expression: &str) -> &mut Crawler {
        let succeeded = self
            .result
            .iter()
            .any(|node| node.value().is_some_and(|value| !value.is_empty()));
        if succeeded {
            return self;
        }
        self.query(expression)
    }

    /// Selects the context nodes for the next `query` call.
    ///
    /// The expression always runs against the whole document; contexts do
    /// not nest. Clears any pending expression; the current result list is
    /// left untouched.
    pub fn context(&mut self, expression: &str) -> &mut Crawler {
        let context = match self.document.tree() {
            Some(tree) => match tree.get_nodeset(expression) {
                Ok(nodes) => nodes,
                Err(err) => {
                    debug!("context expression {expression:?} failed: {err}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        trace!("context {:?} selected {} node(s)", expression, context.len());
        self.state = QueryState::Contexted { context };
        self
    }

    /// Like `query`, but takes a CSS selector.
    ///
    /// # Errors
    ///
    /// [`CrawlerError::Configuration`] when no translator is registered.
    pub fn css_query(&mut self, selector: &str) -> Result<&mut Crawler, CrawlerError> {
        let expression = self.translate_css(selector)?;
        Ok(self.query(&expression))
    }

    /// Like `context`, but takes a CSS selector.
    ///
    /// # Errors
    ///
    /// [`CrawlerError::Configuration`] when no translator is registered.
    pub fn css_context(&mut self, selector: &str) -> Result<&mut Crawler, CrawlerError> {
        let expression = self.translate_css(selector)?;
        Ok(self.context(&expression))
    }

    /// The first node's value, or `None` when the result is empty or starts
    /// with an absent slot. Terminal: clears the pending expression.
    #[allow(clippy::wrong_self_convention)]
    pub fn to_string(&mut self) -> Option<String> {
        self.clear_pending();
        self.result
            .first()
            .and_then(|node| node.value().map(str::to_owned))
    }

    /// Every node's value in order, `None` per absent slot. Values keep
    /// their exact text; nothing is trimmed. Terminal: clears the pending
    /// expression.
    #[allow(clippy::wrong_self_convention)]
    pub fn to_vec(&mut self) -> Vec<Option<String>> {
        self.clear_pending();
        self.result
            .iter()
            .map(|node| node.value().map(str::to_owned))
            .collect()
    }

    /// Applies `f` to every node in order and collects the returns. Does not
    /// mutate the result. Terminal: clears the pending expression.
    pub fn each<T>(&mut self, mut f: impl FnMut(&Node, usize) -> T) -> Vec<T> {
        self.clear_pending();
        self.result
            .iter()
            .enumerate()
            .map(|(index, node)| f(node, index))
            .collect()
    }

    /// Strips whitespace from both ends of every matched node's value.
    /// Chainable; absent slots stay absent.
    pub fn trim(&mut self) -> &mut Crawler {
        self.map_values(|value| value.trim().to_owned())
    }

    /// Strips any of `mask`'s characters from both ends of every matched
    /// node's value. Chainable.
    pub fn trim_matches(&mut self, mask: &str) -> &mut Crawler {
        let mask: Vec<char> = mask.chars().collect();
        self.map_values(|value| value.trim_matches(|c| mask.contains(&c)).to_owned())
    }

    /// Replaces every occurrence of the literal `pattern` in every matched
    /// node's value. Chainable.
    pub fn replace(&mut self, pattern: &str, replacement: &str) -> &mut Crawler {
        self.map_values(|value| value.replace(pattern, replacement))
    }

    /// Keeps only the nodes `predicate` accepts, preserving relative order.
    /// Chainable.
    pub fn filter(&mut self, mut predicate: impl FnMut(&Node) -> bool) -> &mut Crawler {
        self.result.retain(|node| predicate(node));
        self
    }

    fn map_values(&mut self, mut f: impl FnMut(&str) -> String) -> &mut Crawler {
        for node in self.result.iter_mut() {
            node.map_value(&mut f);
        }
        self
    }

    fn clear_pending(&mut self) {
        if matches!(self.state, QueryState::Queried { .. }) {
            self.state = QueryState::Idle;
        }
    }

    fn translate_css(&mut self, selector: &str) -> Result<String, CrawlerError> {
        match self.css.as_mut() {
            Some(engine) => Ok(engine.translate(selector)),
            None => Err(CrawlerError::Configuration),
        }
    }

    fn evaluate(&self, expression: &str) -> Vec<String> {
        let Some(tree) = self.document.tree() else {
            return Vec::new();
        };
        match tree.get_nodeset(expression) {
            Ok(nodes) => nodes.iter().map(string_value).collect(),
            Err(err) => {
                debug!("path expression {expression:?} failed: {err}");
                Vec::new()
            }
        }
    }
}

/// Evaluates `expression` inside `node`'s subtree, re-parsed as a standalone
/// document so that absolute expressions are scoped to the subtree rather
/// than the original tree.
fn evaluate_within(node: &NodePtr, expression: &str) -> Vec<String> {
    let markup = node.to_string();
    let standalone = match new_document(&markup) {
        Ok(document) => document,
        Err(err) => {
            debug!("context slot did not re-parse, counting it as no match: {err}");
            return Vec::new();
        }
    };
    match standalone.get_nodeset(expression) {
        Ok(nodes) => nodes.iter().map(string_value).collect(),
        Err(err) => {
            debug!("path expression {expression:?} failed: {err}");
            Vec::new()
        }
    }
}

/// A node's string-value: concatenated subtree text for elements (empty for
/// childless ones), the node's own scalar for everything else (text nodes,
/// attributes, comments).
fn string_value(node: &NodePtr) -> String {
    if let Ok(texts) = node.get_nodeset("descendant-or-self::text()") {
        if !texts.is_empty() {
            return texts.iter().map(|text| text.value()).collect();
        }
        let is_element = node
            .get_nodeset("self::*")
            .map(|matches| !matches.is_empty())
            .unwrap_or(false);
        if is_element {
            return String::new();
        }
    }
    node.value()
}
