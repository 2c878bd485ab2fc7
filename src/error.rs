//! Errors surfaced to callers.
//!
//! Only two conditions abort a call chain. Everything else degrades
//! silently: unparseable or empty content loads as an empty tree, unsupported
//! encodings fall back to the raw content, and invalid or non-matching
//! expressions produce empty result lists.

use thiserror::Error;

/// An error raised by a crawler operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CrawlerError {
    /// `and_query()` ran without a preceding `query()`.
    #[error("query() must run before and_query()")]
    Sequencing,

    /// A CSS operation ran with no selector translator registered.
    #[error("register a CSS selector translator before using css_query()/css_context()")]
    Configuration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert!(CrawlerError::Sequencing.to_string().contains("and_query"));
        assert!(CrawlerError::Configuration.to_string().contains("translator"));
    }
}
