//! CSS selector translation seam.
//!
//! Selector-to-path-expression translation is an optional collaborator: none
//! is bundled, and the crawler surfaces its absence as a configuration error
//! instead of crashing. Registered translators are fronted by an LRU cache
//! keyed by selector, so repeated selectors are not re-derived.

use std::num::NonZeroUsize;

use lru::LruCache;

/// Translates a CSS selector into a path expression the evaluator
/// understands.
pub trait CssToXPath {
    /// Returns the path expression equivalent of `selector`.
    fn to_xpath(&self, selector: &str) -> String;
}

/// Cached translations kept per crawler.
const TRANSLATION_CACHE_CAPACITY: usize = 64;

pub(crate) struct CssEngine {
    translator: Box<dyn CssToXPath>,
    cache: LruCache<String, String>,
}

impl CssEngine {
    pub(crate) fn new(translator: Box<dyn CssToXPath>) -> CssEngine {
        let capacity =
            NonZeroUsize::new(TRANSLATION_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        CssEngine {
            translator,
            cache: LruCache::new(capacity),
        }
    }

    pub(crate) fn translate(&mut self, selector: &str) -> String {
        if let Some(expression) = self.cache.get(selector) {
            return expression.clone();
        }
        let expression = self.translator.to_xpath(selector);
        self.cache.put(selector.to_owned(), expression.clone());
        expression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingTranslator {
        calls: Rc<Cell<usize>>,
    }

    impl CssToXPath for CountingTranslator {
        fn to_xpath(&self, selector: &str) -> String {
            self.calls.set(self.calls.get() + 1);
            format!("//*[@class='{selector}']")
        }
    }

    #[test]
    fn test_translation_is_cached() {
        let calls = Rc::new(Cell::new(0));
        let mut engine = CssEngine::new(Box::new(CountingTranslator {
            calls: Rc::clone(&calls),
        }));

        assert_eq!(engine.translate("skill"), "//*[@class='skill']");
        assert_eq!(engine.translate("skill"), "//*[@class='skill']");
        assert_eq!(calls.get(), 1);

        assert_eq!(engine.translate("title"), "//*[@class='title']");
        assert_eq!(calls.get(), 2);
    }
}
