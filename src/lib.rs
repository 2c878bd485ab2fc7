//! domcrawler - fluent query composition over XML and HTML documents.
//!
//! Load a document once, then chain queries against it: plain
//! whole-document queries, context-scoped re-queries that keep positional
//! alignment, conditional fallback queries, and union queries. Parsing and
//! path-expression evaluation are delegated to embedded engines; this crate
//! is the stateful layer that decides what each call runs against and how
//! results combine.
//!
//! ```
//! use domcrawler::Crawler;
//!
//! let html = r#"<p class="skill">PHP, Java</p><p class="skill">Java, JBoss </p>"#;
//! let mut crawler = Crawler::new(html);
//!
//! let skills = crawler.query("//p[@class='skill']").to_vec();
//! assert_eq!(skills[0].as_deref(), Some("PHP, Java"));
//! assert_eq!(skills[1].as_deref(), Some("Java, JBoss "));
//!
//! let trimmed = crawler.query("//p[@class='skill']").trim().to_vec();
//! assert_eq!(trimmed[1].as_deref(), Some("Java, JBoss"));
//! ```
//!
//! Context queries run the next expression independently inside each
//! previously selected node, padding empty slots so positions line up:
//!
//! ```
//! use domcrawler::Crawler;
//!
//! let html = r#"<div class="job"><p class="org">Acme</p></div><div class="job"></div>"#;
//! let mut crawler = Crawler::new(html);
//! let orgs = crawler.context("//div[@class='job']").query("//p[@class='org']").to_vec();
//! assert_eq!(orgs, vec![Some("Acme".to_owned()), None]);
//! ```
//!
//! Loading never fails: malformed or empty content degrades to an empty
//! document, and unknown encodings fall back to UTF-8. The only errors a
//! chain can raise are [`CrawlerError::Sequencing`] (`and_query` without a
//! preceding `query`) and [`CrawlerError::Configuration`] (CSS querying with
//! no translator registered).

mod crawler;
mod css;
mod error;
mod node;
pub mod loader;

pub use crawler::Crawler;
pub use css::CssToXPath;
pub use error::CrawlerError;
pub use loader::{DocType, Document};
pub use node::{Node, NodeList};
