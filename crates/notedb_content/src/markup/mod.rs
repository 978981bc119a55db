//! Markup parsing capability.
//!
//! The content model does not depend on a particular HTML engine. Callers
//! inject a [`MarkupEngine`]; [`HtmlEngine`] is the built-in one, backed by
//! `scraper` (html5ever).

mod dom;
mod parser;

pub use dom::{is_void, Element, Fragment, Node};
pub use parser::{parse as parse_html, HtmlEngine};

/// Parses markup into a traversable element tree.
///
/// Implementations must be tolerant: malformed input yields a best-effort
/// tree rather than an error.
pub trait MarkupEngine: Send + Sync {
    /// Parses `markup` as the content of a detached container element.
    fn parse(&self, markup: &str) -> Fragment;
}
