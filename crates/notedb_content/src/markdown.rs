//! Markup to markdown conversion.
//!
//! The converter is a stateless value backed by `html2md`: the flavor is
//! chosen at construction and every conversion parses its input itself, so
//! it works whether or not a [`crate::MarkupEngine`] is installed.
//!
//! In the [`Flavor::Original`] dialect, elements that only GitHub markdown
//! can express (tables, strikethrough) are emitted as raw HTML, which
//! markdown readers pass through.

use html2md::dummy::HtmlCherryPickHandler;
use html2md::{Handle, StructuredPrinter, TagHandler, TagHandlerFactory};
use std::collections::HashMap;

/// Elements kept as raw HTML in the original dialect.
const GFM_ONLY_ELEMENTS: &[&str] = &[
    "del", "s", "strike", "table", "caption", "thead", "tbody", "tfoot", "tr", "th", "td",
];

/// Markdown dialect produced by a [`MarkdownConverter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flavor {
    /// Classic markdown: no tables, no strikethrough.
    #[default]
    Original,
    /// GitHub flavored: adds pipe tables and `~~strikethrough~~`.
    Github,
}

/// Converts markup to markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter {
    flavor: Flavor,
}

impl MarkdownConverter {
    /// Creates a converter for `flavor`.
    #[must_use]
    pub const fn new(flavor: Flavor) -> Self {
        Self { flavor }
    }

    /// Returns the flavor.
    #[must_use]
    pub const fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Converts a markup string.
    #[must_use]
    pub fn convert(&self, markup: &str) -> String {
        if markup.trim().is_empty() {
            return String::new();
        }
        html2md::parse_html_custom(markup, &self.handlers())
    }

    fn handlers(&self) -> HashMap<String, Box<dyn TagHandlerFactory>> {
        let mut handlers: HashMap<String, Box<dyn TagHandlerFactory>> = HashMap::new();
        handlers.insert("code".to_string(), Box::new(InlineCodeFactory));
        if self.flavor == Flavor::Original {
            for name in GFM_ONLY_ELEMENTS {
                handlers.insert((*name).to_string(), Box::new(RawHtmlFactory));
            }
        }
        handlers
    }
}

struct RawHtmlFactory;

impl TagHandlerFactory for RawHtmlFactory {
    fn instantiate(&self) -> Box<dyn TagHandler> {
        Box::new(HtmlCherryPickHandler::default())
    }
}

struct InlineCodeFactory;

impl TagHandlerFactory for InlineCodeFactory {
    fn instantiate(&self) -> Box<dyn TagHandler> {
        Box::new(InlineCodeHandler::default())
    }
}

/// Inline code span. Code inside `<pre>` never reaches this handler.
#[derive(Default)]
struct InlineCodeHandler {
    start: usize,
}

impl TagHandler for InlineCodeHandler {
    fn handle(&mut self, _tag: &Handle, printer: &mut StructuredPrinter) {
        self.start = printer.data.len();
    }

    fn after_handle(&mut self, printer: &mut StructuredPrinter) {
        let code = printer.data.split_off(self.start);
        printer.append_str(&code_span(&code));
    }
}

/// Wraps `code` in a backtick fence longer than any backtick run inside it.
fn code_span(code: &str) -> String {
    if code.is_empty() {
        return String::new();
    }
    let longest_run = code
        .split(|ch| ch != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run + 1);
    let pad = if code.starts_with('`') || code.ends_with('`') {
        " "
    } else {
        ""
    };
    format!("{fence}{pad}{code}{pad}{fence}")
}
