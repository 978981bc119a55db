//! The built-in engine.
//!
//! Parsing follows the HTML5 fragment algorithm with a `<body>` context, so
//! editor tag soup (unclosed paragraphs, stray end tags, named character
//! references with or without the trailing `;`) is handled the way browsers
//! handle it. The html5ever tree is then copied into a [`Fragment`], which
//! the content model can rewrite in place.

use super::dom::{Element, Fragment, Node};
use super::MarkupEngine;
use ego_tree::NodeRef;
use scraper::{Html, Node as HtmlNode};

/// The built-in [`MarkupEngine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEngine;

impl HtmlEngine {
    /// Creates the engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MarkupEngine for HtmlEngine {
    fn parse(&self, markup: &str) -> Fragment {
        parse(markup)
    }
}

/// Parses `markup` into a fragment.
#[must_use]
pub fn parse(markup: &str) -> Fragment {
    let html = Html::parse_fragment(markup);
    let children = html.root_element().children().filter_map(convert).collect();
    Fragment::new(children)
}

fn convert(node: NodeRef<'_, HtmlNode>) -> Option<Node> {
    match node.value() {
        HtmlNode::Text(text) => Some(Node::Text(String::from(&**text))),
        HtmlNode::Comment(comment) => Some(Node::Comment(String::from(&**comment))),
        HtmlNode::Element(element) => {
            let mut out = Element::new(element.name());
            for (name, value) in element.attrs() {
                out.set_attr(name, value);
            }
            out.children = node.children().filter_map(convert).collect();
            Some(Node::Element(out))
        }
        HtmlNode::Document
        | HtmlNode::Fragment
        | HtmlNode::Doctype(_)
        | HtmlNode::ProcessingInstruction(_) => None,
    }
}
