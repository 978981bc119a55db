//! A minimal element tree for rich-text bodies.

use html_escape::{encode_double_quoted_attribute_to_string, encode_text_to_string};

/// Elements that never have children or a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text, not markup.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Returns true if `name` is a void element.
#[must_use]
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// A node of a parsed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// Decoded character data.
    Text(String),
    /// A comment (`<!-- ... -->`).
    Comment(String),
}

impl Node {
    fn write_text(&self, out: &mut String) {
        match self {
            Self::Element(element) => {
                for child in &element.children {
                    child.write_text(out);
                }
            }
            Self::Text(text) => out.push_str(text),
            Self::Comment(_) => {}
        }
    }

    fn write_html(&self, raw_text: bool, out: &mut String) {
        match self {
            Self::Element(element) => element.write_outer_html(out),
            Self::Text(text) if raw_text => out.push_str(text),
            Self::Text(text) => {
                encode_text_to_string(text, out);
            }
            Self::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

/// An element node.
///
/// Tag and attribute names are stored lowercase. Attribute values are
/// stored decoded and re-escaped on serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the lowercase tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attributes in source order.
    #[must_use]
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_ascii_lowercase(), value)),
        }
    }

    /// Removes an attribute. Returns the old value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self
            .attrs
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(index).1)
    }

    /// Returns a `data-*` attribute by its dataset key (`hash`, `fileName`).
    #[must_use]
    pub fn data(&self, key: &str) -> Option<&str> {
        self.attr(&data_attr_name(key))
    }

    /// Sets a `data-*` attribute by its dataset key.
    pub fn set_data(&mut self, key: &str, value: impl Into<String>) {
        self.set_attr(&data_attr_name(key), value);
    }

    /// Returns true if the `class` attribute lists `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_text(&mut out);
        }
        out
    }

    /// Serialized children.
    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        let raw = RAW_TEXT_ELEMENTS.contains(&self.name.as_str());
        for child in &self.children {
            child.write_html(raw, &mut out);
        }
        out
    }

    /// Serialized element including its own tags.
    #[must_use]
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_outer_html(&mut out);
        out
    }

    fn write_outer_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            encode_double_quoted_attribute_to_string(value, out);
            out.push('"');
        }
        out.push('>');
        if is_void(&self.name) {
            return;
        }
        out.push_str(&self.inner_html());
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    fn visit_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        f(self);
        for child in &mut self.children {
            if let Node::Element(element) = child {
                element.visit_mut(f);
            }
        }
    }
}

/// `fileName` becomes `data-file-name`, matching DOM dataset rules.
fn data_attr_name(key: &str) -> String {
    let mut name = String::from("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push('-');
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}

/// A parsed markup fragment, the content of a detached container element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Top-level nodes in document order.
    pub children: Vec<Node>,
}

impl Fragment {
    /// Creates a fragment from top-level nodes.
    #[must_use]
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Concatenated text of all text nodes.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_text(&mut out);
        }
        out
    }

    /// Serializes the fragment like a container's `innerHTML`.
    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(false, &mut out);
        }
        out
    }

    /// Visits every element in document order.
    pub fn for_each_element_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Element),
    {
        for child in &mut self.children {
            if let Node::Element(element) = child {
                element.visit_mut(&mut f);
            }
        }
    }

    /// Returns all elements matching `predicate`, in document order.
    #[must_use]
    pub fn select<P>(&self, predicate: P) -> Vec<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        fn walk<'a, P: Fn(&Element) -> bool>(nodes: &'a [Node], p: &P, out: &mut Vec<&'a Element>) {
            for node in nodes {
                if let Node::Element(element) = node {
                    if p(element) {
                        out.push(element);
                    }
                    walk(&element.children, p, out);
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.children, &predicate, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img() -> Element {
        let mut el = Element::new("IMG");
        el.set_attr("src", "a.png");
        el.set_data("fileName", "a.png");
        el
    }

    #[test]
    fn attributes_are_case_insensitive() {
        let mut el = img();
        assert_eq!(el.name(), "img");
        assert_eq!(el.attr("SRC"), Some("a.png"));
        el.set_attr("Src", "b.png");
        assert_eq!(el.attrs().len(), 2);
        assert_eq!(el.remove_attr("src").as_deref(), Some("b.png"));
        assert_eq!(el.attr("src"), None);
    }

    #[test]
    fn dataset_keys_map_to_kebab_case() {
        let el = img();
        assert_eq!(el.attr("data-file-name"), Some("a.png"));
        assert_eq!(el.data("fileName"), Some("a.png"));
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        assert_eq!(img().outer_html(), r#"<img src="a.png" data-file-name="a.png">"#);
    }

    #[test]
    fn serialization_escapes_text_and_attributes() {
        let mut p = Element::new("p");
        p.set_attr("title", "\"quoted\"");
        p.children.push(Node::Text("1 < 2 & 3".into()));
        p.children.push(Node::Comment(" note ".into()));
        assert_eq!(
            p.outer_html(),
            r#"<p title="&quot;quoted&quot;">1 &lt; 2 &amp; 3<!-- note --></p>"#
        );
        assert_eq!(p.text_content(), "1 < 2 & 3");
    }

    #[test]
    fn class_lookup_splits_on_whitespace() {
        let mut el = Element::new("span");
        el.set_attr("class", "file  attachment");
        assert!(el.has_class("attachment"));
        assert!(!el.has_class("attach"));
    }

    #[test]
    fn visits_nested_elements_in_order() {
        let mut outer = Element::new("div");
        outer.children.push(Node::Element(Element::new("p")));
        let mut fragment = Fragment::new(vec![Node::Element(outer), Node::Element(img())]);

        let mut names = Vec::new();
        fragment.for_each_element_mut(|el| names.push(el.name().to_string()));
        assert_eq!(names, ["div", "p", "img"]);

        assert_eq!(fragment.select(|el| el.name() == "img").len(), 1);
    }
}
