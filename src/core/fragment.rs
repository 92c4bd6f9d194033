//! Rendered fragments
//!
//! A fragment is one element of the visual output tree: a tag, CSS classes,
//! ordered attributes and children. Children are nested elements, text that is
//! escaped on serialization, or markup that a renderer has already made safe
//! (or that the kernel supplied as trusted HTML).

use serde::{Deserialize, Serialize};

use crate::ansi::escape_xml;

/// A child of a fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Node {
    Element(Fragment),
    /// Plain text, escaped when serialized
    Text(String),
    /// Markup inserted verbatim
    Markup(String),
}

/// One element of the rendered output tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Fragment {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn div() -> Self {
        Self::new("div")
    }

    /// An `output_subarea` div with extra space-separated classes
    pub fn subarea(classes: &str) -> Self {
        let mut fragment = Self::div().with_class("output_subarea");
        for class in classes.split_whitespace() {
            fragment.add_class(class);
        }
        fragment
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.push_markup(markup);
        self
    }

    pub fn with_child(mut self, child: Fragment) -> Self {
        self.push_child(child);
        self
    }

    /// Add a class unless already present
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Set an attribute, replacing an earlier value
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    pub fn push_markup(&mut self, markup: impl Into<String>) {
        self.children.push(Node::Markup(markup.into()));
    }

    pub fn push_child(&mut self, child: Fragment) {
        self.children.push(Node::Element(child));
    }

    /// Depth-first search for the first element carrying `class`
    pub fn find_class(&self, class: &str) -> Option<&Fragment> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            Node::Element(element) => element.find_class(class),
            _ => None,
        })
    }

    /// Mutable variant of [`Fragment::find_class`]
    pub fn find_class_mut(&mut self, class: &str) -> Option<&mut Fragment> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| match child {
            Node::Element(element) => element.find_class_mut(class),
            _ => None,
        })
    }

    /// The output kind of this fragment, e.g. `output_text` or `output_error`.
    ///
    /// This is the first `output_*` class in depth-first order, ignoring the
    /// structural `output_subarea` and `output_result` markers.
    pub fn kind(&self) -> Option<&str> {
        let own = self.classes.iter().find(|c| {
            c.starts_with("output_") && c.as_str() != "output_subarea" && c.as_str() != "output_result"
        });
        if let Some(class) = own {
            return Some(class.as_str());
        }
        self.children.iter().find_map(|child| match child {
            Node::Element(element) => element.kind(),
            _ => None,
        })
    }

    /// Concatenated text of all text and markup children
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Element(element) => element.collect_text(out),
                Node::Text(text) | Node::Markup(text) => out.push_str(text),
            }
        }
    }

    /// Serialize to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if !self.classes.is_empty() {
            out.push_str(" class=\"");
            out.push_str(&escape_xml(&self.classes.join(" ")));
            out.push('"');
        }
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_xml(value));
            out.push('"');
        }
        out.push('>');

        if is_void(&self.tag) {
            return;
        }

        for child in &self.children {
            match child {
                Node::Element(element) => element.write_html(out),
                Node::Text(text) => out.push_str(&escape_xml(text)),
                Node::Markup(markup) => out.push_str(markup),
            }
        }

        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "img" | "br" | "hr" | "input" | "meta" | "link")
}
