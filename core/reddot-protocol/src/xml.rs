//! Owned XML tree for RQL replies and fragments.
//!
//! Replies are parsed once with `roxmltree` and copied into [`Element`]s so
//! fragments can outlive the reply text and be handed to entity
//! constructors.

use crate::error::{ProtocolError, ProtocolResult};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use reddot_types::Guid;

/// Name of the envelope element of every RQL request and reply.
pub const IODATA: &str = "IODATA";

/// A child node of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute, replacing an existing one with the same name.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Appends a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Appends a text node.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Attribute value, or `None` when missing or empty.
    pub fn attr_non_empty(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.is_empty())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Direct child elements.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Text of the direct text children only.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Concatenated text of all descendants, in document order.
    pub fn inner_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    /// All descendant elements with the given name, in document order.
    /// The element itself is not included.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        for child in self.children() {
            child.collect_named(name, &mut out);
        }
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        if self.name == name {
            out.push(self);
        }
        for child in self.children() {
            child.collect_named(name, out);
        }
    }

    /// First descendant element with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children().find_map(|c| {
            if c.name == name {
                Some(c)
            } else {
                c.find(name)
            }
        })
    }

    /// Reads a `1`/`0` flag. An empty value reads as `false`.
    pub fn attr_bool(&self, name: &str) -> ProtocolResult<Option<bool>> {
        match self.attr(name) {
            None => Ok(None),
            Some("1") => Ok(Some(true)),
            Some("0") | Some("") => Ok(Some(false)),
            Some(other) => Err(self.bad_attr(name, other, "a 1/0 flag")),
        }
    }

    pub fn attr_i64(&self, name: &str) -> ProtocolResult<Option<i64>> {
        match self.attr_non_empty(name) {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.bad_attr(name, v, "an integer")),
        }
    }

    /// Reads a GUID in any of the forms the server emits.
    pub fn attr_guid(&self, name: &str) -> ProtocolResult<Option<Guid>> {
        match self.attr_non_empty(name) {
            None => Ok(None),
            Some(v) => Ok(Some(Guid::parse_lenient(v)?)),
        }
    }

    /// Reads an OLE automation date (days since 1899-12-30, fractional part
    /// is the time of day).
    pub fn attr_oa_date(&self, name: &str) -> ProtocolResult<Option<NaiveDateTime>> {
        match self.attr_non_empty(name) {
            None => Ok(None),
            Some(v) => {
                let value: f64 = v
                    .trim()
                    .replace(',', ".")
                    .parse()
                    .map_err(|_| self.bad_attr(name, v, "an OLE automation date"))?;
                from_oa_date(value)
                    .map(Some)
                    .ok_or_else(|| self.bad_attr(name, v, "an OLE automation date"))
            }
        }
    }

    fn bad_attr(&self, name: &str, value: &str, expected: &str) -> ProtocolError {
        ProtocolError::MalformedResponse(format!(
            "<{}> attribute {name}={value:?} is not {expected}",
            self.name
        ))
    }
}

/// Converts an OLE automation date to a timestamp.
pub fn from_oa_date(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() {
        return None;
    }
    const MS_PER_DAY: f64 = 86_400_000.0;
    let days = value.trunc();
    // Negative dates keep a positive time-of-day fraction.
    let fraction = (value - days).abs();
    let millis = (days * MS_PER_DAY + (fraction * MS_PER_DAY).round()) as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    epoch.checked_add_signed(Duration::try_milliseconds(millis)?)
}

/// A parsed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Parses reply text. Empty or whitespace-only text yields an empty
    /// `IODATA` document.
    pub fn parse(text: &str) -> ProtocolResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        let doc = roxmltree::Document::parse(text)
            .map_err(|e| ProtocolError::MalformedResponse(e.to_string()))?;
        Ok(Self {
            root: convert(doc.root_element()),
        })
    }

    /// An `IODATA` document without content.
    pub fn empty() -> Self {
        Self {
            root: Element::new(IODATA),
        }
    }

    pub fn from_root(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    /// All elements with the given name, root included.
    pub fn elements_by_name(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.root.collect_named(name, &mut out);
        out
    }

    /// First element with the given name, root included.
    pub fn first(&self, name: &str) -> Option<&Element> {
        if self.root.name() == name {
            Some(&self.root)
        } else {
            self.root.find(name)
        }
    }

    /// True when the root has no attributes, child elements or text.
    pub fn is_empty(&self) -> bool {
        self.root.attributes.is_empty()
            && self.root.children().next().is_none()
            && self.root.inner_text().trim().is_empty()
    }
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let mut element = Element::new(node.tag_name().name());
    for attr in node.attributes() {
        element
            .attributes
            .push((attr.name().to_string(), attr.value().to_string()));
    }
    for child in node.children() {
        if child.is_element() {
            element.children.push(Node::Element(convert(child)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.children.push(Node::Text(text.to_string()));
            }
        }
    }
    element
}
