//! A minimal XML element tree.
//!
//! SOAP payloads are handled as trees of [`Element`] rather than generated
//! types: the client binds to a service description at runtime, so
//! arguments and results are plain trees whose shape follows the remote
//! schema.
//!
//! Parsed elements keep only local names; namespace prefixes and `xmlns`
//! declarations are dropped. Elements built by hand may carry qualified
//! attribute names such as `xsi:type`, and [`Element::attribute`] matches on
//! the local part either way.

use std::io::Write;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::XmlError;

/// An XML element with attributes, optional text, and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create an element holding only text.
    pub fn text_element<S: Into<String>, T: Into<String>>(name: S, text: T) -> Self {
        Self::new(name).with_text(text)
    }

    pub fn with_text<T: Into<String>>(mut self, text: T) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children<I: IntoIterator<Item = Element>>(mut self, children: I) -> Self {
        self.children.extend(children);
        self
    }

    /// Append a child element.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Element> {
        self.children
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given local name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Element::text)
    }

    /// Like [`Element::child`], but a missing child is an error.
    pub fn require_child(&self, name: &str) -> Result<&Element, XmlError> {
        self.child(name)
            .ok_or_else(|| XmlError::MissingElement(name.to_string()))
    }

    /// Like [`Element::child_text`], but a missing child is an error.
    ///
    /// A present child without text yields the empty string.
    pub fn require_text(&self, name: &str) -> Result<&str, XmlError> {
        Ok(self.require_child(name)?.text().unwrap_or_default())
    }

    /// Attribute value by local name (`type` matches `xsi:type`).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_part(key) == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Element, XmlError> {
        // Text is kept verbatim: leading and trailing spaces of a TextValue
        // are data. Whitespace between child elements is dropped in
        // `finish`.
        let mut reader = Reader::from_str(xml);

        let mut stack: Vec<Element> = Vec::new();
        loop {
            let event = reader
                .read_event()
                .map_err(|e| XmlError::Malformed(format!("at byte {}: {}", reader.buffer_position(), e)))?;
            match event {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| XmlError::Malformed(e.to_string()))?;
                    if let Some(current) = stack.last_mut() {
                        current.text.get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    if let Some(current) = stack.last_mut() {
                        current.text.get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("unbalanced end tag".into()))?
                        .finish();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Eof => {
                    return Err(XmlError::Malformed("unexpected end of document".into()));
                }
                _ => {}
            }
        }
    }

    fn finish(mut self) -> Self {
        if !self.children.is_empty()
            && self.text.as_deref().is_some_and(|t| t.trim().is_empty())
        {
            self.text = None;
        }
        self
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Element, XmlError> {
        let mut element = Element::new(String::from_utf8_lossy(start.local_name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
            let key = attr.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let value = attr
                .unescape_value()
                .map_err(|e| XmlError::Malformed(e.to_string()))?;
            element.attributes.push((
                String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(element)
    }

    /// Serialize this element and its descendants.
    pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.text.is_none() && self.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_error)
    }

    /// Serialize to a standalone string without an XML declaration.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        self.write_to(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn write_error<E: std::fmt::Display>(e: E) -> XmlError {
    XmlError::Write(e.to_string())
}
