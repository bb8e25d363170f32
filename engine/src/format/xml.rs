//! Attribute-keyed XML element trees.
//!
//! The document is held as a small owned tree. Records are the direct
//! children of the root element; everything below a record is carried
//! verbatim, including the whitespace inside non-blank text. Whitespace-only
//! text is dropped on parse and indentation is re-derived on write.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

const INDENT_WIDTH: usize = 4;

/// Why an XML buffer could not be read or written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct XmlError(String);

impl XmlError {
    fn new(reason: impl ToString) -> Self {
        XmlError(reason.to_string())
    }
}

/// One node below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An element with its attributes (in document order) and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Unescaped value of the first attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Order-independent textual form for whole-element equality.
    pub fn canonical(&self) -> String {
        let mut attributes = self.attributes.clone();
        attributes.sort();
        let mut out = format!("<{}", self.name);
        for (key, value) in &attributes {
            out.push_str(&format!(" {key}={value:?}"));
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(element) => out.push_str(&element.canonical()),
                XmlNode::Text(text) | XmlNode::CData(text) => out.push_str(&format!("{text:?}")),
                XmlNode::Comment(_) => {}
            }
        }
        out.push_str(&format!("</{}>", self.name));
        out
    }
}

/// A parsed document: the root element plus comments around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
    pub epilog: Vec<XmlNode>,
}

/// Collects reader events into a tree.
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<XmlElement>,
    prolog: Vec<XmlNode>,
    root: Option<XmlElement>,
    epilog: Vec<XmlNode>,
}

impl TreeBuilder {
    fn open(&mut self, element: XmlElement) -> Result<(), XmlError> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(XmlError::new(format!(
                "second root element <{}>",
                element.name
            )));
        }
        self.stack.push(element);
        Ok(())
    }

    fn close(&mut self) -> Result<(), XmlError> {
        let element = self
            .stack
            .pop()
            .ok_or_else(|| XmlError::new("closing tag without matching opening tag"))?;
        self.push(XmlNode::Element(element))
    }

    fn push(&mut self, node: XmlNode) -> Result<(), XmlError> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        match node {
            XmlNode::Element(element) => {
                if self.root.is_some() {
                    return Err(XmlError::new(format!(
                        "second root element <{}>",
                        element.name
                    )));
                }
                self.root = Some(element);
            }
            XmlNode::Comment(_) if self.root.is_none() => self.prolog.push(node),
            XmlNode::Comment(_) => self.epilog.push(node),
            XmlNode::Text(_) | XmlNode::CData(_) => {
                return Err(XmlError::new("text content outside the root element"));
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<XmlDocument, XmlError> {
        if let Some(open) = self.stack.last() {
            return Err(XmlError::new(format!("unclosed element <{}>", open.name)));
        }
        let root = self
            .root
            .ok_or_else(|| XmlError::new("document has no root element"))?;
        Ok(XmlDocument {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn utf8(bytes: &[u8]) -> Result<String, XmlError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(XmlError::new)
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let mut element = XmlElement::new(utf8(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(XmlError::new)?;
        let key = utf8(attribute.key.as_ref())?;
        let value = attribute.unescape_value().map_err(XmlError::new)?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

impl XmlDocument {
    /// Parse a complete document.
    pub fn parse(bytes: &[u8]) -> Result<Self, XmlError> {
        let text = std::str::from_utf8(bytes).map_err(XmlError::new)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut reader = Reader::from_str(text);
        let mut tree = TreeBuilder::default();

        loop {
            let event = reader.read_event().map_err(|e| {
                XmlError::new(format!("{e} at byte {}", reader.buffer_position()))
            })?;
            match event {
                Event::Start(start) => tree.open(element_from(&start)?)?,
                Event::Empty(start) => tree.push(XmlNode::Element(element_from(&start)?))?,
                Event::End(_) => tree.close()?,
                Event::Text(text) => {
                    let text = text.unescape().map_err(XmlError::new)?;
                    if !text.trim().is_empty() {
                        tree.push(XmlNode::Text(text.into_owned()))?;
                    }
                }
                Event::CData(data) => tree.push(XmlNode::CData(utf8(&data.into_inner())?))?,
                Event::Comment(comment) => {
                    tree.push(XmlNode::Comment(utf8(&comment.into_inner())?))?
                }
                Event::Eof => break,
                // The declaration is rewritten on save; doctype and processing instructions are not kept.
                _ => {}
            }
        }

        tree.finish()
    }

    /// Serialize with an XML declaration, 4-space indentation and a trailing newline.
    pub fn to_bytes(&self) -> Result<Vec<u8>, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(XmlError::new)?;
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        let mut out = writer.into_inner();
        out.push(b'\n');
        Ok(out)
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), XmlError> {
    let event = match node {
        XmlNode::Element(element) => return write_element(writer, element),
        XmlNode::Text(text) => Event::Text(BytesText::from_escaped(partial_escape(text.as_str()))),
        XmlNode::CData(data) => Event::CData(BytesCData::new(data.as_str())),
        XmlNode::Comment(comment) => Event::Comment(BytesText::from_escaped(comment.as_str())),
    };
    writer.write_event(event).map_err(XmlError::new)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(XmlError::new);
    }
    writer
        .write_event(Event::Start(start))
        .map_err(XmlError::new)?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(XmlError::new)
}
