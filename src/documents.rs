//! XML document tree
//!
//! This module provides the generic DOM marshallers operate on: elements
//! with namespace-qualified names, ordered attributes and ordered child
//! nodes. Documents are parsed with `roxmltree` and written with
//! `quick-xml`.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceScope, QName, XML_NAMESPACE};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// A node of the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An element
    Element(Element),
    /// Character data (CDATA sections are folded into text)
    Text(String),
    /// A comment
    Comment(String),
}

impl Node {
    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// The element, if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// The element, consuming the node
    pub fn into_element(self) -> Option<Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Short description used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Element(_) => "element",
            Node::Text(_) => "text",
            Node::Comment(_) => "comment",
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element qualified name
    pub name: QName,
    /// Prefix the element is written with (None for the default namespace)
    pub prefix: Option<String>,
    /// Attributes by their prefixed name, in document order
    attributes: IndexMap<String, String>,
    /// Namespace declarations to write on this element, prefix ("" for default) to URI
    declarations: IndexMap<String, String>,
    /// Child nodes
    pub children: Vec<Node>,
}

impl Element {
    /// Create a new element
    pub fn new(name: QName) -> Self {
        Self {
            name,
            prefix: None,
            attributes: IndexMap::new(),
            declarations: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Create an element in a namespace
    pub fn namespaced(namespace: &str, local_name: &str) -> Self {
        Self::new(QName::namespaced(namespace, local_name))
    }

    /// Set the prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Add a child node
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.append_child(child);
        self
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.name.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }

    /// Name as written, `prefix:local` or `local`
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.name.local_name),
            None => self.name.local_name.clone(),
        }
    }

    /// Get an attribute value by its prefixed name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Whether the attribute is present
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Declare a namespace prefix on this element (None for the default namespace)
    pub fn declare_namespace(&mut self, prefix: Option<&str>, uri: impl Into<String>) {
        self.declarations
            .insert(prefix.unwrap_or("").to_string(), uri.into());
    }

    /// Add a child node
    pub fn append_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Child elements, skipping text and comments
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Concatenated text of the direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Parse a standalone element
    pub fn parse(xml: &str) -> Result<Element> {
        Ok(Document::parse(xml)?.root)
    }

    /// Serialize this element without an XML declaration
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self, &NamespaceScope::new())?;
        into_string(writer)
    }
}

/// XML Document representation
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Root element of the document
    pub root: Element,
}

impl Document {
    /// Create a document around a root element
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse an XML document from a string with default limits
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from a string
    pub fn parse_with_limits(xml: &str, limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| Error::Xml(format!("Error parsing XML: {}", e)))?;

        let root = convert_element(doc.root_element(), limits, 1)?;
        Ok(Self { root })
    }

    /// Serialize with an XML declaration
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        write_element(&mut writer, &self.root, &NamespaceScope::new())?;
        into_string(writer)
    }
}

fn convert_element(node: roxmltree::Node<'_, '_>, limits: &Limits, depth: usize) -> Result<Element> {
    limits.check_xml_depth(depth)?;

    let tag = node.tag_name();
    let mut element = match tag.namespace() {
        Some(ns) => {
            let mut e = Element::namespaced(ns, tag.name());
            e.prefix = node.lookup_prefix(ns).map(str::to_string);
            e
        }
        None => Element::new(QName::local(tag.name())),
    };

    let mut count = 0;
    for attr in node.attributes() {
        count += 1;
        let name = match attr.namespace() {
            Some(XML_NAMESPACE) => format!("xml:{}", attr.name()),
            Some(ns) => match node.lookup_prefix(ns) {
                Some(prefix) => {
                    element.declare_namespace(Some(prefix), ns);
                    format!("{}:{}", prefix, attr.name())
                }
                None => attr.name().to_string(),
            },
            None => attr.name().to_string(),
        };
        element.set_attribute(name, attr.value());
    }
    limits.check_attributes(count)?;

    for child in node.children() {
        if child.is_element() {
            element.append_child(convert_element(child, limits, depth + 1)?);
        } else if child.is_text() {
            if let Some(text) = child.text() {
                match element.children.last_mut() {
                    Some(Node::Text(previous)) => previous.push_str(text),
                    _ => element.append_child(Node::Text(text.to_string())),
                }
            }
        } else if child.is_comment() {
            if let Some(text) = child.text() {
                element.append_child(Node::Comment(text.to_string()));
            }
        }
    }

    Ok(element)
}

fn xml_error(e: quick_xml::Error) -> Error {
    Error::Xml(format!("Error writing XML: {}", e))
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::Xml(format!("Invalid UTF-8 in output: {}", e)))
}

fn xmlns_attribute(prefix: Option<&str>) -> String {
    match prefix {
        Some(p) => format!("xmlns:{}", p),
        None => "xmlns".to_string(),
    }
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
    parent_scope: &NamespaceScope,
) -> Result<()> {
    let mut scope = parent_scope.clone();
    let mut declarations: Vec<(String, String)> = Vec::new();
    let prefix = element.prefix.as_deref();

    match element.namespace() {
        Some(ns) => {
            if !scope.is_bound(prefix, ns) {
                declarations.push((xmlns_attribute(prefix), ns.to_string()));
                scope.bind(prefix, ns);
            }
        }
        None => {
            // Undeclare an inherited default namespace
            if prefix.is_none() && scope.lookup(None).map_or(false, |uri| !uri.is_empty()) {
                declarations.push(("xmlns".to_string(), String::new()));
                scope.bind(None, "");
            }
        }
    }

    for (p, uri) in &element.declarations {
        let p = if p.is_empty() { None } else { Some(p.as_str()) };
        if !scope.is_bound(p, uri) {
            declarations.push((xmlns_attribute(p), uri.clone()));
            scope.bind(p, uri.as_str());
        }
    }

    let name = element.qualified_name();
    let mut start = BytesStart::new(name.as_str());
    for (key, value) in &declarations {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    for (key, value) in element.attributes() {
        start.push_attribute((key, value));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e, &scope)?,
            Node::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(xml_error)?,
            Node::Comment(c) => writer
                .write_event(Event::Comment(BytesText::from_escaped(c.as_str())))
                .map_err(xml_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(xml_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::{MATHML_NAMESPACE, QTI_V2P1_NAMESPACE};

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let root = Element::parse(xml).unwrap();

        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children.len(), 1);
        let child = root.child_elements().next().unwrap();
        assert_eq!(child.local_name(), "child");
        assert_eq!(child.text(), "text");
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<root attr1="value1" xml:lang="en"><child/></root>"#;
        let root = Element::parse(xml).unwrap();

        assert_eq!(root.attribute("attr1"), Some("value1"));
        assert_eq!(root.attribute("xml:lang"), Some("en"));
        assert!(!root.has_attribute("attr2"));
    }

    #[test]
    fn test_parse_with_namespaces() {
        let xml = r#"<prompt xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1"
            xmlns:m="http://www.w3.org/1998/Math/MathML"><m:math><m:mi>x</m:mi></m:math></prompt>"#;
        let root = Element::parse(xml).unwrap();

        assert_eq!(root.namespace(), Some(QTI_V2P1_NAMESPACE));
        assert_eq!(root.prefix, None);
        let math = root.child_elements().next().unwrap();
        assert_eq!(math.namespace(), Some(MATHML_NAMESPACE));
        assert_eq!(math.prefix.as_deref(), Some("m"));
        assert_eq!(math.qualified_name(), "m:math");
    }

    #[test]
    fn test_cdata_folded_into_text() {
        let root = Element::parse("<value>a<![CDATA[<b>]]>c</value>").unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.text(), "a<b>c");
    }

    #[test]
    fn test_write_declares_namespaces_once() {
        let child = Element::namespaced(QTI_V2P1_NAMESPACE, "baseValue")
            .with_attribute("baseType", "integer")
            .with_child(Node::text("1 < 2"));
        let root = Element::namespaced(QTI_V2P1_NAMESPACE, "sum").with_child(child);

        let xml = root.to_xml_string().unwrap();
        assert_eq!(
            xml,
            r#"<sum xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1"><baseValue baseType="integer">1 &lt; 2</baseValue></sum>"#
        );
    }

    #[test]
    fn test_write_prefixed_foreign_element() {
        let math = Element::namespaced(MATHML_NAMESPACE, "math")
            .with_prefix("m")
            .with_child(Element::namespaced(MATHML_NAMESPACE, "mi").with_prefix("m").with_child(Node::text("x")));
        let root = Element::namespaced(QTI_V2P1_NAMESPACE, "p").with_child(math);

        let xml = root.to_xml_string().unwrap();
        assert!(xml.contains(r#"<m:math xmlns:m="http://www.w3.org/1998/Math/MathML"><m:mi>x</m:mi></m:math>"#));
    }

    #[test]
    fn test_reparse_written_tree() {
        let xml = r#"<div xmlns="http://www.imsglobal.org/xsd/imsqti_v2p1" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="a b">Some <em>text</em><!-- note --></div>"#;
        let root = Element::parse(xml).unwrap();
        let written = root.to_xml_string().unwrap();
        assert_eq!(Element::parse(&written).unwrap(), root);
        assert_eq!(root.attribute("xsi:schemaLocation"), Some("a b"));
    }

    #[test]
    fn test_depth_limit() {
        let mut limits = Limits::default();
        limits.max_xml_depth = 2;
        let result = Document::parse_with_limits("<a><b><c/></b></a>", &limits);
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_malformed_xml() {
        let result = Document::parse("<a><b></a>");
        assert!(matches!(result, Err(Error::Xml(_))));
    }

    #[test]
    fn test_document_declaration() {
        let doc = Document::new(Element::new(QName::local("x")));
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.ends_with("<x/>"));
    }
}
