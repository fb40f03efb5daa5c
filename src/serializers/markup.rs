//! Namespace-aware element tree used by the XML serializers
//!
//! A `MarkupNode` is a plain owned tree: cloning a node copies its whole
//! subtree, which is what the LOM converter relies on when it stamps out one
//! element per sequence item from a template node.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::SerializerError;

/// Namespace bound to the `xml:` prefix by definition
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace of the XML-Schema-instance attributes (`xsi:schemaLocation`)
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Prefix to namespace-uri bindings declared on a root element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap(Vec<(String, String)>);

impl NamespaceMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a binding, keeping declaration order
    pub fn bind(mut self, prefix: &str, uri: &str) -> Self {
        self.0.push((prefix.to_string(), uri.to_string()));
        self
    }

    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        if uri == XML_NAMESPACE {
            return Some("xml");
        }
        self.0
            .iter()
            .find(|(_, bound)| bound == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    fn qualify(&self, namespace: Option<&str>, local: &str) -> String {
        match namespace.and_then(|ns| self.prefix_for(ns)) {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
            _ => local.to_string(),
        }
    }
}

/// Namespace-qualified attribute of a markup node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

/// Element of an output tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupNode {
    tag: String,
    namespace: Option<String>,
    attributes: Vec<MarkupAttribute>,
    children: Vec<MarkupNode>,
    text: Option<String>,
    nsmap: NamespaceMap,
}

impl MarkupNode {
    /// Create an empty element
    pub fn new(namespace: Option<&str>, tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
            nsmap: NamespaceMap::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn nsmap(&self) -> &NamespaceMap {
        &self.nsmap
    }

    pub fn set_nsmap(&mut self, nsmap: NamespaceMap) {
        self.nsmap = nsmap;
    }

    /// Set an attribute, replacing an existing one with the same qualified name
    pub fn set_attribute(&mut self, namespace: Option<&str>, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.namespace.as_deref() == namespace && a.name == name)
        {
            existing.value = value;
            return;
        }
        self.attributes.push(MarkupAttribute {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            value,
        });
    }

    pub fn with_attribute(
        mut self,
        namespace: Option<&str>,
        name: &str,
        value: impl Into<String>,
    ) -> Self {
        self.set_attribute(namespace, name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    pub fn attribute(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == namespace && a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn attributes(&self) -> &[MarkupAttribute] {
        &self.attributes
    }

    /// `xml:lang` of this node, if any
    pub fn lang(&self) -> Option<&str> {
        self.attribute(Some(XML_NAMESPACE), "lang")
    }

    pub fn append(&mut self, child: MarkupNode) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[MarkupNode] {
        &self.children
    }

    /// First child with the given tag
    pub fn child(&self, tag: &str) -> Option<&MarkupNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a MarkupNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Follow a path of child tags, taking the first match at every step
    pub fn find_path(&self, path: &[&str]) -> Option<&MarkupNode> {
        path.iter().try_fold(self, |node, tag| node.child(tag))
    }

    /// Number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MarkupNode::node_count).sum::<usize>()
    }
}

/// Builds nodes in one namespace, the way a namespaced element maker does
#[derive(Debug, Clone)]
pub struct ElementFactory {
    namespace: String,
    nsmap: NamespaceMap,
}

impl ElementFactory {
    pub fn new(namespace: &str, nsmap: NamespaceMap) -> Self {
        Self {
            namespace: namespace.to_string(),
            nsmap,
        }
    }

    pub fn element(&self, tag: &str) -> MarkupNode {
        MarkupNode::new(Some(&self.namespace), tag)
    }

    /// Root element carrying the namespace declarations
    pub fn root(&self, tag: &str) -> MarkupNode {
        let mut node = self.element(tag);
        node.set_nsmap(self.nsmap.clone());
        node
    }
}

/// Whether `name` is a valid XML local name (NCName: no colon, no leading digit)
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// Whether every character of `text` may appear in an XML 1.0 document
pub fn is_xml_text(text: &str) -> bool {
    text.chars().all(|c| {
        matches!(c, '\t' | '\n' | '\r')
            || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
    })
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | '_'
        | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

pub(crate) fn check_name(name: &str) -> Result<(), SerializerError> {
    if is_xml_name(name) {
        Ok(())
    } else {
        Err(SerializerError::InvalidName {
            name: name.to_string(),
        })
    }
}

pub(crate) fn check_text(tag: &str, text: &str) -> Result<(), SerializerError> {
    if is_xml_text(text) {
        Ok(())
    } else {
        Err(SerializerError::InvalidText {
            tag: tag.to_string(),
        })
    }
}

/// Write `root` as an XML document with declaration
///
/// Prefixes come from the root's namespace map. Names and text are checked
/// before writing, so a tree that cannot form a well-formed document fails
/// with `InvalidName` or `InvalidText`.
pub fn to_xml_string(root: &MarkupNode, indent: bool) -> Result<String, SerializerError> {
    let mut writer = if indent {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| SerializerError::Xml(e.to_string()))?;

    write_node(&mut writer, root, root.nsmap(), true)?;

    String::from_utf8(writer.into_inner()).map_err(|e| SerializerError::Xml(e.to_string()))
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    node: &MarkupNode,
    nsmap: &NamespaceMap,
    is_root: bool,
) -> Result<(), SerializerError> {
    check_name(node.tag())?;
    let name = nsmap.qualify(node.namespace(), node.tag());
    let mut start = BytesStart::new(name.clone());

    if is_root {
        for (prefix, uri) in nsmap.iter() {
            let decl = if prefix.is_empty() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{}", prefix)
            };
            start.push_attribute((decl.as_str(), uri));
        }
    }
    for attr in node.attributes() {
        check_name(&attr.name)?;
        check_text(node.tag(), &attr.value)?;
        let qualified = nsmap.qualify(attr.namespace.as_deref(), &attr.name);
        start.push_attribute((qualified.as_str(), attr.value.as_str()));
    }

    if node.text().is_none() && node.children().is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| SerializerError::Xml(e.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| SerializerError::Xml(e.to_string()))?;
    if let Some(text) = node.text() {
        check_text(node.tag(), text)?;
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| SerializerError::Xml(e.to_string()))?;
    }
    for child in node.children() {
        write_node(writer, child, nsmap, false)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| SerializerError::Xml(e.to_string()))
}
