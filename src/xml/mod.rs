//! Generic XML element tree and the document parser that produces it.
//!
//! Every feed format and the OPML state dialect are interpreted from the
//! same [`Document`] representation:
//!
//! - [`parser`] - byte stream to element tree, with encoding fallback
//! - [`entities`] - bundled entity table used instead of external DTDs
//! - [`markup`] - element tree back to markup text (inner XHTML, pretty OPML)

mod entities;
mod markup;
mod parser;

use std::borrow::Cow;

use encoding_rs::Encoding;

pub use markup::{inner_markup, write_document};
pub use parser::{
    ByteSource, DocumentParser, ParseError, ParserOptions, ReaderSource, SliceSource,
    MAX_ELEMENT_DEPTH,
};

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A parsed document. `root` is `None` for documents without any element.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Option<Element>,
    /// Encoding the bytes were successfully decoded with.
    pub encoding: &'static Encoding,
}

impl Document {
    pub fn new(root: Option<Element>) -> Self {
        Self {
            root,
            encoding: encoding_rs::UTF_8,
        }
    }

    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Namespace declared for the empty prefix on the root element, or the
    /// root's own namespace when no default is declared.
    ///
    /// This is not always the root element's own namespace: an RDF document
    /// puts its root in the RDF namespace but declares RSS 1.0 as default.
    pub fn default_namespace(&self) -> Option<&str> {
        let root = self.root.as_ref()?;
        root.declarations
            .iter()
            .find(|decl| decl.prefix.is_none())
            .map(|decl| decl.uri.as_str())
            .or(root.namespace.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
}

/// An `xmlns` or `xmlns:prefix` declaration found on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Local name, without prefix.
    pub name: String,
    pub prefix: Option<String>,
    /// Unprefixed attributes never carry a namespace.
    pub namespace: Option<String>,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            namespace: None,
            value: value.into(),
        }
    }

    pub fn qualified_name(&self) -> Cow<'_, str> {
        qualify(self.prefix.as_deref(), &self.name)
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Local name, without prefix.
    pub name: String,
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    pub declarations: Vec<NamespaceDecl>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates an element bound to `namespace` under `prefix`.
    pub fn namespaced(prefix: &str, namespace: &str, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: Some(prefix.to_owned()),
            namespace: Some(namespace.to_owned()),
            ..Self::default()
        }
    }

    pub fn declare(mut self, prefix: Option<&str>, uri: &str) -> Self {
        self.declarations.push(NamespaceDecl {
            prefix: prefix.map(str::to_owned),
            uri: uri.to_owned(),
        });
        self
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn with_prefixed_attribute(
        mut self,
        prefix: &str,
        namespace: &str,
        name: &str,
        value: impl Into<String>,
    ) -> Self {
        self.attributes.push(Attribute {
            name: name.to_owned(),
            prefix: Some(prefix.to_owned()),
            namespace: Some(namespace.to_owned()),
            value: value.into(),
        });
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn qualified_name(&self) -> Cow<'_, str> {
        qualify(self.prefix.as_deref(), &self.name)
    }

    /// Case-insensitive local name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn lowercase_name(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// First child element with the given local name (case-insensitive).
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.is(name))
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |element| element.is(name))
    }

    /// Value of a namespace-free attribute, matched case-insensitively.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.is_none() && attr.is(name))
            .map(|attr| attr.value.as_str())
    }

    pub fn attribute_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.as_deref() == Some(namespace) && attr.is(name))
            .map(|attr| attr.value.as_str())
    }

    /// Concatenated direct text and CDATA content, untrimmed.
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(text) | Node::CData(text) => out.push_str(text),
                Node::Element(_) => {}
            }
        }
        out
    }

    /// Trimmed direct text; `None` when only whitespace is present.
    pub fn text(&self) -> Option<String> {
        let raw = self.raw_text();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    }

    /// Trimmed text of the first child element with the given name.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).and_then(Element::text)
    }
}

fn qualify<'a>(prefix: Option<&str>, name: &'a str) -> Cow<'a, str> {
    match prefix {
        Some(prefix) => Cow::Owned(format!("{prefix}:{name}")),
        None => Cow::Borrowed(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_trimmed_and_empty_is_none() {
        let element = Element::new("title").with_text("  Hello  ");
        assert_eq!(element.text().as_deref(), Some("Hello"));

        let blank = Element::new("title").with_text(" \n ");
        assert_eq!(blank.text(), None);
    }

    #[test]
    fn test_attribute_lookup_ignores_namespaced_attributes() {
        let element = Element::new("outline")
            .with_prefixed_attribute("rssowl", "http://www.rssowl.org", "id", "7")
            .with_attribute("xmlUrl", "https://example.com/feed");

        assert_eq!(element.attribute("id"), None);
        assert_eq!(element.attribute("xmlurl"), Some("https://example.com/feed"));
        assert_eq!(element.attribute_ns("http://www.rssowl.org", "id"), Some("7"));
    }

    #[test]
    fn test_default_namespace_prefers_declaration() {
        let root = Element::namespaced("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#", "RDF")
            .declare(Some("rdf"), "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
            .declare(None, "http://purl.org/rss/1.0/");
        let document = Document::new(Some(root));
        assert_eq!(document.default_namespace(), Some("http://purl.org/rss/1.0/"));
    }

    #[test]
    fn test_prefixed_root_namespace_is_default() {
        let root = Element::namespaced("atom", "http://www.w3.org/2005/Atom", "feed")
            .declare(Some("atom"), "http://www.w3.org/2005/Atom");
        let document = Document::new(Some(root));
        assert_eq!(document.default_namespace(), Some("http://www.w3.org/2005/Atom"));
        assert_eq!(Document::new(Some(Element::new("rss"))).default_namespace(), None);
    }

    #[test]
    fn test_qualified_name() {
        let element = Element::namespaced("dc", "http://purl.org/dc/elements/1.1/", "creator");
        assert_eq!(element.qualified_name(), "dc:creator");
        assert_eq!(Element::new("item").qualified_name(), "item");
    }
}
