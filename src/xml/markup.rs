use std::io::{self, Write};

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{Element, Node};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Serializes the children of `element` back to markup text.
///
/// Used for rich content (`type="xhtml"`) where the inner markup must be
/// preserved. The wrapping element itself is not included. CDATA content is
/// emitted verbatim and any literal CDATA delimiters are removed, since the
/// result is display text and is never parsed as XML again.
pub fn inner_markup(element: &Element) -> String {
    let mut out = String::new();
    for node in &element.children {
        write_node(node, &mut out);
    }
    out.replace(CDATA_OPEN, "").replace(CDATA_CLOSE, "")
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape(text.as_str())),
        Node::CData(text) => out.push_str(text),
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.qualified_name());
            for attr in &element.attributes {
                out.push(' ');
                out.push_str(&attr.qualified_name());
                out.push_str("=\"");
                out.push_str(&escape(attr.value.as_str()));
                out.push('"');
            }
            if element.children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in &element.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&element.qualified_name());
            out.push('>');
        }
    }
}

/// Writes `root` as a UTF-8 XML document indented by two spaces.
pub fn write_document(root: &Element, out: &mut dyn Write) -> io::Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(io::Error::other)?;
    write_element(&mut writer, root)?;
    writer.into_inner().write_all(b"\n")
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> io::Result<()> {
    let name = element.qualified_name();
    let mut start = BytesStart::new(name.as_ref());

    for decl in &element.declarations {
        let key = match &decl.prefix {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_owned(),
        };
        start.push_attribute((key.as_str(), decl.uri.as_str()));
    }
    for attr in &element.attributes {
        start.push_attribute((attr.qualified_name().as_ref(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(io::Error::other);
    }

    writer
        .write_event(Event::Start(start))
        .map_err(io::Error::other)?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) | Node::CData(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(io::Error::other)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_ref())))
        .map_err(io::Error::other)
}
