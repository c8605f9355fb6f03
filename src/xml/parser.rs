use std::io::{self, Read, Seek, SeekFrom};
use std::ops::{Deref, DerefMut};

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

use super::entities::resolve_entity;
use super::{Attribute, Document, Element, NamespaceDecl, Node, XML_NAMESPACE};

/// How far into the document we look for the XML declaration.
const DECLARATION_SCAN_LIMIT: usize = 512;

/// Maximum element nesting depth. Deeper documents are rejected so that the
/// recursive walks over the tree stay within the stack.
pub const MAX_ELEMENT_DEPTH: usize = 256;

/// Errors that can occur while turning bytes into an element tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The bytes could not be decoded with the attempted encoding.
    #[error("Cannot decode document as {encoding}: {reason}")]
    Encoding { encoding: String, reason: String },

    /// The document is not well-formed XML.
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// Reading from, or rewinding, the source failed.
    #[error("Failed to read document: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    pub fn is_encoding_related(&self) -> bool {
        matches!(self, ParseError::Encoding { .. })
    }
}

// ============================================================================
// Byte Sources
// ============================================================================

/// A replayable stream of document bytes.
///
/// The parser reads the source once, and when decoding fails it rewinds to
/// the mark and reads the same bytes again. When parsing finishes the source
/// is released exactly once: [`ByteSource::abort`] if it reports itself as
/// abortable, [`ByteSource::close`] otherwise.
pub trait ByteSource {
    /// Appends everything from the current position to `buf`.
    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;

    /// Remembers the current position for a later [`ByteSource::reset`].
    fn mark(&mut self) -> io::Result<()>;

    /// Rewinds to the last mark.
    fn reset(&mut self) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn is_abortable(&self) -> bool {
        false
    }

    fn abort(&mut self) {}
}

/// In-memory bytes.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    position: usize,
    mark: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            position: 0,
            mark: 0,
        }
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let remaining = &self.bytes[self.position..];
        buf.extend_from_slice(remaining);
        self.position = self.bytes.len();
        Ok(remaining.len())
    }

    fn mark(&mut self) -> io::Result<()> {
        self.mark = self.position;
        Ok(())
    }

    fn reset(&mut self) -> io::Result<()> {
        self.position = self.mark;
        Ok(())
    }
}

/// Any seekable reader, e.g. a [`std::fs::File`].
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    mark: u64,
}

impl<R: Read + Seek> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, mark: 0 }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        self.inner.read_to_end(buf)
    }

    fn mark(&mut self) -> io::Result<()> {
        self.mark = self.inner.stream_position()?;
        Ok(())
    }

    fn reset(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(self.mark))?;
        Ok(())
    }
}

/// Releases the wrapped source when dropped, on every exit path.
struct Release<'a, S: ByteSource + ?Sized> {
    source: &'a mut S,
}

impl<S: ByteSource + ?Sized> Deref for Release<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.source
    }
}

impl<S: ByteSource + ?Sized> DerefMut for Release<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.source
    }
}

impl<S: ByteSource + ?Sized> Drop for Release<'_, S> {
    fn drop(&mut self) {
        if self.source.is_abortable() {
            self.source.abort();
        } else if let Err(e) = self.source.close() {
            tracing::debug!(error = %e, "Failed to close document source");
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Encoding used for the second attempt when the declared one fails.
    pub fallback_encoding: &'static Encoding,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            fallback_encoding: WINDOWS_1252,
        }
    }
}

impl ParserOptions {
    /// Builds options from an encoding label such as `"windows-1252"`.
    pub fn with_fallback_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(|fallback_encoding| Self {
            fallback_encoding,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentParser {
    options: ParserOptions,
}

impl DocumentParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parses a document from `source`.
    ///
    /// The first attempt decodes with the encoding announced by the BOM or
    /// the XML declaration (UTF-8 if neither is present). If that fails for
    /// an encoding reason, the source is rewound and the same bytes are
    /// decoded with [`ParserOptions::fallback_encoding`]. There is no third
    /// attempt.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Encoding`] when both attempts failed to decode
    /// - [`ParseError::Malformed`] when the XML itself is broken
    /// - [`ParseError::Io`] when the source cannot be read or rewound
    pub fn parse<S: ByteSource + ?Sized>(&self, source: &mut S) -> Result<Document, ParseError> {
        let mut source = Release { source };

        source.mark()?;
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;

        let first = match decode_and_build(&bytes, None) {
            Ok(document) => return Ok(document),
            Err(e) if e.is_encoding_related() => e,
            Err(e) => return Err(e),
        };

        let fallback = self.options.fallback_encoding;
        tracing::debug!(
            error = %first,
            fallback = fallback.name(),
            "Retrying document parse with fallback encoding"
        );

        source.reset()?;
        bytes.clear();
        source.read_to_end(&mut bytes)?;

        decode_and_build(&bytes, Some(fallback)).map_err(|retry| {
            if retry.is_encoding_related() {
                first
            } else {
                retry
            }
        })
    }

    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Document, ParseError> {
        self.parse(&mut SliceSource::new(bytes))
    }

    pub fn parse_str(&self, text: &str) -> Result<Document, ParseError> {
        self.parse_bytes(text.as_bytes())
    }
}

fn decode_and_build(
    bytes: &[u8],
    forced: Option<&'static Encoding>,
) -> Result<Document, ParseError> {
    let (encoding, body) = match forced {
        Some(encoding) => {
            let bom_len = Encoding::for_bom(bytes).map_or(0, |(_, len)| len);
            (encoding, &bytes[bom_len..])
        }
        None => sniff_encoding(bytes)?,
    };

    let text = encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| ParseError::Encoding {
            encoding: encoding.name().to_owned(),
            reason: "malformed byte sequence".to_owned(),
        })?;

    let root = build_tree(&text)?;
    Ok(Document { root, encoding })
}

fn sniff_encoding(bytes: &[u8]) -> Result<(&'static Encoding, &[u8]), ParseError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return Ok((encoding, &bytes[bom_len..]));
    }

    let Some(label) = declared_encoding(bytes) else {
        return Ok((UTF_8, bytes));
    };

    match Encoding::for_label(label.as_bytes()) {
        // An ASCII-readable declaration cannot really be UTF-16
        Some(encoding) if encoding == UTF_16LE || encoding == UTF_16BE => Ok((UTF_8, bytes)),
        Some(encoding) => Ok((encoding, bytes)),
        None => Err(ParseError::Encoding {
            encoding: label,
            reason: "unsupported encoding".to_owned(),
        }),
    }
}

/// Reads the `encoding` pseudo-attribute of the XML declaration, if any.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(DECLARATION_SCAN_LIMIT)];
    let start = head.iter().position(|b| !b.is_ascii_whitespace())?;
    let head = &head[start..];
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = head.windows(2).position(|w| w == b"?>")?;
    let declaration = String::from_utf8_lossy(&head[..end]);

    let after = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let after = after.trim_start().strip_prefix('=')?.trim_start();
    let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &after[1..];
    let close = value.find(quote)?;
    Some(value[..close].trim().to_owned())
}

// ============================================================================
// Tree Building
// ============================================================================

fn build_tree(text: &str) -> Result<Option<Element>, ParseError> {
    let mut reader = NsReader::from_str(text);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let (resolved, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| classify_xml_error(&e.to_string()))?;
        let namespace = namespace_uri(resolved);

        match event {
            Event::Start(start) => {
                if stack.len() >= MAX_ELEMENT_DEPTH {
                    return Err(ParseError::Malformed(format!(
                        "element nesting exceeds maximum of {MAX_ELEMENT_DEPTH} levels"
                    )));
                }
                let element = build_element(&reader, &start, namespace)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = build_element(&reader, &start, namespace)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element)?;
                }
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let raw = lossy(&text);
                    parent.children.push(Node::Text(unescape(&raw)?));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::CData(lossy(&data)));
                }
            }
            Event::Eof => break,
            // Declarations, DOCTYPE, comments and PIs carry nothing we use
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Malformed(format!(
            "unexpected end of document inside <{}>",
            open.qualified_name()
        )));
    }

    Ok(root)
}

fn build_element(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    namespace: Option<String>,
) -> Result<Element, ParseError> {
    let mut element = Element {
        name: lossy(start.local_name().as_ref()),
        prefix: start.name().prefix().map(|p| lossy(p.as_ref())),
        namespace,
        ..Element::default()
    };

    for attr in start.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!(element = %element.name, error = %e, "Skipping malformed attribute");
                continue;
            }
        };

        let key = attr.key.as_ref();
        let value = unescape(&lossy(&attr.value))?;

        if key == b"xmlns" {
            element.declarations.push(NamespaceDecl {
                prefix: None,
                uri: value,
            });
        } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
            element.declarations.push(NamespaceDecl {
                prefix: Some(lossy(prefix)),
                uri: value,
            });
        } else {
            let (resolved, local) = reader.resolve_attribute(attr.key);
            let prefix = attr.key.prefix().map(|p| lossy(p.as_ref()));
            let namespace = if prefix.as_deref() == Some("xml") {
                Some(XML_NAMESPACE.to_owned())
            } else {
                namespace_uri(resolved)
            };
            element.attributes.push(Attribute {
                name: lossy(local.as_ref()),
                prefix,
                namespace,
                value,
            });
        }
    }

    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_some() => {
            return Err(ParseError::Malformed(format!(
                "second root element <{}>",
                element.qualified_name()
            )));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn namespace_uri(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(namespace) => Some(lossy(namespace.as_ref())),
        _ => None,
    }
}

fn unescape(raw: &str) -> Result<String, ParseError> {
    unescape_with(raw, resolve_entity)
        .map(|text| text.into_owned())
        .map_err(|e| ParseError::Malformed(e.to_string()))
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn classify_xml_error(message: &str) -> ParseError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("encoding") || lower.contains("utf-8") || lower.contains("utf8") {
        ParseError::Encoding {
            encoding: UTF_8.name().to_owned(),
            reason: message.to_owned(),
        }
    } else {
        ParseError::Malformed(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wraps a slice source and records how it was used.
    struct CountingSource<'a> {
        inner: SliceSource<'a>,
        abortable: bool,
        reads: usize,
        closes: usize,
        aborts: usize,
    }

    impl<'a> CountingSource<'a> {
        fn new(bytes: &'a [u8]) -> Self {
            Self {
                inner: SliceSource::new(bytes),
                abortable: false,
                reads: 0,
                closes: 0,
                aborts: 0,
            }
        }
    }

    impl ByteSource for CountingSource<'_> {
        fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
            self.reads += 1;
            self.inner.read_to_end(buf)
        }

        fn mark(&mut self) -> io::Result<()> {
            self.inner.mark()
        }

        fn reset(&mut self) -> io::Result<()> {
            self.inner.reset()
        }

        fn close(&mut self) -> io::Result<()> {
            self.closes += 1;
            Ok(())
        }

        fn is_abortable(&self) -> bool {
            self.abortable
        }

        fn abort(&mut self) {
            self.aborts += 1;
        }
    }

    fn parse(text: &str) -> Result<Document, ParseError> {
        DocumentParser::default().parse_str(text)
    }

    #[test]
    fn test_parse_resolves_namespaces() {
        let document = parse(
            r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel><dc:creator>Jane</dc:creator></channel>
</rss>"#,
        )
        .unwrap();

        let root = document.root().unwrap();
        assert_eq!(root.name, "rss");
        assert_eq!(root.namespace, None);
        assert_eq!(root.declarations.len(), 1);

        let creator = root.child("channel").unwrap().child("creator").unwrap();
        assert_eq!(creator.prefix.as_deref(), Some("dc"));
        assert_eq!(
            creator.namespace.as_deref(),
            Some("http://purl.org/dc/elements/1.1/")
        );
        assert_eq!(creator.text().as_deref(), Some("Jane"));
    }

    #[test]
    fn test_default_namespace_applies_to_children() {
        let document = parse(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>T</title></feed>"#,
        )
        .unwrap();
        let title = document.root().unwrap().child("title").unwrap();
        assert_eq!(title.namespace.as_deref(), Some("http://www.w3.org/2005/Atom"));
        assert_eq!(
            document.default_namespace(),
            Some("http://www.w3.org/2005/Atom")
        );
    }

    #[test]
    fn test_xml_prefixed_attribute_gets_xml_namespace() {
        let document = parse(r#"<feed xml:lang="en" xml:base="https://example.com/"/>"#).unwrap();
        let root = document.root().unwrap();
        assert_eq!(root.attribute_ns(XML_NAMESPACE, "lang"), Some("en"));
        assert_eq!(root.attribute("lang"), None);
    }

    #[test]
    fn test_html_entities_resolve_from_bundled_table() {
        let document = parse(
            r#"<!DOCTYPE rss PUBLIC "-//Netscape Communications//DTD RSS 0.91//EN" "http://my.netscape.com/publish/formats/rss-0.91.dtd">
<rss version="0.91"><channel><title>Caf&eacute;&nbsp;&amp;&#32;Bar</title></channel></rss>"#,
        )
        .unwrap();
        let title = document
            .root()
            .unwrap()
            .child("channel")
            .unwrap()
            .child("title")
            .unwrap()
            .raw_text();
        assert_eq!(title, "Café\u{a0}& Bar");
    }

    #[test]
    fn test_declared_entities_are_not_expanded() {
        let result = parse(
            r#"<?xml version="1.0"?>
<!DOCTYPE rss [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<rss><channel><title>&xxe;</title></channel></rss>"#,
        );
        match result {
            Ok(document) => {
                let root = document.root().unwrap();
                let title = root.child("channel").unwrap().raw_text();
                assert!(!title.contains("root:"));
            }
            Err(e) => assert!(matches!(e, ParseError::Malformed(_))),
        }
    }

    #[test]
    fn test_cdata_is_kept_as_node() {
        let document = parse("<item><description><![CDATA[<b>bold</b>]]></description></item>")
            .unwrap();
        let description = document.root().unwrap().child("description").unwrap();
        assert_eq!(
            description.children,
            vec![Node::CData("<b>bold</b>".to_string())]
        );
        assert_eq!(description.text().as_deref(), Some("<b>bold</b>"));
    }

    #[test]
    fn test_empty_document_has_no_root() {
        let document = parse("").unwrap();
        assert!(document.root().is_none());

        let only_declaration = parse("<?xml version=\"1.0\"?>\n").unwrap();
        assert!(only_declaration.root().is_none());
    }

    #[test]
    fn test_unclosed_element_is_malformed() {
        let result = parse("<rss><channel>");
        assert!(matches!(result, Err(ParseError::Malformed(_))));
    }

    fn nested(depth: usize) -> String {
        let mut text = "<channel>".repeat(depth);
        text.push_str(&"</channel>".repeat(depth));
        text
    }

    #[test]
    fn test_nesting_deeper_than_limit_is_rejected() {
        let text = nested(MAX_ELEMENT_DEPTH + 1);
        let mut source = CountingSource::new(text.as_bytes());
        let result = DocumentParser::default().parse(&mut source);

        assert!(matches!(result, Err(ParseError::Malformed(_))));
        assert_eq!(source.reads, 1, "depth errors are not retried");
        assert_eq!(source.closes, 1);

        assert!(parse(&nested(200_000)).is_err());
    }

    #[test]
    fn test_nesting_at_limit_is_accepted() {
        let document = parse(&nested(MAX_ELEMENT_DEPTH)).unwrap();
        assert_eq!(document.root().unwrap().name, "channel");
    }

    #[test]
    fn test_declared_latin1_decodes_on_first_attempt() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><title>Caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"</title>");

        let mut source = CountingSource::new(&bytes);
        let document = DocumentParser::default().parse(&mut source).unwrap();

        assert_eq!(document.root().unwrap().text().as_deref(), Some("Café"));
        assert_eq!(source.reads, 1);
        assert_eq!(source.closes, 1);
    }

    #[test]
    fn test_misdeclared_encoding_falls_back_once() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><title>Caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"</title>");

        let mut source = CountingSource::new(&bytes);
        let document = DocumentParser::default().parse(&mut source).unwrap();

        assert_eq!(document.encoding, WINDOWS_1252);
        assert_eq!(document.root().unwrap().text().as_deref(), Some("Café"));
        assert_eq!(source.reads, 2, "exactly one retry");
        assert_eq!(source.closes, 1);
    }

    #[test]
    fn test_unsupported_encoding_label_falls_back() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"x-no-such-charset\"?><title>ok</title>";
        let mut source = CountingSource::new(bytes);
        let document = DocumentParser::default().parse(&mut source).unwrap();

        assert_eq!(document.root().unwrap().text().as_deref(), Some("ok"));
        assert_eq!(source.reads, 2);
    }

    #[test]
    fn test_retry_parse_failure_surfaces_parse_error() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><title>Caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"</wrong>");

        let mut source = CountingSource::new(&bytes);
        let result = DocumentParser::default().parse(&mut source);

        assert!(matches!(result, Err(ParseError::Malformed(_))));
        assert_eq!(source.reads, 2);
        assert_eq!(source.closes, 1);
    }

    #[test]
    fn test_malformed_document_is_not_retried() {
        let mut source = CountingSource::new(b"<rss><channel></rss>");
        let result = DocumentParser::default().parse(&mut source);

        assert!(matches!(result, Err(ParseError::Malformed(_))));
        assert_eq!(source.reads, 1);
        assert_eq!(source.closes, 1);
    }

    #[test]
    fn test_abortable_source_is_aborted_not_closed() {
        let mut source = CountingSource::new(b"<rss/>");
        source.abortable = true;
        DocumentParser::default().parse(&mut source).unwrap();

        assert_eq!(source.aborts, 1);
        assert_eq!(source.closes, 0);
    }

    #[test]
    fn test_reader_source_replays_from_mark() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><a>".to_vec();
        bytes.push(0xFC);
        bytes.extend_from_slice(b"</a>");

        let mut source = ReaderSource::new(io::Cursor::new(bytes));
        let document = DocumentParser::default().parse(&mut source).unwrap();
        assert_eq!(document.root().unwrap().text().as_deref(), Some("ü"));
    }

    #[test]
    fn test_declared_encoding_extraction() {
        assert_eq!(
            declared_encoding(b"  <?xml version='1.0' encoding = 'koi8-r' ?><a/>").as_deref(),
            Some("koi8-r")
        );
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><a/>"), None);
        assert_eq!(declared_encoding(b"<a/>"), None);
    }

    #[test]
    fn test_fallback_label_options() {
        let options = ParserOptions::with_fallback_label("latin1").unwrap();
        assert_eq!(options.fallback_encoding, WINDOWS_1252);
        assert!(ParserOptions::with_fallback_label("no-such-thing").is_none());
    }
}
