//! Feed interpretation: from a parsed [`Document`] to a normalized [`Feed`].
//!
//! This module provides the dispatch machinery and the built-in formats:
//!
//! - **Dispatch**: pick the interpreter registered for the root element
//! - **Formats**: RSS 0.9x/2.0, Atom, RDF (RSS 0.90/1.0), CDF, OPML, Bugzilla
//! - **Overrides**: namespace and element handlers consulted at every node
//!
//! # Architecture
//!
//! - [`context`] - per-call [`InterpretContext`] with the news clock
//! - [`namespaces`] - built-in namespace handlers (Dublin Core, Media RSS, ...)
//! - one module per format interpreter
//!
//! Interpreters and handlers hold no state of their own. Everything that
//! changes during a walk lives in the context, so one [`Registry`] can serve
//! any number of concurrent interpretations.
//!
//! # Example
//!
//! ```
//! use feedloom::feed::Dispatcher;
//! use feedloom::xml::DocumentParser;
//!
//! let document = DocumentParser::default()
//!     .parse_str(r#"<rss version="2.0"><channel><item><title>A</title></item></channel></rss>"#)
//!     .unwrap();
//! let feed = Dispatcher::builtin().interpret(&document).unwrap();
//! assert_eq!(feed.format.as_deref(), Some("RSS 2.0"));
//! assert_eq!(feed.news.len(), 1);
//! ```

mod atom;
mod bugzilla;
mod cdf;
mod common;
mod context;
pub mod namespaces;
mod opml;
mod rdf;
mod rss;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::InterpretError;
use crate::model::{Feed, Target};
use crate::registry::Registry;
use crate::xml::{Attribute, ByteSource, Document, DocumentParser, Element};

pub use atom::AtomInterpreter;
pub use bugzilla::BugzillaInterpreter;
pub use cdf::CdfInterpreter;
pub use context::{InterpretContext, NewsClock, Visit};
pub use opml::OpmlInterpreter;
pub(crate) use opml::MAX_OUTLINE_DEPTH;
pub use rdf::RdfInterpreter;
pub use rss::RssInterpreter;

// ============================================================================
// Contribution Contracts
// ============================================================================

/// Walks one syndication format's element tree into a [`Feed`].
pub trait FormatInterpreter: Send + Sync {
    fn interpret(
        &self,
        document: &Document,
        feed: &mut Feed,
        ctx: &mut InterpretContext<'_>,
    ) -> Result<(), InterpretError>;
}

/// Override selected by the namespace URI of an element or attribute.
pub trait NamespaceHandler: Send + Sync {
    fn process_element(&self, element: &Element, target: Target<'_>, ctx: &mut InterpretContext<'_>);

    fn process_attribute(
        &self,
        _attribute: &Attribute,
        _target: Target<'_>,
        _ctx: &mut InterpretContext<'_>,
    ) {
    }
}

/// Override selected by (element name, root element name). Takes priority
/// over namespace handlers and the built-in rules.
pub trait ElementHandler: Send + Sync {
    fn process(&self, element: &Element, target: Target<'_>, ctx: &mut InterpretContext<'_>);
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes a document to the interpreter registered for its root element.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Dispatcher over the built-in registry.
    pub fn builtin() -> Self {
        Self::new(Registry::builtin())
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Interprets `document` into a fresh [`Feed`].
    ///
    /// # Errors
    ///
    /// - [`InterpretError::NoRootElement`] for an empty document
    /// - [`InterpretError::UnknownFormat`] when no interpreter is registered
    ///   for the root element, carrying its lowercase name
    pub fn interpret(&self, document: &Document) -> Result<Feed, InterpretError> {
        let mut feed = Feed::new();
        self.interpret_into(document, &mut feed, Utc::now())?;
        Ok(feed)
    }

    /// Interprets `document` into `feed`, stamping news relative to `now`.
    pub fn interpret_into(
        &self,
        document: &Document,
        feed: &mut Feed,
        now: DateTime<Utc>,
    ) -> Result<(), InterpretError> {
        let root = document.root().ok_or(InterpretError::NoRootElement)?;
        let format = root.lowercase_name();
        let interpreter = self
            .registry
            .format_interpreter(&format)
            .ok_or_else(|| InterpretError::UnknownFormat(format.clone()))?;

        let mut ctx = InterpretContext::new(&self.registry, document, now);
        interpreter.interpret(document, feed, &mut ctx)?;

        tracing::debug!(
            root = %format,
            format = feed.format.as_deref().unwrap_or_default(),
            news = feed.news.len(),
            "Interpreted feed"
        );
        Ok(())
    }

    /// Parses `source` with `parser` and interprets the result.
    ///
    /// The source is released by the parser whatever the outcome.
    pub fn interpret_source<S: ByteSource + ?Sized>(
        &self,
        parser: &DocumentParser,
        source: &mut S,
    ) -> Result<Feed, InterpretError> {
        let document = parser.parse(source)?;
        self.interpret(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::DocumentParser;

    fn parse(text: &str) -> Document {
        DocumentParser::default().parse_str(text).unwrap()
    }

    #[test]
    fn test_unknown_root_is_unknown_format() {
        let err = Dispatcher::builtin().interpret(&parse("<foo/>")).unwrap_err();
        assert!(matches!(err, InterpretError::UnknownFormat(ref name) if name == "foo"));
    }

    #[test]
    fn test_empty_document_has_no_root() {
        let err = Dispatcher::builtin()
            .interpret(&Document::new(None))
            .unwrap_err();
        assert!(matches!(err, InterpretError::NoRootElement));
    }

    #[test]
    fn test_root_name_is_matched_case_insensitively() {
        let feed = Dispatcher::builtin()
            .interpret(&parse(r#"<RSS version="0.91"><channel/></RSS>"#))
            .unwrap();
        assert_eq!(feed.format.as_deref(), Some("RSS 0.91"));
    }
}
