use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::model::Target;
use crate::registry::Registry;
use crate::util::to_uri;
use crate::xml::{Attribute, Document, Element, XML_NAMESPACE};

/// Outcome of offering a node to the registry before the built-in rules run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// An element or namespace handler consumed the node.
    HandledByOverride,
    /// No handler is registered; apply the built-in rule.
    UseBuiltin,
}

impl Visit {
    pub fn is_handled(self) -> bool {
        self == Visit::HandledByOverride
    }
}

/// Synthetic received-date generator.
///
/// Every call to [`NewsClock::next`] returns a timestamp one millisecond
/// older than the previous one, so sorting news newest-first reproduces
/// document order even when items carry no date of their own.
#[derive(Debug, Clone)]
pub struct NewsClock {
    now: DateTime<Utc>,
    counter: i64,
}

impl NewsClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now, counter: 0 }
    }

    pub fn next(&mut self) -> DateTime<Utc> {
        let stamp = self.now - Duration::milliseconds(self.counter);
        self.counter += 1;
        stamp
    }
}

/// Per-call state threaded through one interpretation.
///
/// Created by the dispatcher for every document, so interpreters and
/// handlers stay stateless and can be shared between threads.
pub struct InterpretContext<'r> {
    registry: &'r Registry,
    default_namespace: Option<String>,
    root: String,
    clock: NewsClock,
    bases: Vec<Option<Url>>,
    /// Feed homepage, the base for relative links outside any `xml:base`.
    homepage: Option<Url>,
}

impl<'r> InterpretContext<'r> {
    pub fn new(registry: &'r Registry, document: &Document, now: DateTime<Utc>) -> Self {
        Self {
            registry,
            default_namespace: document.default_namespace().map(str::to_owned),
            root: document
                .root()
                .map(Element::lowercase_name)
                .unwrap_or_default(),
            clock: NewsClock::new(now),
            bases: Vec::new(),
            homepage: None,
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Lowercase name of the document's root element.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Received-date for the next news item created in this document.
    pub fn next_received_date(&mut self) -> DateTime<Utc> {
        self.clock.next()
    }

    /// Innermost `xml:base` in effect.
    pub fn base(&self) -> Option<&Url> {
        self.bases.last().and_then(Option::as_ref)
    }

    /// Records the feed homepage as the fallback base. The first absolute
    /// homepage wins; later calls are ignored.
    pub fn set_homepage(&mut self, homepage: Option<Url>) {
        if self.homepage.is_none() {
            self.homepage = homepage.filter(|url| !url.cannot_be_a_base());
        }
    }

    /// Resolves `text` against the innermost `xml:base`, or against the feed
    /// homepage when none is in scope.
    pub fn resolve(&self, text: &str) -> Option<Url> {
        to_uri(text, self.base().or(self.homepage.as_ref()))
    }

    /// Runs `f` with the `xml:base` of `element` (if any) in effect.
    pub fn scoped<R>(&mut self, element: &Element, f: impl FnOnce(&mut Self) -> R) -> R {
        let base = match element.attribute_ns(XML_NAMESPACE, "base") {
            Some(value) => self.resolve(value).or_else(|| self.base().cloned()),
            None => self.base().cloned(),
        };
        self.bases.push(base);
        let result = f(self);
        self.bases.pop();
        result
    }

    /// Offers `element` to the registered handlers.
    ///
    /// Elements in the document's default namespace go to the element
    /// handler keyed by (name, root). Elements in any other namespace go to
    /// the namespace handler for that URI. Unqualified elements in a
    /// document without a default namespace count as default-namespace
    /// elements.
    pub fn visit_element(&mut self, element: &Element, target: Target<'_>) -> Visit {
        let registry = self.registry;
        let namespace = element.namespace.as_deref();

        if namespace == self.default_namespace.as_deref() {
            if let Some(handler) = registry.element_handler(&element.name, &self.root) {
                tracing::trace!(element = %element.name, root = %self.root, "Element handler");
                handler.process(element, target, self);
                return Visit::HandledByOverride;
            }
        } else if let Some(handler) = namespace.and_then(|ns| registry.namespace_handler(ns)) {
            handler.process_element(element, target, self);
            return Visit::HandledByOverride;
        }

        Visit::UseBuiltin
    }

    /// Offers a namespaced attribute to its namespace handler.
    ///
    /// Unprefixed attributes carry no namespace and always use the built-in
    /// rule.
    pub fn visit_attribute(&mut self, attribute: &Attribute, target: Target<'_>) -> Visit {
        let registry = self.registry;
        let Some(namespace) = attribute.namespace.as_deref() else {
            return Visit::UseBuiltin;
        };
        if Some(namespace) == self.default_namespace.as_deref() {
            return Visit::UseBuiltin;
        }
        match registry.namespace_handler(namespace) {
            Some(handler) => {
                handler.process_attribute(attribute, target, self);
                Visit::HandledByOverride
            }
            None => Visit::UseBuiltin,
        }
    }

    /// Offers every attribute of `element`; none of them has a built-in rule.
    pub fn visit_attributes(&mut self, element: &Element, mut target: Target<'_>) {
        for attribute in &element.attributes {
            self.visit_attribute(attribute, target.reborrow());
        }
    }
}
