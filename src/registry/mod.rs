//! Contribution registry: the lookup tables consulted during interpretation.
//!
//! Four independent tables are filled once from a list of
//! [`ContributionProvider`]s and are read-only afterwards:
//!
//! | Table               | Key                                         |
//! |---------------------|---------------------------------------------|
//! | Format interpreters | lowercase root element name                 |
//! | Namespace handlers  | namespace URI (exact)                       |
//! | Element handlers    | (lowercase element name, lowercase root)    |
//! | State importers / exporters | lowercase format name or extension  |
//!
//! # Override policy
//!
//! When two providers register the same key the later one wins, unless both
//! are built-in, in which case the first built-in registration is kept.
//! Third-party contributions can therefore replace built-ins, but built-ins
//! never silently replace each other. See [`replaces`].
//!
//! # Example
//!
//! ```
//! use feedloom::registry::{ContributionProvider, RegistryBuilder};
//!
//! struct NoOpProvider;
//!
//! impl ContributionProvider for NoOpProvider {
//!     fn name(&self) -> &str {
//!         "no-op"
//!     }
//!
//!     fn contribute(&self, _registry: &mut RegistryBuilder) {}
//! }
//!
//! let registry = RegistryBuilder::with_builtins().load(&NoOpProvider).build();
//! assert!(registry.format_interpreter("rss").is_some());
//! ```

mod builtin;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::feed::{ElementHandler, FormatInterpreter, NamespaceHandler};
use crate::state::{StateExporter, StateImporter};

pub use builtin::BuiltinProvider;

/// Where a registration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Builtin,
    ThirdParty,
}

/// Whether an `incoming` registration replaces an `existing` one for the
/// same key.
pub fn replaces(existing: Origin, incoming: Origin) -> bool {
    !(existing == Origin::Builtin && incoming == Origin::Builtin)
}

/// A source of contributions, loaded into a [`RegistryBuilder`] in order.
pub trait ContributionProvider {
    /// Name used in log output.
    fn name(&self) -> &str;

    fn origin(&self) -> Origin {
        Origin::ThirdParty
    }

    fn contribute(&self, registry: &mut RegistryBuilder);
}

struct Entry<T: ?Sized> {
    origin: Origin,
    value: Box<T>,
}

type ElementKey = (String, String);

/// Mutable registry under construction.
pub struct RegistryBuilder {
    origin: Origin,
    interpreters: HashMap<String, Entry<dyn FormatInterpreter>>,
    namespaces: HashMap<String, Entry<dyn NamespaceHandler>>,
    elements: HashMap<ElementKey, Entry<dyn ElementHandler>>,
    importers: HashMap<String, Entry<dyn StateImporter>>,
    exporters: HashMap<String, Entry<dyn StateExporter>>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// An empty builder with no contributions at all.
    pub fn new() -> Self {
        Self {
            origin: Origin::ThirdParty,
            interpreters: HashMap::new(),
            namespaces: HashMap::new(),
            elements: HashMap::new(),
            importers: HashMap::new(),
            exporters: HashMap::new(),
        }
    }

    /// A builder preloaded with every built-in format, handler and state
    /// (de)serializer.
    pub fn with_builtins() -> Self {
        Self::new().load(&BuiltinProvider)
    }

    /// Loads every contribution of `provider`.
    pub fn load(mut self, provider: &dyn ContributionProvider) -> Self {
        tracing::debug!(provider = provider.name(), origin = ?provider.origin(), "Loading contributions");
        self.origin = provider.origin();
        provider.contribute(&mut self);
        self.origin = Origin::ThirdParty;
        self
    }

    pub fn format_interpreter(
        &mut self,
        root: &str,
        interpreter: impl FormatInterpreter + 'static,
    ) -> &mut Self {
        let entry = Entry {
            origin: self.origin,
            value: Box::new(interpreter) as Box<dyn FormatInterpreter>,
        };
        register(&mut self.interpreters, root.to_ascii_lowercase(), entry, "format interpreter");
        self
    }

    pub fn namespace_handler(
        &mut self,
        namespace: &str,
        handler: impl NamespaceHandler + 'static,
    ) -> &mut Self {
        let entry = Entry {
            origin: self.origin,
            value: Box::new(handler) as Box<dyn NamespaceHandler>,
        };
        register(&mut self.namespaces, namespace.to_owned(), entry, "namespace handler");
        self
    }

    pub fn element_handler(
        &mut self,
        element: &str,
        root: &str,
        handler: impl ElementHandler + 'static,
    ) -> &mut Self {
        let entry = Entry {
            origin: self.origin,
            value: Box::new(handler) as Box<dyn ElementHandler>,
        };
        let key = (element.to_ascii_lowercase(), root.to_ascii_lowercase());
        register(&mut self.elements, key, entry, "element handler");
        self
    }

    pub fn state_importer(
        &mut self,
        format: &str,
        importer: impl StateImporter + 'static,
    ) -> &mut Self {
        let entry = Entry {
            origin: self.origin,
            value: Box::new(importer) as Box<dyn StateImporter>,
        };
        register(&mut self.importers, state_key(format), entry, "state importer");
        self
    }

    pub fn state_exporter(
        &mut self,
        format: &str,
        exporter: impl StateExporter + 'static,
    ) -> &mut Self {
        let entry = Entry {
            origin: self.origin,
            value: Box::new(exporter) as Box<dyn StateExporter>,
        };
        register(&mut self.exporters, state_key(format), entry, "state exporter");
        self
    }

    pub fn build(self) -> Registry {
        fn unwrap_entries<K: Eq + Hash, T: ?Sized>(
            table: HashMap<K, Entry<T>>,
        ) -> HashMap<K, Box<T>> {
            table.into_iter().map(|(k, e)| (k, e.value)).collect()
        }

        Registry {
            interpreters: unwrap_entries(self.interpreters),
            namespaces: unwrap_entries(self.namespaces),
            elements: unwrap_entries(self.elements),
            importers: unwrap_entries(self.importers),
            exporters: unwrap_entries(self.exporters),
        }
    }
}

fn register<K, T>(table: &mut HashMap<K, Entry<T>>, key: K, entry: Entry<T>, kind: &str)
where
    K: Eq + Hash + std::fmt::Debug,
    T: ?Sized,
{
    if let Some(existing) = table.get(&key) {
        if !replaces(existing.origin, entry.origin) {
            tracing::debug!(kind, key = ?key, "Keeping first built-in registration");
            return;
        }
        tracing::debug!(kind, key = ?key, origin = ?entry.origin, "Overriding registration");
    }
    table.insert(key, entry);
}

/// Format names and file extensions share one key space; `".OPML"` and
/// `"opml"` are the same key.
fn state_key(format: &str) -> String {
    format.trim_start_matches('.').to_ascii_lowercase()
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable lookup tables, safe to share across threads.
pub struct Registry {
    interpreters: HashMap<String, Box<dyn FormatInterpreter>>,
    namespaces: HashMap<String, Box<dyn NamespaceHandler>>,
    elements: HashMap<ElementKey, Box<dyn ElementHandler>>,
    importers: HashMap<String, Box<dyn StateImporter>>,
    exporters: HashMap<String, Box<dyn StateExporter>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("interpreters", &self.interpreters.keys().collect::<Vec<_>>())
            .field("namespaces", &self.namespaces.keys().collect::<Vec<_>>())
            .field("elements", &self.elements.keys().collect::<Vec<_>>())
            .field("importers", &self.importers.keys().collect::<Vec<_>>())
            .field("exporters", &self.exporters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// The built-in registry, shared.
    pub fn builtin() -> Arc<Registry> {
        Arc::new(RegistryBuilder::with_builtins().build())
    }

    pub fn format_interpreter(&self, root: &str) -> Option<&dyn FormatInterpreter> {
        self.interpreters
            .get(&root.to_ascii_lowercase())
            .map(|value| value.as_ref())
    }

    pub fn namespace_handler(&self, namespace: &str) -> Option<&dyn NamespaceHandler> {
        self.namespaces.get(namespace).map(|value| value.as_ref())
    }

    pub fn element_handler(&self, element: &str, root: &str) -> Option<&dyn ElementHandler> {
        let key = (element.to_ascii_lowercase(), root.to_ascii_lowercase());
        self.elements.get(&key).map(|value| value.as_ref())
    }

    pub fn state_importer(&self, format: &str) -> Option<&dyn StateImporter> {
        self.importers.get(&state_key(format)).map(|value| value.as_ref())
    }

    pub fn state_exporter(&self, format: &str) -> Option<&dyn StateExporter> {
        self.exporters.get(&state_key(format)).map(|value| value.as_ref())
    }
}
