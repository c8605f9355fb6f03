//! Persistent application state and its serialization.
//!
//! The state is a [`StateGraph`]: bookmark folders with their marks
//! (bookmarks, saved searches and news bins), plus labels, news filters and
//! preferences. Importers and exporters are registered per format in the
//! [`Registry`](crate::registry::Registry); the built-in format is the
//! OPML dialect in [`opml`].
//!
//! Imported entities never carry a real identifier. An identifier found in
//! the source document is kept as `old_id` so the store that finally saves
//! the entities can rewrite references between them (see
//! [`MemoryStore::import`](crate::storage::MemoryStore::import)).

mod filter;
mod graph;
pub mod opml;
mod preference;
mod search;

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::InterpretError;
use crate::xml::Document;

pub use filter::{ActionData, FilterAction, SearchFilter};
pub use graph::{Folder, FolderHandle, Label, Mark, MarkHandle, MarkKind, StateGraph, StateRef};
pub use preference::{Preference, PreferenceError, PreferenceScope, PreferenceValue};
pub use search::{
    ConditionError, LocationScope, NewsState, Search, SearchCondition, SearchField,
    SearchSpecifier, SearchValue,
};

/// Builds a state graph from a parsed document.
///
/// Importers are lenient: unreadable entries are skipped and an
/// unrecognized document yields an empty graph.
pub trait StateImporter: Send + Sync {
    fn import_from(&self, document: &Document) -> StateGraph;
}

/// Writes part of a state graph to a destination.
pub trait StateExporter: Send + Sync {
    fn export_to(
        &self,
        out: &mut dyn Write,
        graph: &StateGraph,
        elements: &[StateRef],
        options: &ExportOptions,
    ) -> Result<(), InterpretError>;
}

/// Optional categories an export can include besides the folder tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportOption {
    Labels,
    Filters,
    Preferences,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions(HashSet<ExportOption>);

impl ExportOptions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self::none()
            .with(ExportOption::Labels)
            .with(ExportOption::Filters)
            .with(ExportOption::Preferences)
    }

    pub fn with(mut self, option: ExportOption) -> Self {
        self.0.insert(option);
        self
    }

    pub fn contains(&self, option: ExportOption) -> bool {
        self.0.contains(&option)
    }
}

/// Exports into `path` without ever leaving a partially written file.
///
/// The document goes to a uniquely named sibling file first, which is synced
/// and then renamed over `path`.
pub fn export_to_path(
    exporter: &dyn StateExporter,
    path: &Path,
    graph: &StateGraph,
    elements: &[StateRef],
    options: &ExportOptions,
) -> Result<(), InterpretError> {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{suffix:016x}"));

    let result = (|| -> Result<(), InterpretError> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        exporter.export_to(&mut file, graph, elements, options)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&temp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}
