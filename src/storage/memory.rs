use std::collections::HashMap;

use crate::state::{
    ActionData, FilterAction, FolderHandle, Label, MarkHandle, MarkKind, Preference, Search,
    SearchFilter, SearchValue, StateGraph, StateRef,
};

/// Counts of what one [`MemoryStore::import`] call saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub folders: usize,
    pub marks: usize,
    pub labels: usize,
    pub filters: usize,
    pub preferences: usize,
    /// References to folders, marks or labels that did not come with the
    /// import and were removed from conditions and actions.
    pub dropped_references: usize,
}

/// Old identifiers of imported entities mapped to the ones assigned on save.
#[derive(Debug, Default)]
struct IdMap {
    folders: HashMap<i64, i64>,
    bookmarks: HashMap<i64, i64>,
    search_marks: HashMap<i64, i64>,
    news_bins: HashMap<i64, i64>,
    labels: HashMap<i64, i64>,
}

/// In-memory state store that assigns identifiers on save.
#[derive(Debug)]
pub struct MemoryStore {
    graph: StateGraph,
    next_id: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            graph: StateGraph::new(),
            next_id: 1,
        }
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_root(&mut self, name: &str) -> FolderHandle {
        let id = self.next_id();
        let root = self.graph.add_root(name);
        self.graph.folder_mut(root).id = Some(id);
        root
    }

    pub fn add_folder(&mut self, parent: FolderHandle, name: &str) -> FolderHandle {
        let id = self.next_id();
        let folder = self.graph.add_folder(parent, name);
        self.graph.folder_mut(folder).id = Some(id);
        folder
    }

    pub fn add_mark(&mut self, parent: FolderHandle, name: &str, kind: MarkKind) -> MarkHandle {
        let id = self.next_id();
        let mark = self.graph.add_mark(parent, name, kind);
        self.graph.mark_mut(mark).id = Some(id);
        mark
    }

    pub fn add_label(&mut self, mut label: Label) -> i64 {
        let id = self.next_id();
        label.id = Some(id);
        self.graph.labels.push(label);
        id
    }

    pub fn add_filter(&mut self, mut filter: SearchFilter) -> i64 {
        let id = self.next_id();
        filter.id = Some(id);
        self.graph.filters.push(filter);
        id
    }

    /// Stores `preference`, replacing one with the same key and scope.
    pub fn set_preference(&mut self, preference: Preference) {
        match self
            .graph
            .preferences
            .iter_mut()
            .find(|existing| existing.key == preference.key && existing.scope == preference.scope)
        {
            Some(existing) => existing.value = preference.value,
            None => self.graph.preferences.push(preference),
        }
    }

    /// Saves an imported graph.
    ///
    /// The importer's temporary root becomes a real root only when there is
    /// no `target` and the store has no root yet. Otherwise its content is
    /// placed under `target`, or under the first existing root. Bookmark
    /// sets from the import always become new roots.
    ///
    /// Labels and filters with the name of an existing one update it and
    /// keep its identifier. Location conditions and filter actions are then
    /// rewritten from the identifiers in the imported document to the ones
    /// assigned here.
    pub fn import(&mut self, imported: StateGraph, target: Option<FolderHandle>) -> ImportReport {
        let mut report = ImportReport::default();
        let mut ids = IdMap::default();
        let mut searches = Vec::new();

        for &root in imported.roots() {
            let folder = imported.folder(root);
            let destination = if folder.temporary {
                match target.or_else(|| self.graph.roots().first().copied()) {
                    Some(existing) => existing,
                    None => self.import_root(&imported, root, &mut ids, &mut report),
                }
            } else {
                self.import_root(&imported, root, &mut ids, &mut report)
            };
            self.copy_children(&imported, root, destination, &mut ids, &mut searches, &mut report);
        }

        for label in &imported.labels {
            self.merge_label(label, &mut ids, &mut report);
        }

        for mark in searches {
            if let MarkKind::SearchMark(search) = &mut self.graph.mark_mut(mark).kind {
                report.dropped_references += rewrite_search(search, &ids);
            }
        }

        for filter in &imported.filters {
            let mut filter = filter.clone();
            if let Some(search) = &mut filter.search {
                report.dropped_references += rewrite_search(search, &ids);
            }
            report.dropped_references += rewrite_actions(&mut filter.actions, &ids);
            self.merge_filter(filter, &mut report);
        }

        for preference in &imported.preferences {
            self.set_preference(preference.clone());
            report.preferences += 1;
        }

        tracing::info!(
            folders = report.folders,
            marks = report.marks,
            labels = report.labels,
            filters = report.filters,
            preferences = report.preferences,
            dropped_references = report.dropped_references,
            "Import saved"
        );
        report
    }

    fn import_root(
        &mut self,
        imported: &StateGraph,
        root: FolderHandle,
        ids: &mut IdMap,
        report: &mut ImportReport,
    ) -> FolderHandle {
        let source = imported.folder(root);
        let saved = self.add_root(&source.name);
        self.graph.folder_mut(saved).old_id = source.old_id;
        record(&mut ids.folders, source.old_id, self.graph.folder(saved).id);
        report.folders += 1;
        saved
    }

    fn copy_children(
        &mut self,
        imported: &StateGraph,
        source: FolderHandle,
        destination: FolderHandle,
        ids: &mut IdMap,
        searches: &mut Vec<MarkHandle>,
        report: &mut ImportReport,
    ) {
        for &child in &imported.folder(source).children {
            match child {
                StateRef::Folder(folder) => {
                    let original = imported.folder(folder);
                    let saved = self.add_folder(destination, &original.name);
                    self.graph.folder_mut(saved).old_id = original.old_id;
                    record(&mut ids.folders, original.old_id, self.graph.folder(saved).id);
                    report.folders += 1;
                    self.copy_children(imported, folder, saved, ids, searches, report);
                }
                StateRef::Mark(mark) => {
                    let original = imported.mark(mark);
                    let saved = self.add_mark(destination, &original.name, original.kind.clone());
                    self.graph.mark_mut(saved).old_id = original.old_id;

                    let new_id = self.graph.mark(saved).id;
                    let table = match &original.kind {
                        MarkKind::BookMark { .. } => &mut ids.bookmarks,
                        MarkKind::SearchMark(_) => {
                            searches.push(saved);
                            &mut ids.search_marks
                        }
                        MarkKind::NewsBin => &mut ids.news_bins,
                    };
                    record(table, original.old_id, new_id);
                    report.marks += 1;
                }
            }
        }
    }

    fn merge_label(&mut self, label: &Label, ids: &mut IdMap, report: &mut ImportReport) {
        let existing = self
            .graph
            .labels
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&label.name));

        let id = match existing {
            Some(existing) => {
                existing.color = label.color.clone();
                existing.order = label.order;
                existing.id
            }
            None => {
                let mut label = label.clone();
                label.id = None;
                Some(self.add_label(label))
            }
        };
        record(&mut ids.labels, label.old_id, id);
        report.labels += 1;
    }

    fn merge_filter(&mut self, filter: SearchFilter, report: &mut ImportReport) {
        match self
            .graph
            .filters
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&filter.name))
        {
            Some(existing) => {
                let id = existing.id;
                *existing = SearchFilter { id, ..filter };
            }
            None => {
                self.add_filter(SearchFilter { id: None, ..filter });
            }
        }
        report.filters += 1;
    }
}

fn record(table: &mut HashMap<i64, i64>, old_id: Option<i64>, new_id: Option<i64>) {
    if let (Some(old_id), Some(new_id)) = (old_id, new_id) {
        table.insert(old_id, new_id);
    }
}

/// Maps every id through `table`, dropping the ones it does not know.
/// Returns how many were dropped.
fn remap(values: &mut Vec<i64>, table: &HashMap<i64, i64>) -> usize {
    let before = values.len();
    *values = values.iter().filter_map(|id| table.get(id).copied()).collect();
    before - values.len()
}

/// Rewrites location conditions; a condition left without any location is
/// removed.
fn rewrite_search(search: &mut Search, ids: &IdMap) -> usize {
    // The bookmark list of a location also holds saved searches.
    let marks: HashMap<i64, i64> = ids
        .bookmarks
        .iter()
        .chain(&ids.search_marks)
        .map(|(old, new)| (*old, *new))
        .collect();

    let mut dropped = 0;
    search.conditions.retain_mut(|condition| {
        let SearchValue::Location(scope) = &mut condition.value else {
            return true;
        };
        let was_empty = scope.is_empty();
        dropped += remap(&mut scope.folders, &ids.folders);
        dropped += remap(&mut scope.bookmarks, &marks);
        dropped += remap(&mut scope.news_bins, &ids.news_bins);
        was_empty || !scope.is_empty()
    });
    dropped
}

/// Rewrites news bin and label references of filter actions; an action whose
/// references all failed to resolve is removed.
fn rewrite_actions(actions: &mut Vec<FilterAction>, ids: &IdMap) -> usize {
    let mut dropped = 0;
    actions.retain_mut(|action| {
        if action.targets_news_bins() {
            let ActionData::List(values) = &mut action.data else {
                return true;
            };
            let before = values.len();
            *values = values
                .iter()
                .filter_map(|value| value.trim().parse::<i64>().ok())
                .filter_map(|id| ids.news_bins.get(&id))
                .map(i64::to_string)
                .collect();
            dropped += before - values.len();
            !values.is_empty()
        } else if action.targets_label() {
            let ActionData::Scalar(value) = &mut action.data else {
                return true;
            };
            match value.trim().parse::<i64>().ok().and_then(|id| ids.labels.get(&id)) {
                Some(id) => {
                    *value = id.to_string();
                    true
                }
                None => {
                    dropped += 1;
                    false
                }
            }
        } else {
            true
        }
    });
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        LocationScope, PreferenceScope, PreferenceValue, SearchCondition, SearchField,
        SearchSpecifier,
    };
    use pretty_assertions::assert_eq;
    use url::Url;

    fn imported_graph() -> StateGraph {
        let mut graph = StateGraph::new();
        let staging = graph.add_root("My Bookmarks");
        graph.folder_mut(staging).temporary = true;
        let folder = graph.add_folder(staging, "News");
        graph.folder_mut(folder).old_id = Some(100);
        let bin = graph.add_mark(folder, "Keep", MarkKind::NewsBin);
        graph.mark_mut(bin).old_id = Some(101);
        let search = graph.add_mark(
            folder,
            "In News",
            MarkKind::search_mark(
                true,
                vec![SearchCondition::new(
                    SearchField::Location,
                    SearchSpecifier::ScopeAll,
                    SearchValue::Location(LocationScope {
                        folders: vec![100, 999],
                        bookmarks: Vec::new(),
                        news_bins: vec![101],
                    }),
                )],
            ),
        );
        graph.mark_mut(search).old_id = Some(102);
        graph
    }

    #[test]
    fn test_temporary_root_becomes_real_root_in_empty_store() {
        let mut store = MemoryStore::new();
        let report = store.import(imported_graph(), None);

        let graph = store.graph();
        assert_eq!(graph.roots().len(), 1);
        let root = graph.folder(graph.roots()[0]);
        assert_eq!(root.name, "My Bookmarks");
        assert!(root.id.is_some());
        assert_eq!(report.folders, 2);
        assert_eq!(report.marks, 2);
        assert_eq!(report.dropped_references, 1);
    }

    #[test]
    fn test_content_grafts_under_existing_root() {
        let mut store = MemoryStore::new();
        let existing = store.add_root("Mine");
        store.import(imported_graph(), None);

        let graph = store.graph();
        assert_eq!(graph.roots(), &[existing]);
        assert_eq!(graph.folder(existing).children.len(), 1);
    }

    #[test]
    fn test_location_conditions_use_new_ids() {
        let mut store = MemoryStore::new();
        let target = store.add_root("Mine");
        store.import(imported_graph(), Some(target));

        let graph = store.graph();
        let folder_id = graph
            .folders()
            .find(|(_, folder)| folder.name == "News")
            .and_then(|(_, folder)| folder.id)
            .unwrap();
        let bin_id = graph
            .marks()
            .find(|(_, mark)| mark.kind == MarkKind::NewsBin)
            .and_then(|(_, mark)| mark.id)
            .unwrap();
        let (_, search) = graph
            .marks()
            .find(|(_, mark)| matches!(mark.kind, MarkKind::SearchMark(_)))
            .unwrap();
        let MarkKind::SearchMark(search) = &search.kind else {
            unreachable!();
        };

        assert_eq!(
            search.conditions[0].location(),
            Some(&LocationScope {
                folders: vec![folder_id],
                bookmarks: Vec::new(),
                news_bins: vec![bin_id],
            })
        );
    }

    #[test]
    fn test_labels_and_filters_merge_on_name() {
        let mut store = MemoryStore::new();
        let root = store.add_root("Mine");
        let label_id = store.add_label(Label {
            name: "Important".to_owned(),
            color: "255,0,0".to_owned(),
            ..Label::default()
        });
        let filter_id = store.add_filter(SearchFilter {
            name: "Archive".to_owned(),
            ..SearchFilter::default()
        });

        let mut imported = StateGraph::new();
        let staging = imported.add_root("My Bookmarks");
        imported.folder_mut(staging).temporary = true;
        let bin = imported.add_mark(staging, "Bin", MarkKind::NewsBin);
        imported.mark_mut(bin).old_id = Some(7);
        imported.labels.push(Label {
            old_id: Some(3),
            name: "important".to_owned(),
            color: "0,255,0".to_owned(),
            ..Label::default()
        });
        imported.filters.push(SearchFilter {
            name: "Archive".to_owned(),
            enabled: true,
            actions: vec![
                FilterAction::move_news(&[7, 8]),
                FilterAction::label_news(3),
                FilterAction::copy_news(&[42]),
            ],
            ..SearchFilter::default()
        });
        imported
            .preferences
            .push(Preference::new("font.size", PreferenceScope::Global, PreferenceValue::Integer(14)));

        let report = store.import(imported, Some(root));
        let graph = store.graph();

        assert_eq!(graph.labels.len(), 1);
        assert_eq!(graph.labels[0].id, Some(label_id));
        assert_eq!(graph.labels[0].color, "0,255,0");

        assert_eq!(graph.filters.len(), 1);
        let filter = &graph.filters[0];
        assert_eq!(filter.id, Some(filter_id));
        assert!(filter.enabled);

        let bin_id = graph.marks().next().and_then(|(_, mark)| mark.id).unwrap();
        assert_eq!(
            filter.actions,
            vec![FilterAction::move_news(&[bin_id]), FilterAction::label_news(label_id)]
        );
        assert_eq!(report.dropped_references, 2);
        assert_eq!(graph.preferences.len(), 1);
    }

    #[test]
    fn test_bookmark_sets_become_roots() {
        let mut store = MemoryStore::new();
        store.add_root("Mine");

        let mut imported = StateGraph::new();
        let set = imported.add_root("Work");
        imported.add_mark(
            set,
            "Feed",
            MarkKind::BookMark {
                feed_link: Url::parse("https://example.com/feed").unwrap(),
                homepage: None,
            },
        );
        store.import(imported, None);

        let names: Vec<_> = store
            .graph()
            .roots()
            .iter()
            .map(|&root| store.graph().folder(root).name.clone())
            .collect();
        assert_eq!(names, vec!["Mine".to_owned(), "Work".to_owned()]);
    }
}
