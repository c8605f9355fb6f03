use std::collections::HashSet;
use std::io::Write;

use chrono::Utc;

use super::{attrs, tags, OPML_VERSION, RSSOWL_NS, RSSOWL_PREFIX};
use crate::error::InterpretError;
use crate::state::{
    ActionData, ExportOption, ExportOptions, FilterAction, FolderHandle, Label, LocationScope,
    MarkKind, Preference, Search, SearchCondition, SearchFilter, SearchValue, StateExporter,
    StateGraph, StateRef,
};
use crate::util::VALUE_SEPARATOR;
use crate::xml::{write_document, Element};

/// Writes folders, marks and the optional categories in the OPML dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpmlStateExporter;

impl StateExporter for OpmlStateExporter {
    fn export_to(
        &self,
        out: &mut dyn Write,
        graph: &StateGraph,
        elements: &[StateRef],
        options: &ExportOptions,
    ) -> Result<(), InterpretError> {
        let mut body = Element::new(tags::BODY);

        let selection = Selection::new(graph, elements);
        for top in selection.tops(graph) {
            if let Some(element) = selection.export_node(graph, top) {
                body.push(element);
            }
        }

        if options.contains(ExportOption::Labels) {
            for label in &graph.labels {
                body.push(label_element(label));
            }
        }
        if options.contains(ExportOption::Filters) {
            for filter in &graph.filters {
                body.push(filter_element(filter));
            }
        }
        if options.contains(ExportOption::Preferences) {
            for preference in &graph.preferences {
                body.push(preference_element(preference));
            }
        }

        let mut opml = Element::new(tags::OPML)
            .declare(Some(RSSOWL_PREFIX), RSSOWL_NS)
            .with_attribute(attrs::VERSION, OPML_VERSION);
        opml.push(head());
        opml.push(body);

        tracing::debug!(
            elements = elements.len(),
            labels = options.contains(ExportOption::Labels),
            filters = options.contains(ExportOption::Filters),
            preferences = options.contains(ExportOption::Preferences),
            "Exporting state"
        );

        write_document(&opml, out)?;
        out.flush()?;
        Ok(())
    }
}

fn head() -> Element {
    let mut head = Element::new(tags::HEAD);
    head.push(Element::new(tags::TITLE).with_text("Feedloom Subscriptions"));
    head.push(Element::new(tags::DATE_CREATED).with_text(Utc::now().to_rfc2822()));
    head
}

/// The requested elements plus the ancestors needed to place them.
struct Selection {
    selected: Vec<StateRef>,
    /// Unselected ancestors of selected elements, written as bare folders.
    placeholders: HashSet<StateRef>,
}

impl Selection {
    fn new(graph: &StateGraph, elements: &[StateRef]) -> Self {
        let elements: Vec<StateRef> = elements
            .iter()
            .copied()
            .filter(|&element| {
                let known = graph.contains(element);
                if !known {
                    tracing::warn!(?element, "Skipping element that is not part of the graph");
                }
                known
            })
            .collect();
        let requested: HashSet<StateRef> = elements.iter().copied().collect();

        // An element inside another selected folder is written with it.
        let mut selected = Vec::new();
        for &element in &elements {
            let nested = graph
                .ancestors(element)
                .into_iter()
                .any(|folder| requested.contains(&StateRef::Folder(folder)));
            if !nested && !selected.contains(&element) {
                selected.push(element);
            }
        }

        let placeholders = selected
            .iter()
            .flat_map(|&element| graph.ancestors(element))
            .map(StateRef::Folder)
            .collect();

        Self {
            selected,
            placeholders,
        }
    }

    /// Topmost node of every selected element, in selection order.
    fn tops(&self, graph: &StateGraph) -> Vec<StateRef> {
        let mut tops = Vec::new();
        for &element in &self.selected {
            let top = graph
                .ancestors(element)
                .last()
                .map(|&folder| StateRef::Folder(folder))
                .unwrap_or(element);
            if !tops.contains(&top) {
                tops.push(top);
            }
        }
        tops
    }

    fn export_node(&self, graph: &StateGraph, node: StateRef) -> Option<Element> {
        if self.selected.contains(&node) {
            return Some(node_element(graph, node));
        }
        let StateRef::Folder(folder) = node else {
            return None;
        };
        if !self.placeholders.contains(&node) {
            return None;
        }

        let mut element = folder_shell(graph, folder);
        for &child in &graph.folder(folder).children {
            if let Some(child) = self.export_node(graph, child) {
                element.push(child);
            }
        }
        Some(element)
    }
}

/// A folder or mark with its entire subtree.
fn node_element(graph: &StateGraph, node: StateRef) -> Element {
    match node {
        StateRef::Folder(folder) => {
            let mut element = folder_shell(graph, folder);
            for &child in &graph.folder(folder).children {
                element.push(node_element(graph, child));
            }
            element
        }
        StateRef::Mark(handle) => {
            let mark = graph.mark(handle);
            let id = mark.id.or(mark.old_id);
            match &mark.kind {
                MarkKind::BookMark {
                    feed_link,
                    homepage,
                } => {
                    let mut element = Element::new(tags::OUTLINE)
                        .with_attribute(attrs::TEXT, mark.name.as_str())
                        .with_attribute(attrs::TITLE, mark.name.as_str())
                        .with_attribute(attrs::XML_URL, feed_link.as_str());
                    if let Some(homepage) = homepage {
                        element = element.with_attribute(attrs::HTML_URL, homepage.as_str());
                    }
                    with_id(element, id)
                }
                MarkKind::SearchMark(search) => with_search(
                    with_id(
                        rssowl(tags::SAVED_SEARCH).with_attribute(attrs::NAME, mark.name.as_str()),
                        id,
                    ),
                    search,
                ),
                MarkKind::NewsBin => with_id(
                    rssowl(tags::NEWS_BIN).with_attribute(attrs::NAME, mark.name.as_str()),
                    id,
                ),
            }
        }
    }
}

/// A folder outline without children.
fn folder_shell(graph: &StateGraph, handle: FolderHandle) -> Element {
    let folder = graph.folder(handle);
    let mut element = Element::new(tags::OUTLINE).with_attribute(attrs::TEXT, folder.name.as_str());
    if folder.parent.is_none() {
        element = element.with_prefixed_attribute(RSSOWL_PREFIX, RSSOWL_NS, attrs::IS_SET, "true");
    }
    with_id(element, folder.id.or(folder.old_id))
}

fn with_search(element: Element, search: &Search) -> Element {
    let mut element =
        element.with_attribute(attrs::MATCH_ALL_CONDITIONS, search.match_all.to_string());
    for condition in &search.conditions {
        element.push(condition_element(condition));
    }
    element
}

fn condition_element(condition: &SearchCondition) -> Element {
    let mut element = rssowl(tags::SEARCH_CONDITION);
    element.push(
        rssowl(tags::SEARCH_SPECIFIER)
            .with_attribute(attrs::ID, condition.specifier.id().to_string()),
    );

    let mut value = rssowl(tags::SEARCH_VALUE).with_attribute(attrs::TYPE, condition.value.kind());
    match &condition.value {
        SearchValue::Location(scope) => value.push(location_element(scope)),
        scalar => {
            if let Some(text) = scalar.to_text() {
                value = value.with_attribute(attrs::VALUE, text);
            }
        }
    }
    element.push(value);

    element.push(rssowl(tags::SEARCH_FIELD).with_attribute(attrs::NAME, condition.field.name()));
    element
}

fn location_element(scope: &LocationScope) -> Element {
    rssowl(tags::LOCATION)
        .with_attribute(attrs::FOLDERS, join(&scope.folders))
        .with_attribute(attrs::BOOKMARKS, join(&scope.bookmarks))
        .with_attribute(attrs::NEWS_BINS, join(&scope.news_bins))
}

fn label_element(label: &Label) -> Element {
    with_id(
        rssowl(tags::LABEL)
            .with_attribute(attrs::NAME, label.name.as_str())
            .with_attribute(attrs::ORDER, label.order.to_string())
            .with_attribute(attrs::COLOR, label.color.as_str()),
        label.id.or(label.old_id),
    )
}

fn filter_element(filter: &SearchFilter) -> Element {
    let mut element = with_id(
        rssowl(tags::SEARCH_FILTER)
            .with_attribute(attrs::NAME, filter.name.as_str())
            .with_attribute(attrs::ORDER, filter.order.to_string())
            .with_attribute(attrs::ENABLED, filter.enabled.to_string())
            .with_attribute(attrs::MATCH_ALL_NEWS, filter.match_all_news.to_string()),
        filter.id.or(filter.old_id),
    );
    if let Some(search) = &filter.search {
        element = with_search(element, search);
    }
    for action in &filter.actions {
        element.push(action_element(action));
    }
    element
}

fn action_element(action: &FilterAction) -> Element {
    let element = rssowl(tags::FILTER_ACTION).with_attribute(attrs::ID, action.action_id.as_str());
    match &action.data {
        ActionData::None => element,
        ActionData::Scalar(value) => element.with_attribute(attrs::DATA, value.as_str()),
        ActionData::List(values) => element
            .with_attribute(attrs::DATA, values.join(&VALUE_SEPARATOR.to_string()))
            .with_attribute(attrs::DATA_TYPE, attrs::DATA_TYPE_LIST),
        ActionData::Properties(properties) => {
            let mut element = element;
            for (key, value) in properties {
                element.push(
                    rssowl(tags::FILTER_ACTION_PROPERTY)
                        .with_attribute(attrs::ID, key.as_str())
                        .with_attribute(attrs::VALUE, value.as_str()),
                );
            }
            element
        }
    }
}

fn preference_element(preference: &Preference) -> Element {
    rssowl(tags::PREFERENCE)
        .with_attribute(attrs::ID, preference.key.as_str())
        .with_attribute(attrs::VALUE, preference.value.to_text())
        .with_attribute(attrs::TYPE, preference.value.kind())
        .with_attribute(attrs::SCOPE, preference.scope.name())
}

fn rssowl(name: &str) -> Element {
    Element::namespaced(RSSOWL_PREFIX, RSSOWL_NS, name)
}

fn with_id(element: Element, id: Option<i64>) -> Element {
    match id {
        Some(id) => element.with_prefixed_attribute(RSSOWL_PREFIX, RSSOWL_NS, attrs::ID, id.to_string()),
        None => element,
    }
}

fn join(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(&VALUE_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PreferenceScope, PreferenceValue, SearchField, SearchSpecifier};
    use url::Url;

    fn export(graph: &StateGraph, elements: &[StateRef], options: &ExportOptions) -> String {
        let mut out = Vec::new();
        OpmlStateExporter
            .export_to(&mut out, graph, elements, options)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn sample() -> (StateGraph, FolderHandle, FolderHandle, FolderHandle) {
        let mut graph = StateGraph::new();
        let root = graph.add_root("My Bookmarks");
        graph.folder_mut(root).id = Some(1);
        let tech = graph.add_folder(root, "Tech");
        graph.folder_mut(tech).id = Some(2);
        let rust = graph.add_folder(tech, "Rust");
        graph.folder_mut(rust).id = Some(3);
        let feed = graph.add_mark(
            rust,
            "This Week in Rust",
            MarkKind::BookMark {
                feed_link: Url::parse("https://this-week-in-rust.org/rss.xml").unwrap(),
                homepage: None,
            },
        );
        graph.mark_mut(feed).id = Some(4);
        (graph, root, tech, rust)
    }

    #[test]
    fn test_missing_ancestors_become_placeholders() {
        let (graph, _, _, rust) = sample();
        let xml = export(&graph, &[StateRef::Folder(rust)], &ExportOptions::none());

        let root_at = xml.find(r#"text="My Bookmarks""#).unwrap();
        let tech_at = xml.find(r#"text="Tech""#).unwrap();
        let rust_at = xml.find(r#"text="Rust""#).unwrap();
        assert!(root_at < tech_at && tech_at < rust_at);
        assert!(xml.contains(r#"rssowl:isSet="true""#));
        assert!(xml.contains(r#"xmlUrl="https://this-week-in-rust.org/rss.xml""#));
    }

    #[test]
    fn test_nested_selection_is_written_once() {
        let (graph, root, tech, _) = sample();
        let xml = export(
            &graph,
            &[StateRef::Folder(tech), StateRef::Folder(root)],
            &ExportOptions::none(),
        );
        assert_eq!(xml.matches(r#"text="Tech""#).count(), 1);
        assert_eq!(xml.matches(r#"text="My Bookmarks""#).count(), 1);
    }

    #[test]
    fn test_location_condition_serializes_id_lists() {
        let mut graph = StateGraph::new();
        let root = graph.add_root("Root");
        let search = graph.add_mark(
            root,
            "In bins",
            MarkKind::search_mark(
                false,
                vec![SearchCondition::new(
                    SearchField::Location,
                    SearchSpecifier::ScopeAll,
                    SearchValue::Location(LocationScope {
                        folders: vec![1, 2],
                        bookmarks: Vec::new(),
                        news_bins: vec![9],
                    }),
                )],
            ),
        );
        let xml = export(&graph, &[StateRef::Mark(search)], &ExportOptions::none());

        assert!(xml.contains(r#"<rssowl:savedsearch name="In bins" matchAllConditions="false">"#));
        assert!(xml.contains(r#"<rssowl:location folders="1,2" bookmarks="" newsbins="9"/>"#));
        assert!(xml.contains(r#"<rssowl:searchfield name="location"/>"#));
    }

    #[test]
    fn test_options_select_categories() {
        let mut graph = StateGraph::new();
        graph.labels.push(Label {
            id: Some(7),
            name: "Later".to_owned(),
            color: "0,0,255".to_owned(),
            ..Label::default()
        });
        graph.preferences.push(Preference::new(
            "font.size",
            PreferenceScope::Global,
            PreferenceValue::Integer(12),
        ));

        let bare = export(&graph, &[], &ExportOptions::none());
        assert!(!bare.contains("rssowl:label"));
        assert!(!bare.contains("rssowl:pref"));

        let labels_only = export(&graph, &[], &ExportOptions::none().with(ExportOption::Labels));
        assert!(labels_only.contains(r#"name="Later""#));
        assert!(labels_only.contains(r#"rssowl:id="7""#));
        assert!(!labels_only.contains("rssowl:pref"));

        let all = export(&graph, &[], &ExportOptions::all());
        assert!(all.contains(r#"<rssowl:pref id="font.size" value="12" type="integer" scope="global"/>"#));
    }

    #[test]
    fn test_unknown_handles_are_skipped() {
        let (graph, _, tech, _) = sample();
        let mut larger = StateGraph::new();
        let mut parent = larger.add_root("Elsewhere");
        for level in 0..8 {
            parent = larger.add_folder(parent, format!("Level {level}"));
        }

        let xml = export(
            &graph,
            &[StateRef::Folder(parent), StateRef::Folder(tech)],
            &ExportOptions::none(),
        );
        assert!(xml.contains(r#"text="Tech""#));
        assert!(!xml.contains("Level"));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let (graph, root, _, _) = sample();
        let result = OpmlStateExporter.export_to(
            &mut FailingWriter,
            &graph,
            &[StateRef::Folder(root)],
            &ExportOptions::all(),
        );
        assert!(matches!(result, Err(InterpretError::Io(_))));
    }
}
