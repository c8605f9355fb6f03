use super::{attrs, tags, DEFAULT_SET_NAME, RSSOWL_NS};
use crate::feed::MAX_OUTLINE_DEPTH;
use crate::state::{
    ActionData, ConditionError, FilterAction, FolderHandle, Label, LocationScope, MarkKind,
    Preference, PreferenceScope, PreferenceValue, Search, SearchCondition, SearchField,
    SearchFilter, SearchSpecifier, SearchValue, StateGraph, StateImporter,
};
use crate::util::{parse_int, parse_long, split_values, to_uri, with_default_scheme};
use crate::xml::{Document, Element};

/// Reads the OPML dialect back into a [`StateGraph`].
///
/// Plain OPML subscription lists import too: every outline with an
/// `xmlUrl` becomes a bookmark, every other outline a folder.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpmlStateImporter;

impl StateImporter for OpmlStateImporter {
    fn import_from(&self, document: &Document) -> StateGraph {
        let mut import = Import::default();

        let Some(body) = document
            .root()
            .filter(|root| root.is(tags::OPML))
            .and_then(|root| root.child(tags::BODY))
        else {
            tracing::debug!("No OPML body, nothing to import");
            return import.graph;
        };

        for child in body.elements() {
            import.body_child(child);
        }

        tracing::debug!(
            folders = import.graph.folders().count(),
            marks = import.graph.marks().count(),
            labels = import.graph.labels.len(),
            filters = import.graph.filters.len(),
            preferences = import.graph.preferences.len(),
            "Imported state"
        );
        import.graph
    }
}

#[derive(Default)]
struct Import {
    graph: StateGraph,
    /// Holds body-level outlines that are not bookmark sets themselves.
    staging: Option<FolderHandle>,
}

impl Import {
    fn staging(&mut self) -> FolderHandle {
        if let Some(staging) = self.staging {
            return staging;
        }
        let staging = self.graph.add_root(DEFAULT_SET_NAME);
        self.graph.folder_mut(staging).temporary = true;
        self.staging = Some(staging);
        staging
    }

    fn body_child(&mut self, element: &Element) {
        match element.name.as_str() {
            tags::OUTLINE if is_set(element) => {
                let root = self.graph.add_root(outline_name(element));
                self.graph.folder_mut(root).old_id = old_id(element);
                self.folder_children(element, root, 1);
            }
            tags::OUTLINE | tags::SAVED_SEARCH | tags::NEWS_BIN => {
                let staging = self.staging();
                self.folder_child(element, staging, 1);
            }
            tags::LABEL => self.graph.labels.push(label(element)),
            tags::SEARCH_FILTER => self.graph.filters.push(filter(element)),
            tags::PREFERENCE => {
                if let Some(preference) = preference(element) {
                    self.graph.preferences.push(preference);
                }
            }
            other => tracing::trace!(element = other, "Ignoring unknown body element"),
        }
    }

    fn folder_children(&mut self, element: &Element, folder: FolderHandle, depth: usize) {
        for child in element.elements() {
            self.folder_child(child, folder, depth);
        }
    }

    fn folder_child(&mut self, element: &Element, parent: FolderHandle, depth: usize) {
        if depth > MAX_OUTLINE_DEPTH {
            tracing::warn!(depth, "Ignoring state nested too deeply");
            return;
        }

        match element.name.as_str() {
            tags::OUTLINE => match element.attribute(attrs::XML_URL) {
                Some(url) => self.bookmark(element, url, parent),
                None => {
                    let folder = self.graph.add_folder(parent, outline_name(element));
                    self.graph.folder_mut(folder).old_id = old_id(element);
                    self.folder_children(element, folder, depth + 1);
                }
            },
            tags::SAVED_SEARCH => {
                let search = search(element);
                let mark = self
                    .graph
                    .add_mark(parent, name(element), MarkKind::SearchMark(search));
                self.graph.mark_mut(mark).old_id = old_id(element);
            }
            tags::NEWS_BIN => {
                let mark = self.graph.add_mark(parent, name(element), MarkKind::NewsBin);
                self.graph.mark_mut(mark).old_id = old_id(element);
            }
            _ => {}
        }
    }

    fn bookmark(&mut self, element: &Element, url: &str, parent: FolderHandle) {
        let Some(feed_link) = with_default_scheme(url) else {
            tracing::warn!(url, "Skipping bookmark with invalid feed address");
            return;
        };
        let homepage = element
            .attribute(attrs::HTML_URL)
            .and_then(|homepage| to_uri(homepage, None));

        let name = element
            .attribute(attrs::TEXT)
            .or_else(|| element.attribute(attrs::TITLE))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| feed_link.to_string());

        let mark = self.graph.add_mark(
            parent,
            name,
            MarkKind::BookMark {
                feed_link,
                homepage,
            },
        );
        self.graph.mark_mut(mark).old_id = old_id(element);
    }
}

fn is_set(element: &Element) -> bool {
    element
        .attribute_ns(RSSOWL_NS, attrs::IS_SET)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

fn old_id(element: &Element) -> Option<i64> {
    element.attribute_ns(RSSOWL_NS, attrs::ID).and_then(parse_long)
}

fn outline_name(element: &Element) -> String {
    element
        .attribute(attrs::TEXT)
        .or_else(|| element.attribute(attrs::TITLE))
        .map(|name| name.trim().to_owned())
        .unwrap_or_default()
}

fn name(element: &Element) -> String {
    element
        .attribute(attrs::NAME)
        .map(|name| name.trim().to_owned())
        .unwrap_or_default()
}

fn flag(element: &Element, attribute: &str) -> bool {
    element
        .attribute(attribute)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

// ============================================================================
// Searches
// ============================================================================

/// Conditions of a saved search or filter; unreadable conditions are dropped
/// one by one.
fn search(element: &Element) -> Search {
    let conditions = element
        .children_named(tags::SEARCH_CONDITION)
        .filter_map(|condition| match search_condition(condition) {
            Ok(condition) => Some(condition),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unreadable search condition");
                None
            }
        })
        .collect();

    Search {
        match_all: flag(element, attrs::MATCH_ALL_CONDITIONS),
        conditions,
    }
}

fn search_condition(element: &Element) -> Result<SearchCondition, ConditionError> {
    let field = element
        .child(tags::SEARCH_FIELD)
        .and_then(|field| field.attribute(attrs::NAME))
        .ok_or(ConditionError::Missing("field"))?;
    let field = SearchField::from_name(field)?;

    let specifier = element
        .child(tags::SEARCH_SPECIFIER)
        .and_then(|specifier| specifier.attribute(attrs::ID))
        .ok_or(ConditionError::Missing("specifier"))?;
    let specifier = SearchSpecifier::from_id(specifier)?;

    let value = element
        .child(tags::SEARCH_VALUE)
        .ok_or(ConditionError::Missing("value"))?;
    let value = search_value(value)?;

    Ok(SearchCondition::new(field, specifier, value))
}

fn search_value(element: &Element) -> Result<SearchValue, ConditionError> {
    if let Some(location) = element.child(tags::LOCATION) {
        return Ok(SearchValue::Location(location_scope(location)));
    }
    let kind = element
        .attribute(attrs::TYPE)
        .ok_or(ConditionError::Missing("value type"))?;
    let text = element
        .attribute(attrs::VALUE)
        .map(str::to_owned)
        .or_else(|| element.text())
        .unwrap_or_default();
    SearchValue::from_text(kind, &text)
}

fn location_scope(element: &Element) -> LocationScope {
    let ids = |attribute: &str| -> Vec<i64> {
        element
            .attribute(attribute)
            .map(|value| split_values(value).filter_map(parse_long).collect())
            .unwrap_or_default()
    };
    LocationScope {
        folders: ids(attrs::FOLDERS),
        bookmarks: ids(attrs::BOOKMARKS),
        news_bins: ids(attrs::NEWS_BINS),
    }
}

// ============================================================================
// Labels, filters, preferences
// ============================================================================

fn label(element: &Element) -> Label {
    Label {
        id: None,
        old_id: old_id(element),
        name: name(element),
        color: element
            .attribute(attrs::COLOR)
            .map(|color| color.trim().to_owned())
            .unwrap_or_default(),
        order: element.attribute(attrs::ORDER).and_then(parse_int).unwrap_or_default(),
    }
}

fn filter(element: &Element) -> SearchFilter {
    let has_search = element.attribute(attrs::MATCH_ALL_CONDITIONS).is_some()
        || element.child(tags::SEARCH_CONDITION).is_some();

    SearchFilter {
        id: None,
        old_id: old_id(element),
        name: name(element),
        order: element.attribute(attrs::ORDER).and_then(parse_int).unwrap_or_default(),
        enabled: flag(element, attrs::ENABLED),
        match_all_news: flag(element, attrs::MATCH_ALL_NEWS),
        search: has_search.then(|| search(element)),
        actions: element
            .children_named(tags::FILTER_ACTION)
            .filter_map(filter_action)
            .collect(),
    }
}

fn filter_action(element: &Element) -> Option<FilterAction> {
    let Some(action_id) = element.attribute(attrs::ID).map(str::trim) else {
        tracing::warn!("Dropping filter action without id");
        return None;
    };

    let properties: Vec<(String, String)> = element
        .children_named(tags::FILTER_ACTION_PROPERTY)
        .filter_map(|property| {
            let key = property.attribute(attrs::ID)?;
            let value = property.attribute(attrs::VALUE).unwrap_or_default();
            Some((key.to_owned(), value.to_owned()))
        })
        .collect();

    let data = match element.attribute(attrs::DATA) {
        _ if !properties.is_empty() => ActionData::Properties(properties),
        Some(data)
            if element
                .attribute(attrs::DATA_TYPE)
                .is_some_and(|kind| kind.eq_ignore_ascii_case(attrs::DATA_TYPE_LIST)) =>
        {
            ActionData::List(split_values(data).map(str::to_owned).collect())
        }
        Some(data) => ActionData::Scalar(data.to_owned()),
        None => ActionData::None,
    };

    Some(FilterAction::new(action_id, data))
}

fn preference(element: &Element) -> Option<Preference> {
    let key = element.attribute(attrs::ID)?.trim();
    let scope = match element.attribute(attrs::SCOPE) {
        Some(scope) => PreferenceScope::from_name(scope),
        None => Ok(PreferenceScope::Global),
    };
    let value = PreferenceValue::from_text(
        element.attribute(attrs::TYPE).unwrap_or("string"),
        element.attribute(attrs::VALUE).unwrap_or_default(),
    );

    match (scope, value) {
        (Ok(scope), Ok(value)) => Some(Preference::new(key, scope, value)),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(key, error = %e, "Dropping unreadable preference");
            None
        }
    }
}
