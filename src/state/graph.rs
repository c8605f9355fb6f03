use url::Url;

use super::filter::SearchFilter;
use super::preference::Preference;
use super::search::{Search, SearchCondition};

/// Index of a folder inside its [`StateGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderHandle(usize);

/// Index of a mark inside its [`StateGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkHandle(usize);

/// A node of the folder tree: either a folder or one of its leaf marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateRef {
    Folder(FolderHandle),
    Mark(MarkHandle),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Folder {
    /// Identifier assigned by the store; `None` until saved.
    pub id: Option<i64>,
    /// Identifier the folder had in the document it was imported from.
    pub old_id: Option<i64>,
    pub name: String,
    pub parent: Option<FolderHandle>,
    /// Ordered folders and marks.
    pub children: Vec<StateRef>,
    /// Staging root created by an import, not meant to be kept as is.
    pub temporary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkKind {
    BookMark { feed_link: Url, homepage: Option<Url> },
    SearchMark(Search),
    NewsBin,
}

impl MarkKind {
    pub fn search_mark(match_all: bool, conditions: Vec<SearchCondition>) -> Self {
        MarkKind::SearchMark(Search {
            match_all,
            conditions,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub id: Option<i64>,
    pub old_id: Option<i64>,
    pub name: String,
    pub parent: FolderHandle,
    pub kind: MarkKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Label {
    pub id: Option<i64>,
    pub old_id: Option<i64>,
    pub name: String,
    /// `"r,g,b"` as stored by the application.
    pub color: String,
    pub order: i32,
}

/// Folders, marks, labels, filters and preferences of one application state.
///
/// Folders and marks live in arenas and refer to each other by handle, so
/// parent links and child lists never own each other.
#[derive(Debug, Clone, Default)]
pub struct StateGraph {
    folders: Vec<Folder>,
    marks: Vec<Mark>,
    roots: Vec<FolderHandle>,
    pub labels: Vec<Label>,
    pub filters: Vec<SearchFilter>,
    pub preferences: Vec<Preference>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing at all, not even an empty root.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
            && self.labels.is_empty()
            && self.filters.is_empty()
            && self.preferences.is_empty()
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// Adds a top-level folder (a bookmark set).
    pub fn add_root(&mut self, name: impl Into<String>) -> FolderHandle {
        let handle = FolderHandle(self.folders.len());
        self.folders.push(Folder {
            name: name.into(),
            ..Folder::default()
        });
        self.roots.push(handle);
        handle
    }

    pub fn add_folder(&mut self, parent: FolderHandle, name: impl Into<String>) -> FolderHandle {
        let handle = FolderHandle(self.folders.len());
        self.folders.push(Folder {
            name: name.into(),
            parent: Some(parent),
            ..Folder::default()
        });
        self.folders[parent.0].children.push(StateRef::Folder(handle));
        handle
    }

    pub fn add_mark(
        &mut self,
        parent: FolderHandle,
        name: impl Into<String>,
        kind: MarkKind,
    ) -> MarkHandle {
        let handle = MarkHandle(self.marks.len());
        self.marks.push(Mark {
            id: None,
            old_id: None,
            name: name.into(),
            parent,
            kind,
        });
        self.folders[parent.0].children.push(StateRef::Mark(handle));
        handle
    }

    // ------------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------------

    pub fn roots(&self) -> &[FolderHandle] {
        &self.roots
    }

    /// # Panics
    ///
    /// Panics if `handle` was not issued by this graph.
    pub fn folder(&self, handle: FolderHandle) -> &Folder {
        &self.folders[handle.0]
    }

    pub fn folder_mut(&mut self, handle: FolderHandle) -> &mut Folder {
        &mut self.folders[handle.0]
    }

    /// # Panics
    ///
    /// Panics if `handle` was not issued by this graph.
    pub fn mark(&self, handle: MarkHandle) -> &Mark {
        &self.marks[handle.0]
    }

    pub fn mark_mut(&mut self, handle: MarkHandle) -> &mut Mark {
        &mut self.marks[handle.0]
    }

    pub fn folders(&self) -> impl Iterator<Item = (FolderHandle, &Folder)> {
        self.folders
            .iter()
            .enumerate()
            .map(|(index, folder)| (FolderHandle(index), folder))
    }

    pub fn marks(&self) -> impl Iterator<Item = (MarkHandle, &Mark)> {
        self.marks
            .iter()
            .enumerate()
            .map(|(index, mark)| (MarkHandle(index), mark))
    }

    /// Whether `node` resolves in this graph. Handles from another graph can
    /// still pass when their index happens to be in range.
    pub fn contains(&self, node: StateRef) -> bool {
        match node {
            StateRef::Folder(folder) => folder.0 < self.folders.len(),
            StateRef::Mark(mark) => mark.0 < self.marks.len(),
        }
    }

    pub fn name(&self, node: StateRef) -> &str {
        match node {
            StateRef::Folder(folder) => &self.folder(folder).name,
            StateRef::Mark(mark) => &self.mark(mark).name,
        }
    }

    pub fn parent(&self, node: StateRef) -> Option<FolderHandle> {
        match node {
            StateRef::Folder(folder) => self.folder(folder).parent,
            StateRef::Mark(mark) => Some(self.mark(mark).parent),
        }
    }

    /// Parent chain of `node`, nearest first.
    pub fn ancestors(&self, node: StateRef) -> Vec<FolderHandle> {
        let mut chain = Vec::new();
        let mut current = self.parent(node);
        while let Some(folder) = current {
            // A cycle can only come from a corrupt graph; stop instead of looping.
            if chain.contains(&folder) {
                break;
            }
            chain.push(folder);
            current = self.folder(folder).parent;
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bookmark(link: &str) -> MarkKind {
        MarkKind::BookMark {
            feed_link: Url::parse(link).unwrap(),
            homepage: None,
        }
    }

    #[test]
    fn test_tree_construction_keeps_order() {
        let mut graph = StateGraph::new();
        let root = graph.add_root("My Bookmarks");
        let news = graph.add_folder(root, "News");
        let feed = graph.add_mark(news, "Example", bookmark("https://example.com/feed"));
        let bin = graph.add_mark(root, "Saved", MarkKind::NewsBin);

        assert_eq!(graph.roots(), &[root]);
        assert_eq!(
            graph.folder(root).children,
            vec![StateRef::Folder(news), StateRef::Mark(bin)]
        );
        assert_eq!(graph.ancestors(StateRef::Mark(feed)), vec![news, root]);
        assert_eq!(graph.name(StateRef::Mark(bin)), "Saved");
    }
}
