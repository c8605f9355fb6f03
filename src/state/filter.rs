use super::search::Search;

/// An automatic news filter: when its search matches (or for all news), the
/// actions run in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub id: Option<i64>,
    pub old_id: Option<i64>,
    pub name: String,
    pub order: i32,
    pub enabled: bool,
    /// Run on every incoming news item, ignoring `search`.
    pub match_all_news: bool,
    pub search: Option<Search>,
    pub actions: Vec<FilterAction>,
}

/// Payload of a filter action; the shape depends on the action.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActionData {
    #[default]
    None,
    Scalar(String),
    List(Vec<String>),
    Properties(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterAction {
    pub action_id: String,
    pub data: ActionData,
}

impl FilterAction {
    /// Moves matching news into the news bins listed in the data.
    pub const MOVE_NEWS: &'static str = "org.rssowl.core.MoveNewsAction";
    /// Copies matching news into the news bins listed in the data.
    pub const COPY_NEWS: &'static str = "org.rssowl.core.CopyNewsAction";
    /// Applies the label whose id is the scalar data.
    pub const LABEL_NEWS: &'static str = "org.rssowl.core.LabelNewsAction";
    pub const MARK_READ: &'static str = "org.rssowl.core.MarkReadNewsAction";

    pub fn new(action_id: impl Into<String>, data: ActionData) -> Self {
        Self {
            action_id: action_id.into(),
            data,
        }
    }

    pub fn move_news(bins: &[i64]) -> Self {
        Self::new(Self::MOVE_NEWS, ActionData::List(ids(bins)))
    }

    pub fn copy_news(bins: &[i64]) -> Self {
        Self::new(Self::COPY_NEWS, ActionData::List(ids(bins)))
    }

    pub fn label_news(label: i64) -> Self {
        Self::new(Self::LABEL_NEWS, ActionData::Scalar(label.to_string()))
    }

    /// Whether the data lists news bin ids.
    pub fn targets_news_bins(&self) -> bool {
        self.action_id == Self::MOVE_NEWS || self.action_id == Self::COPY_NEWS
    }

    pub fn targets_label(&self) -> bool {
        self.action_id == Self::LABEL_NEWS
    }
}

fn ids(values: &[i64]) -> Vec<String> {
    values.iter().map(i64::to_string).collect()
}
