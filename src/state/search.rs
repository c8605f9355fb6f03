use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a serialized search condition could not be rebuilt.
///
/// Only the affected condition is dropped; the rest of the search imports.
#[derive(Debug, Error, PartialEq)]
pub enum ConditionError {
    #[error("Search condition is missing its {0}")]
    Missing(&'static str),

    #[error("Unknown search field: {0}")]
    UnknownField(String),

    #[error("Unknown search specifier: {0}")]
    UnknownSpecifier(String),

    #[error("Invalid {kind} search value: {value}")]
    InvalidValue { kind: String, value: String },
}

// ============================================================================
// Fields
// ============================================================================

/// The news property a condition tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    AllFields,
    Title,
    Description,
    Author,
    Category,
    Source,
    Link,
    Feed,
    PublishDate,
    ModifiedDate,
    ReceiveDate,
    AgeInDays,
    State,
    IsFlagged,
    Rating,
    HasAttachments,
    AttachmentContent,
    Label,
    Location,
}

const FIELD_NAMES: &[(SearchField, &str)] = &[
    (SearchField::AllFields, "allFields"),
    (SearchField::Title, "title"),
    (SearchField::Description, "description"),
    (SearchField::Author, "author"),
    (SearchField::Category, "category"),
    (SearchField::Source, "source"),
    (SearchField::Link, "link"),
    (SearchField::Feed, "feed"),
    (SearchField::PublishDate, "publishDate"),
    (SearchField::ModifiedDate, "modifiedDate"),
    (SearchField::ReceiveDate, "receiveDate"),
    (SearchField::AgeInDays, "ageInDays"),
    (SearchField::State, "state"),
    (SearchField::IsFlagged, "isFlagged"),
    (SearchField::Rating, "rating"),
    (SearchField::HasAttachments, "hasAttachments"),
    (SearchField::AttachmentContent, "attachmentContent"),
    (SearchField::Label, "label"),
    (SearchField::Location, "location"),
];

/// Field names written by exports older than 2.0.
const LEGACY_FIELD_NAMES: &[(&str, SearchField)] = &[
    ("allfield", SearchField::AllFields),
    ("newstitle", SearchField::Title),
    ("newsdescription", SearchField::Description),
    ("newstext", SearchField::Description),
    ("newsauthor", SearchField::Author),
    ("newscategory", SearchField::Category),
    ("newssource", SearchField::Source),
    ("newslink", SearchField::Link),
    ("newsfeed", SearchField::Feed),
    ("pubdate", SearchField::PublishDate),
    ("newspubdate", SearchField::PublishDate),
    ("newsmodifieddate", SearchField::ModifiedDate),
    ("newsreceivedate", SearchField::ReceiveDate),
    ("newsstate", SearchField::State),
    ("flag", SearchField::IsFlagged),
    ("flagged", SearchField::IsFlagged),
    ("newsrating", SearchField::Rating),
    ("attachments", SearchField::HasAttachments),
    ("newslabel", SearchField::Label),
    ("folder", SearchField::Location),
];

impl SearchField {
    pub fn name(self) -> &'static str {
        FIELD_NAMES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, name)| *name)
            .unwrap_or("allFields")
    }

    /// Resolves a current or pre-2.0 field name, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, ConditionError> {
        let name = name.trim();
        FIELD_NAMES
            .iter()
            .find(|(_, canonical)| canonical.eq_ignore_ascii_case(name))
            .map(|(field, _)| *field)
            .or_else(|| {
                LEGACY_FIELD_NAMES
                    .iter()
                    .find(|(legacy, _)| legacy.eq_ignore_ascii_case(name))
                    .map(|(_, field)| *field)
            })
            .ok_or_else(|| ConditionError::UnknownField(name.to_owned()))
    }
}

// ============================================================================
// Specifiers
// ============================================================================

/// How the field is compared with the value. Serialized by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchSpecifier {
    Is,
    IsNot,
    Contains,
    ContainsAll,
    ContainsNot,
    BeginsWith,
    EndsWith,
    IsBefore,
    IsAfter,
    IsGreaterThan,
    IsLessThan,
    SimilarTo,
    ScopeAll,
}

const SPECIFIERS: &[SearchSpecifier] = &[
    SearchSpecifier::Is,
    SearchSpecifier::IsNot,
    SearchSpecifier::Contains,
    SearchSpecifier::ContainsAll,
    SearchSpecifier::ContainsNot,
    SearchSpecifier::BeginsWith,
    SearchSpecifier::EndsWith,
    SearchSpecifier::IsBefore,
    SearchSpecifier::IsAfter,
    SearchSpecifier::IsGreaterThan,
    SearchSpecifier::IsLessThan,
    SearchSpecifier::SimilarTo,
    SearchSpecifier::ScopeAll,
];

impl SearchSpecifier {
    pub fn id(self) -> usize {
        SPECIFIERS
            .iter()
            .position(|specifier| *specifier == self)
            .unwrap_or_default()
    }

    pub fn from_id(id: &str) -> Result<Self, ConditionError> {
        id.trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| SPECIFIERS.get(index).copied())
            .ok_or_else(|| ConditionError::UnknownSpecifier(id.to_owned()))
    }
}

// ============================================================================
// Values
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NewsState {
    New,
    Unread,
    Read,
    Updated,
    Hidden,
    Deleted,
}

const STATE_NAMES: &[(NewsState, &str)] = &[
    (NewsState::New, "NEW"),
    (NewsState::Unread, "UNREAD"),
    (NewsState::Read, "READ"),
    (NewsState::Updated, "UPDATED"),
    (NewsState::Hidden, "HIDDEN"),
    (NewsState::Deleted, "DELETED"),
];

impl NewsState {
    pub fn name(self) -> &'static str {
        STATE_NAMES
            .iter()
            .find(|(state, _)| *state == self)
            .map(|(_, name)| *name)
            .unwrap_or("NEW")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        STATE_NAMES
            .iter()
            .find(|(_, candidate)| candidate.eq_ignore_ascii_case(name.trim()))
            .map(|(state, _)| *state)
    }
}

/// Folders, bookmarks and news bins a search is restricted to, by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationScope {
    pub folders: Vec<i64>,
    pub bookmarks: Vec<i64>,
    pub news_bins: Vec<i64>,
}

impl LocationScope {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.bookmarks.is_empty() && self.news_bins.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchValue {
    Text(String),
    Number(i64),
    Boolean(bool),
    Date(DateTime<Utc>),
    States(Vec<NewsState>),
    Location(LocationScope),
}

impl SearchValue {
    /// Type tag written next to the value.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchValue::Text(_) => "string",
            SearchValue::Number(_) => "number",
            SearchValue::Boolean(_) => "boolean",
            SearchValue::Date(_) => "date",
            SearchValue::States(_) => "states",
            SearchValue::Location(_) => "location",
        }
    }

    /// Scalar text form; `None` for location scopes, which are structured.
    pub fn to_text(&self) -> Option<String> {
        Some(match self {
            SearchValue::Text(text) => text.clone(),
            SearchValue::Number(number) => number.to_string(),
            SearchValue::Boolean(flag) => flag.to_string(),
            SearchValue::Date(date) => date.to_rfc3339(),
            SearchValue::States(states) => states
                .iter()
                .map(|state| state.name())
                .collect::<Vec<_>>()
                .join(","),
            SearchValue::Location(_) => return None,
        })
    }

    /// Rebuilds a scalar value from its type tag and text.
    pub fn from_text(kind: &str, text: &str) -> Result<Self, ConditionError> {
        let invalid = || ConditionError::InvalidValue {
            kind: kind.to_owned(),
            value: text.to_owned(),
        };
        match kind.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(SearchValue::Text(text.to_owned())),
            "number" => text.trim().parse().map(SearchValue::Number).map_err(|_| invalid()),
            "boolean" => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(SearchValue::Boolean(true)),
                "false" => Ok(SearchValue::Boolean(false)),
                _ => Err(invalid()),
            },
            "date" => DateTime::parse_from_rfc3339(text.trim())
                .map(|date| SearchValue::Date(date.with_timezone(&Utc)))
                .map_err(|_| invalid()),
            "states" => crate::util::split_values(text)
                .map(|name| NewsState::from_name(name).ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()
                .map(SearchValue::States),
            _ => Err(invalid()),
        }
    }
}

/// One `field specifier value` clause of a saved search or filter.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCondition {
    pub field: SearchField,
    pub specifier: SearchSpecifier,
    pub value: SearchValue,
}

impl SearchCondition {
    pub fn new(field: SearchField, specifier: SearchSpecifier, value: SearchValue) -> Self {
        Self {
            field,
            specifier,
            value,
        }
    }

    pub fn location(&self) -> Option<&LocationScope> {
        match &self.value {
            SearchValue::Location(scope) => Some(scope),
            _ => None,
        }
    }
}

/// A set of conditions combined with AND (`match_all`) or OR.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Search {
    pub match_all: bool,
    pub conditions: Vec<SearchCondition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_field_names_resolve() {
        assert_eq!(SearchField::from_name("newsTitle"), Ok(SearchField::Title));
        assert_eq!(SearchField::from_name("PUBLISHDATE"), Ok(SearchField::PublishDate));
        assert_eq!(
            SearchField::from_name("bogus"),
            Err(ConditionError::UnknownField("bogus".to_owned()))
        );
    }

    #[test]
    fn test_specifier_ids_are_positions() {
        assert_eq!(SearchSpecifier::Contains.id(), 2);
        assert_eq!(SearchSpecifier::from_id("2"), Ok(SearchSpecifier::Contains));
        assert!(SearchSpecifier::from_id("99").is_err());
        assert!(SearchSpecifier::from_id("x").is_err());
    }

    #[test]
    fn test_value_parsing() {
        assert_eq!(SearchValue::from_text("number", " 5 "), Ok(SearchValue::Number(5)));
        assert_eq!(
            SearchValue::from_text("states", "NEW,unread"),
            Ok(SearchValue::States(vec![NewsState::New, NewsState::Unread]))
        );
        assert!(SearchValue::from_text("boolean", "maybe").is_err());
        assert!(SearchValue::from_text("states", "NEW,GONE").is_err());
        assert!(SearchValue::from_text("mystery", "x").is_err());
    }
}
