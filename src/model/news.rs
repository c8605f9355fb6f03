use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use super::{Category, Person};

/// One item, entry, outline or comment of a feed.
///
/// Owned by its [`super::Feed`]; the owning feed is the back-reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct News {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<Url>,
    pub base: Option<Url>,
    pub publish_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    /// Synthetic timestamp that preserves document order when sorting by date.
    pub received_date: DateTime<Utc>,
    pub comments: Option<Url>,
    pub guid: Option<Guid>,
    pub source: Option<Source>,
    pub categories: Vec<Category>,
    pub attachments: Vec<Attachment>,
    pub author: Option<Person>,
}

impl News {
    pub fn new(received_date: DateTime<Utc>) -> Self {
        Self {
            title: None,
            description: None,
            link: None,
            base: None,
            publish_date: None,
            modified_date: None,
            received_date,
            comments: None,
            guid: None,
            source: None,
            categories: Vec::new(),
            attachments: Vec::new(),
            author: None,
        }
    }

    /// Adds `attachment` unless one with the same link is already present.
    ///
    /// Returns whether the attachment was added.
    pub fn add_attachment(&mut self, attachment: Attachment) -> bool {
        if self.attachments.iter().any(|a| a.link == attachment.link) {
            tracing::trace!(link = %attachment.link, "Dropping duplicate attachment");
            return false;
        }
        self.attachments.push(attachment);
        true
    }

    /// The publish date, falling back to the modified date.
    pub fn effective_date(&self) -> DateTime<Utc> {
        self.publish_date
            .or(self.modified_date)
            .unwrap_or(self.received_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub link: Url,
    pub mime_type: Option<String>,
    /// Size in bytes, `-1` when unknown.
    pub length: i64,
}

impl Attachment {
    pub const UNKNOWN_LENGTH: i64 = -1;

    pub fn new(link: Url) -> Self {
        Self {
            link,
            mime_type: None,
            length: Self::UNKNOWN_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Guid {
    pub value: String,
    /// `None` when the document did not say.
    pub is_permalink: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Source {
    pub name: Option<String>,
    pub link: Option<Url>,
}
