//! Normalized feed model populated by the format interpreters.
//!
//! Entities are created fresh for every interpretation and only ever
//! written to by the engine. Handing them to storage is the caller's job.

mod feed;
mod news;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

pub use feed::{Cloud, Feed, Image, TextInput};
pub use news::{Attachment, Guid, News, Source};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Person {
    pub name: Option<String>,
    pub email: Option<String>,
    pub uri: Option<Url>,
}

impl Person {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.uri.is_none()
    }

    /// Parses the RSS `author`/`managingEditor` form `"mail@host (Real Name)"`.
    ///
    /// Text without an `@` is taken as a plain name.
    pub fn from_rss(text: &str) -> Self {
        let text = text.trim();
        if let (Some(open), true) = (text.find('('), text.ends_with(')')) {
            let address = text[..open].trim();
            let name = text[open + 1..text.len() - 1].trim();
            return Self {
                name: (!name.is_empty()).then(|| name.to_owned()),
                email: (!address.is_empty()).then(|| address.to_owned()),
                uri: None,
            };
        }
        if text.contains('@') && !text.contains(char::is_whitespace) {
            Self {
                email: Some(text.to_owned()),
                ..Self::default()
            }
        } else {
            Self::named(text)
        }
    }
}

/// A category, optionally qualified by its taxonomy (`domain` / `scheme`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Category {
    pub name: Option<String>,
    pub domain: Option<String>,
}

impl Category {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            domain: None,
        }
    }
}

// ============================================================================
// Handler Targets
// ============================================================================

/// The entity an element or attribute is being applied to.
///
/// Namespace and element handlers receive one of these so the same handler
/// can populate a feed, a news item or one of their children.
#[derive(Debug)]
pub enum Target<'a> {
    Feed(&'a mut Feed),
    News(&'a mut News),
    Image(&'a mut Image),
    TextInput(&'a mut TextInput),
    Cloud(&'a mut Cloud),
    Source(&'a mut Source),
    Person(&'a mut Person),
    Attachment(&'a mut Attachment),
}

impl Target<'_> {
    /// Shorter-lived copy of this target, for passing down a call chain.
    pub fn reborrow(&mut self) -> Target<'_> {
        match self {
            Target::Feed(feed) => Target::Feed(feed),
            Target::News(news) => Target::News(news),
            Target::Image(image) => Target::Image(image),
            Target::TextInput(input) => Target::TextInput(input),
            Target::Cloud(cloud) => Target::Cloud(cloud),
            Target::Source(source) => Target::Source(source),
            Target::Person(person) => Target::Person(person),
            Target::Attachment(attachment) => Target::Attachment(attachment),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Target::Feed(_) => "feed",
            Target::News(_) => "news",
            Target::Image(_) => "image",
            Target::TextInput(_) => "textinput",
            Target::Cloud(_) => "cloud",
            Target::Source(_) => "source",
            Target::Person(_) => "person",
            Target::Attachment(_) => "attachment",
        }
    }

    pub fn set_title(&mut self, title: String) {
        match self {
            Target::Feed(feed) => feed.title = Some(title),
            Target::News(news) => news.title = Some(title),
            Target::Image(image) => image.title = Some(title),
            Target::TextInput(input) => input.title = Some(title),
            Target::Source(source) => source.name = Some(title),
            _ => {}
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Target::Feed(feed) => feed.description.as_deref(),
            Target::News(news) => news.description.as_deref(),
            Target::Image(image) => image.description.as_deref(),
            Target::TextInput(input) => input.description.as_deref(),
            _ => None,
        }
    }

    pub fn set_description(&mut self, description: String) {
        match self {
            Target::Feed(feed) => feed.description = Some(description),
            Target::News(news) => news.description = Some(description),
            Target::Image(image) => image.description = Some(description),
            Target::TextInput(input) => input.description = Some(description),
            _ => {}
        }
    }

    /// Sets the primary link: homepage for feeds, permalink for news.
    pub fn set_link(&mut self, link: Url) {
        match self {
            Target::Feed(feed) => feed.homepage = Some(link),
            Target::News(news) => news.link = Some(link),
            Target::Image(image) => image.homepage = Some(link),
            Target::TextInput(input) => input.link = Some(link),
            Target::Source(source) => source.link = Some(link),
            Target::Person(person) => person.uri = Some(link),
            Target::Attachment(attachment) => attachment.link = link,
            Target::Cloud(_) => {}
        }
    }

    pub fn has_link(&self) -> bool {
        match self {
            Target::Feed(feed) => feed.homepage.is_some(),
            Target::News(news) => news.link.is_some(),
            Target::Image(image) => image.homepage.is_some(),
            Target::TextInput(input) => input.link.is_some(),
            Target::Source(source) => source.link.is_some(),
            Target::Person(person) => person.uri.is_some(),
            Target::Attachment(_) => true,
            Target::Cloud(_) => false,
        }
    }

    pub fn set_base(&mut self, base: Url) {
        match self {
            Target::Feed(feed) => feed.base = Some(base),
            Target::News(news) => news.base = Some(base),
            _ => {}
        }
    }

    pub fn set_language(&mut self, language: String) {
        if let Target::Feed(feed) = self {
            feed.language = Some(language);
        }
    }

    pub fn set_copyright(&mut self, copyright: String) {
        if let Target::Feed(feed) = self {
            feed.copyright = Some(copyright);
        }
    }

    pub fn author(&self) -> Option<&Person> {
        match self {
            Target::Feed(feed) => feed.author.as_ref(),
            Target::News(news) => news.author.as_ref(),
            _ => None,
        }
    }

    pub fn set_author(&mut self, author: Person) {
        if author.is_empty() {
            return;
        }
        match self {
            Target::Feed(feed) => feed.author = Some(author),
            Target::News(news) => news.author = Some(author),
            _ => {}
        }
    }

    pub fn add_category(&mut self, category: Category) {
        match self {
            Target::Feed(feed) => feed.categories.push(category),
            Target::News(news) => news.categories.push(category),
            _ => {}
        }
    }

    pub fn set_publish_date(&mut self, date: DateTime<Utc>) {
        match self {
            Target::Feed(feed) => feed.publish_date = Some(date),
            Target::News(news) => news.publish_date = Some(date),
            _ => {}
        }
    }

    pub fn set_modified_date(&mut self, date: DateTime<Utc>) {
        match self {
            Target::Feed(feed) => feed.last_modified_date = Some(date),
            Target::News(news) => news.modified_date = Some(date),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_from_rss_with_name() {
        let person = Person::from_rss("editor@example.com (Jane Doe)");
        assert_eq!(person.email.as_deref(), Some("editor@example.com"));
        assert_eq!(person.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_person_from_rss_plain_forms() {
        assert_eq!(
            Person::from_rss("jane@example.com").email.as_deref(),
            Some("jane@example.com")
        );
        assert_eq!(Person::from_rss("Jane Doe").name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_target_routes_fields_by_entity() {
        let mut feed = Feed::new();
        let mut target = Target::Feed(&mut feed);
        target.set_title("Feed".to_string());
        target.set_language("en".to_string());
        target.add_category(Category::named("rust"));
        assert_eq!(target.kind(), "feed");

        let mut news = News::new(Utc::now());
        let mut target = Target::News(&mut news);
        target.set_title("Item".to_string());
        target.set_language("ignored".to_string());

        assert_eq!(feed.title.as_deref(), Some("Feed"));
        assert_eq!(feed.language.as_deref(), Some("en"));
        assert_eq!(feed.categories.len(), 1);
        assert_eq!(news.title.as_deref(), Some("Item"));
    }

    #[test]
    fn test_empty_author_is_ignored() {
        let mut feed = Feed::new();
        Target::Feed(&mut feed).set_author(Person::default());
        assert!(feed.author.is_none());
    }
}
