use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use super::{Category, News, Person};

/// A syndication document normalized into one shape, whatever its format.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feed {
    /// Format label such as `"RSS 2.0"` or `"Atom 1.0"`.
    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<Url>,
    /// Base for resolving relative links (`xml:base`).
    pub base: Option<Url>,
    pub language: Option<String>,
    pub copyright: Option<String>,
    pub generator: Option<String>,
    pub docs: Option<Url>,
    pub rating: Option<String>,
    pub web_master: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub last_build_date: Option<DateTime<Utc>>,
    pub last_modified_date: Option<DateTime<Utc>>,
    /// Minutes the feed may be cached.
    pub ttl: Option<i32>,
    pub update_period: Option<String>,
    pub update_frequency: Option<i32>,
    pub update_base: Option<DateTime<Utc>>,
    pub skip_hours: Vec<i32>,
    pub skip_days: Vec<String>,
    pub categories: Vec<Category>,
    pub author: Option<Person>,
    pub image: Option<Image>,
    pub text_input: Option<TextInput>,
    pub cloud: Option<Cloud>,
    /// Items in document order.
    pub news: Vec<News>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URI for links inside the channel.
    pub fn base_uri(&self) -> Option<&Url> {
        self.base.as_ref().or(self.homepage.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Image {
    /// Location of the image itself.
    pub link: Option<Url>,
    pub title: Option<String>,
    /// Page the image links to.
    pub homepage: Option<Url>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub name: Option<String>,
    pub link: Option<Url>,
}

/// RSS `<cloud>` registration endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cloud {
    pub domain: Option<String>,
    pub port: Option<i32>,
    pub path: Option<String>,
    pub register_procedure: Option<String>,
    pub protocol: Option<String>,
}
