use url::Url;

use super::common::{self, date};
use super::{FormatInterpreter, InterpretContext};
use crate::error::InterpretError;
use crate::model::{Category, Feed, Person, Target};
use crate::util::to_uri;
use crate::xml::{Document, Element};

/// Path of the bug page below the installation's `urlbase`.
const SHOW_BUG: &str = "show_bug.cgi?id=";

/// Bugzilla XML export (`<bugzilla>` root): the bug is the feed, every
/// comment (`long_desc`) a news item.
#[derive(Debug, Default, Clone, Copy)]
pub struct BugzillaInterpreter;

impl FormatInterpreter for BugzillaInterpreter {
    fn interpret(
        &self,
        document: &Document,
        feed: &mut Feed,
        ctx: &mut InterpretContext<'_>,
    ) -> Result<(), InterpretError> {
        let root = document.root().ok_or(InterpretError::NoRootElement)?;

        feed.format = Some(match root.attribute("version") {
            Some(version) => format!("Bugzilla {}", version.trim()),
            None => "Bugzilla".to_owned(),
        });
        let url_base = root.attribute("urlbase").map(str::trim).unwrap_or_default();

        ctx.scoped(root, |ctx| {
            ctx.visit_attributes(root, Target::Feed(feed));
            for child in root.elements() {
                if ctx.visit_element(child, Target::Feed(feed)).is_handled() {
                    continue;
                }
                if child.is("bug") {
                    process_bug(child, url_base, feed, ctx);
                }
            }
        });
        Ok(())
    }
}

fn process_bug(bug: &Element, url_base: &str, feed: &mut Feed, ctx: &mut InterpretContext<'_>) {
    let mut comment_index = 0;

    for child in bug.elements() {
        if ctx.visit_element(child, Target::Feed(feed)).is_handled() {
            continue;
        }
        match child.lowercase_name().as_str() {
            "bug_id" => {
                if let Some(id) = child.text() {
                    feed.homepage = to_uri(&format!("{url_base}{SHOW_BUG}{id}"), None);
                }
            }
            "short_desc" => feed.title = child.text(),
            "creation_ts" => feed.publish_date = date(child),
            "delta_ts" => feed.last_modified_date = date(child),
            "reporter" => Target::Feed(feed).set_author(who(child)),
            "product" | "component" | "keywords" => {
                if let Some(name) = child.text() {
                    feed.categories.push(Category {
                        name: Some(name),
                        domain: Some(child.lowercase_name()),
                    });
                }
            }
            "long_desc" => {
                process_comment(child, comment_index, feed, ctx);
                comment_index += 1;
            }
            _ => {}
        }
    }
}

fn process_comment(
    comment: &Element,
    index: usize,
    feed: &mut Feed,
    ctx: &mut InterpretContext<'_>,
) {
    let mut news = common::new_news(ctx);
    news.title = Some(format!("Comment #{index}"));
    news.link = feed.homepage.as_ref().map(|page| comment_link(page, index));

    ctx.visit_attributes(comment, Target::News(&mut news));
    for child in comment.elements() {
        if ctx.visit_element(child, Target::News(&mut news)).is_handled() {
            continue;
        }
        match child.lowercase_name().as_str() {
            "who" => Target::News(&mut news).set_author(who(child)),
            "bug_when" => news.publish_date = date(child),
            "thetext" => news.description = child.text(),
            _ => {}
        }
    }

    feed.news.push(news);
}

fn comment_link(page: &Url, index: usize) -> Url {
    let mut link = page.clone();
    link.set_fragment(Some(&format!("c{index}")));
    link
}

/// `<who name="Real Name">login</who>`; logins are usually mail addresses.
fn who(element: &Element) -> Person {
    let login = element.text();
    let name = element
        .attribute("name")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned);
    match login {
        Some(login) if login.contains('@') => Person {
            name: name.or_else(|| Some(login.clone())),
            email: Some(login),
            uri: None,
        },
        login => Person {
            name: name.or(login),
            ..Person::default()
        },
    }
}
