use super::common::{self, attachment, category, date, rich_text};
use super::{FormatInterpreter, InterpretContext};
use crate::error::InterpretError;
use crate::model::{Feed, Guid, Image, News, Source, Target};
use crate::xml::{Document, Element};

/// Atom 1.0 and the older 0.3 draft (`<feed>` root).
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomInterpreter;

impl FormatInterpreter for AtomInterpreter {
    fn interpret(
        &self,
        document: &Document,
        feed: &mut Feed,
        ctx: &mut InterpretContext<'_>,
    ) -> Result<(), InterpretError> {
        let root = document.root().ok_or(InterpretError::NoRootElement)?;

        feed.format = Some(match root.attribute("version") {
            Some(version) => format!("Atom {}", version.trim()),
            None => "Atom 1.0".to_owned(),
        });

        ctx.scoped(root, |ctx| {
            ctx.visit_attributes(root, Target::Feed(feed));
            if feed.base.is_none() {
                feed.base = ctx.base().cloned();
            }
            let homepage = root
                .elements()
                .filter(|child| child.is("link") && child.namespace == root.namespace)
                .filter(|link| rel(link) == "alternate")
                .find_map(|link| common::attribute_uri(link, "href", ctx));
            ctx.set_homepage(homepage);

            for child in root.elements() {
                if ctx.visit_element(child, Target::Feed(feed)).is_handled() {
                    continue;
                }
                match child.lowercase_name().as_str() {
                    "title" => feed.title = rich_text(child),
                    "subtitle" | "tagline" => feed.description = rich_text(child),
                    "rights" | "copyright" => feed.copyright = rich_text(child),
                    "link" => process_feed_link(child, feed, ctx),
                    "updated" | "modified" => feed.last_modified_date = date(child),
                    "published" | "issued" => feed.publish_date = date(child),
                    "generator" => feed.generator = child.text(),
                    "author" => {
                        let author = common::person(child, ctx);
                        Target::Feed(feed).set_author(author);
                    }
                    // A contributor only stands in for a missing author.
                    "contributor" if feed.author.is_none() => {
                        let contributor = common::person(child, ctx);
                        Target::Feed(feed).set_author(contributor);
                    }
                    "category" => {
                        if let Some(category) = category(child, "scheme") {
                            feed.categories.push(category);
                        }
                    }
                    "icon" => {
                        let image = feed.image.get_or_insert_with(Image::default);
                        if image.link.is_none() {
                            image.link = common::uri(child, ctx);
                        }
                    }
                    "logo" => {
                        let image = feed.image.get_or_insert_with(Image::default);
                        image.link = common::uri(child, ctx).or(image.link.take());
                    }
                    "entry" => process_entry(child, feed, ctx),
                    _ => {}
                }
            }
        });
        Ok(())
    }
}

/// Relation of an Atom link; `alternate` when missing.
fn rel(link: &Element) -> String {
    link.attribute("rel")
        .map(|rel| rel.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "alternate".to_owned())
}

fn process_feed_link(link: &Element, feed: &mut Feed, ctx: &InterpretContext<'_>) {
    if rel(link) == "alternate" && feed.homepage.is_none() {
        feed.homepage = common::attribute_uri(link, "href", ctx);
    }
}

fn process_entry(entry: &Element, feed: &mut Feed, ctx: &mut InterpretContext<'_>) {
    let mut news = common::new_news(ctx);
    let mut has_content = false;

    ctx.scoped(entry, |ctx| {
        ctx.visit_attributes(entry, Target::News(&mut news));
        news.base = ctx.base().cloned();

        for child in entry.elements() {
            if ctx.visit_element(child, Target::News(&mut news)).is_handled() {
                continue;
            }
            match child.lowercase_name().as_str() {
                "title" => news.title = rich_text(child),
                "link" => process_entry_link(child, &mut news, ctx),
                "id" => {
                    if let Some(value) = child.text() {
                        news.guid = Some(Guid {
                            value,
                            is_permalink: Some(false),
                        });
                    }
                }
                "summary" => {
                    if !has_content {
                        news.description = rich_text(child);
                    }
                }
                "content" => {
                    if let Some(text) = rich_text(child) {
                        news.description = Some(text);
                        has_content = true;
                    }
                }
                "updated" | "modified" => news.modified_date = date(child),
                "published" | "issued" | "created" => {
                    if news.publish_date.is_none() || !child.is("created") {
                        news.publish_date = date(child);
                    }
                }
                "author" => {
                    let author = common::person(child, ctx);
                    Target::News(&mut news).set_author(author);
                }
                "contributor" if news.author.is_none() => {
                    let contributor = common::person(child, ctx);
                    Target::News(&mut news).set_author(contributor);
                }
                "category" => {
                    if let Some(category) = category(child, "scheme") {
                        news.categories.push(category);
                    }
                }
                "source" => news.source = Some(process_source(child, ctx)),
                _ => {}
            }
        }
    });

    feed.news.push(news);
}

fn process_entry_link(link: &Element, news: &mut News, ctx: &InterpretContext<'_>) {
    let href = common::attribute_uri(link, "href", ctx);
    match rel(link).as_str() {
        "alternate" => {
            if news.link.is_none() {
                news.link = href;
            }
        }
        "enclosure" => {
            if let Some(enclosure) =
                attachment(href, link.attribute("type"), link.attribute("length"))
            {
                news.add_attachment(enclosure);
            }
        }
        "replies" => news.comments = href,
        _ => {}
    }
}

fn process_source(element: &Element, ctx: &mut InterpretContext<'_>) -> Source {
    let mut source = Source::default();
    for child in element.elements() {
        if ctx
            .visit_element(child, Target::Source(&mut source))
            .is_handled()
        {
            continue;
        }
        match child.lowercase_name().as_str() {
            "title" => source.name = child.text(),
            "link" if rel(child) == "alternate" => {
                source.link = common::attribute_uri(child, "href", ctx);
            }
            _ => {}
        }
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Dispatcher;
    use crate::xml::DocumentParser;

    fn interpret(text: &str) -> Feed {
        let document = DocumentParser::default().parse_str(text).unwrap();
        Dispatcher::builtin().interpret(&document).unwrap()
    }

    #[test]
    fn test_atom_feed_and_entry() {
        let feed = interpret(
            r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:base="https://example.com/">
  <title type="text">Example Feed</title>
  <subtitle>All the things</subtitle>
  <link href="/" />
  <link rel="self" href="/feed.atom" />
  <updated>2003-12-13T18:30:02Z</updated>
  <author><name>John Doe</name><email>john@example.com</email></author>
  <category term="rust" scheme="https://example.com/tags"/>
  <logo>/logo.png</logo>
  <entry>
    <title>Atom-Powered Robots Run Amok</title>
    <link href="2003/12/13/atom03"/>
    <link rel="enclosure" href="/a.mp3" type="audio/mpeg" length="42"/>
    <link rel="enclosure" href="https://example.com/a.mp3"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2003-12-13T18:30:02Z</updated>
    <summary>Some text.</summary>
    <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><p>Full <b>text</b></p></div></content>
  </entry>
</feed>"#,
        );

        assert_eq!(feed.format.as_deref(), Some("Atom 1.0"));
        assert_eq!(feed.title.as_deref(), Some("Example Feed"));
        assert_eq!(feed.description.as_deref(), Some("All the things"));
        assert_eq!(feed.homepage.as_ref().map(|u| u.as_str()), Some("https://example.com/"));
        assert!(feed.last_modified_date.is_some());
        assert_eq!(
            feed.author.as_ref().and_then(|a| a.name.as_deref()),
            Some("John Doe")
        );
        assert_eq!(feed.categories[0].name.as_deref(), Some("rust"));
        assert_eq!(
            feed.image.as_ref().and_then(|i| i.link.as_ref()).map(|u| u.as_str()),
            Some("https://example.com/logo.png")
        );

        let news = &feed.news[0];
        assert_eq!(
            news.link.as_ref().map(|u| u.as_str()),
            Some("https://example.com/2003/12/13/atom03")
        );
        assert_eq!(news.attachments.len(), 1);
        assert_eq!(news.attachments[0].length, 42);
        assert_eq!(
            news.description.as_deref(),
            Some("<div><p>Full <b>text</b></p></div>")
        );
        assert_eq!(news.guid.as_ref().unwrap().is_permalink, Some(false));
    }

    #[test]
    fn test_atom_03_version_label() {
        let feed = interpret(
            r#"<feed version="0.3" xmlns="http://purl.org/atom/ns#">
  <tagline>Old style</tagline>
  <entry><title>One</title><issued>2004-01-01T00:00:00Z</issued><content mode="escaped">&lt;p&gt;x&lt;/p&gt;</content></entry>
</feed>"#,
        );
        assert_eq!(feed.format.as_deref(), Some("Atom 0.3"));
        assert_eq!(feed.description.as_deref(), Some("Old style"));
        assert!(feed.news[0].publish_date.is_some());
        assert_eq!(feed.news[0].description.as_deref(), Some("<p>x</p>"));
    }

    #[test]
    fn test_summary_does_not_replace_content() {
        let feed = interpret(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><content>Full</content><summary>Short</summary></entry></feed>"#,
        );
        assert_eq!(feed.news[0].description.as_deref(), Some("Full"));
    }

    fn author_name(author: Option<&crate::model::Person>) -> Option<&str> {
        author.and_then(|person| person.name.as_deref())
    }

    #[test]
    fn test_contributor_fills_missing_author() {
        let feed = interpret(
            r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <contributor><name>Lee</name></contributor>
  <entry><title>Only credited</title><contributor><name>Kim</name></contributor></entry>
  <entry>
    <title>Both</title>
    <contributor><name>Kim</name></contributor>
    <author><name>Ada</name></author>
    <contributor><name>Bo</name></contributor>
  </entry>
</feed>"#,
        );

        assert_eq!(author_name(feed.author.as_ref()), Some("Lee"));
        assert_eq!(author_name(feed.news[0].author.as_ref()), Some("Kim"));
        assert_eq!(author_name(feed.news[1].author.as_ref()), Some("Ada"));
    }

    #[test]
    fn test_relative_links_resolve_against_alternate_link() {
        let feed = interpret(
            r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <link rel="self" href="https://feeds.example.org/atom"/>
  <link href="https://example.com/blog/"/>
  <entry>
    <link href="posts/1"/>
    <link rel="enclosure" href="/media/a.mp3" type="audio/mpeg"/>
  </entry>
</feed>"#,
        );

        let news = &feed.news[0];
        assert_eq!(
            news.link.as_ref().map(|u| u.as_str()),
            Some("https://example.com/blog/posts/1")
        );
        assert_eq!(news.attachments[0].link.as_str(), "https://example.com/media/a.mp3");
    }
}
