use super::common::{self, date};
use super::{FormatInterpreter, InterpretContext};
use crate::error::InterpretError;
use crate::model::{Category, Feed, News, Person, Source, Target};
use crate::util::{parse_date, split_values, to_uri};
use crate::xml::{Document, Element};

/// Maximum outline nesting followed; deeper outlines are ignored.
pub(crate) const MAX_OUTLINE_DEPTH: usize = 50;

/// OPML read as a feed: every outline becomes a news item.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpmlInterpreter;

impl FormatInterpreter for OpmlInterpreter {
    fn interpret(
        &self,
        document: &Document,
        feed: &mut Feed,
        ctx: &mut InterpretContext<'_>,
    ) -> Result<(), InterpretError> {
        let root = document.root().ok_or(InterpretError::NoRootElement)?;

        feed.format = Some(match root.attribute("version") {
            Some(version) => format!("OPML {}", version.trim()),
            None => "OPML".to_owned(),
        });

        ctx.scoped(root, |ctx| {
            ctx.visit_attributes(root, Target::Feed(feed));
            for child in root.elements() {
                if ctx.visit_element(child, Target::Feed(feed)).is_handled() {
                    continue;
                }
                match child.lowercase_name().as_str() {
                    "head" => process_head(child, feed, ctx),
                    "body" => process_outlines(child, feed, ctx, 0),
                    _ => {}
                }
            }
        });
        Ok(())
    }
}

fn process_head(head: &Element, feed: &mut Feed, ctx: &mut InterpretContext<'_>) {
    let mut owner = Person::default();

    for child in head.elements() {
        if ctx.visit_element(child, Target::Feed(feed)).is_handled() {
            continue;
        }
        match child.lowercase_name().as_str() {
            "title" => feed.title = child.text(),
            "datecreated" => feed.publish_date = date(child),
            "datemodified" => feed.last_modified_date = date(child),
            "ownername" => owner.name = child.text(),
            "owneremail" => owner.email = child.text(),
            "ownerid" => owner.uri = common::uri(child, ctx),
            _ => {}
        }
    }

    Target::Feed(feed).set_author(owner);
}

fn process_outlines(parent: &Element, feed: &mut Feed, ctx: &mut InterpretContext<'_>, depth: usize) {
    if depth >= MAX_OUTLINE_DEPTH {
        tracing::warn!(depth, "Ignoring outlines nested too deeply");
        return;
    }
    for outline in parent.children_named("outline") {
        if ctx.visit_element(outline, Target::Feed(feed)).is_handled() {
            continue;
        }
        process_outline(outline, feed, ctx);
        process_outlines(outline, feed, ctx, depth + 1);
    }
}

fn process_outline(outline: &Element, feed: &mut Feed, ctx: &mut InterpretContext<'_>) {
    let mut news = common::new_news(ctx);
    ctx.scoped(outline, |ctx| process_outline_attributes(outline, &mut news, ctx));
    feed.news.push(news);
}

fn process_outline_attributes(outline: &Element, news: &mut News, ctx: &mut InterpretContext<'_>) {
    for attribute in &outline.attributes {
        if ctx
            .visit_attribute(attribute, Target::News(news))
            .is_handled()
        {
            continue;
        }
        let value = attribute.value.trim();
        match attribute.name.to_ascii_lowercase().as_str() {
            "text" => {
                if !value.is_empty() {
                    news.title = Some(value.to_owned());
                }
            }
            "title" => {
                if news.title.is_none() && !value.is_empty() {
                    news.title = Some(value.to_owned());
                }
            }
            "htmlurl" | "url" => {
                if let Some(link) = ctx.resolve(value) {
                    news.link = Some(link);
                }
            }
            "xmlurl" => {
                news.source = Some(Source {
                    name: None,
                    link: to_uri(value, ctx.base()),
                })
            }
            "description" => {
                if !value.is_empty() {
                    news.description = Some(value.to_owned());
                }
            }
            "created" => news.publish_date = parse_date(value),
            "category" => {
                news.categories
                    .extend(split_values(value).map(Category::named));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::feed::Dispatcher;
    use crate::xml::DocumentParser;

    #[test]
    fn test_each_outline_is_news() {
        let document = DocumentParser::default()
            .parse_str(
                r#"<opml version="2.0">
  <head>
    <title>Reading list</title>
    <dateCreated>Mon, 31 Oct 2005 19:23:00 GMT</dateCreated>
    <ownerName>Dave</ownerName>
  </head>
  <body>
    <outline text="Tech" category="a,b">
      <outline text="Example" type="rss" xmlUrl="https://example.com/rss" htmlUrl="https://example.com/"/>
    </outline>
    <outline title="Only title" description="d"/>
  </body>
</opml>"#,
            )
            .unwrap();
        let feed = Dispatcher::builtin().interpret(&document).unwrap();

        assert_eq!(feed.format.as_deref(), Some("OPML 2.0"));
        assert_eq!(feed.title.as_deref(), Some("Reading list"));
        assert!(feed.publish_date.is_some());
        assert_eq!(feed.author.as_ref().and_then(|a| a.name.as_deref()), Some("Dave"));

        let titles: Vec<_> = feed.news.iter().map(|n| n.title.as_deref()).collect();
        assert_eq!(titles, vec![Some("Tech"), Some("Example"), Some("Only title")]);
        assert_eq!(feed.news[0].categories.len(), 2);
        assert_eq!(
            feed.news[1].link.as_ref().map(|u| u.as_str()),
            Some("https://example.com/")
        );
        assert!(feed.news[0].received_date > feed.news[2].received_date);
    }
}
