use super::common::{self, attachment, category, date, int, rich_text, uri};
use super::{FormatInterpreter, InterpretContext};
use crate::error::InterpretError;
use crate::model::{Cloud, Feed, Guid, Image, News, Person, Source, Target, TextInput};
use crate::util::to_uri;
use crate::xml::{Document, Element};

/// RSS 0.91, 0.92 and 2.0 (`<rss>` root).
#[derive(Debug, Default, Clone, Copy)]
pub struct RssInterpreter;

impl FormatInterpreter for RssInterpreter {
    fn interpret(
        &self,
        document: &Document,
        feed: &mut Feed,
        ctx: &mut InterpretContext<'_>,
    ) -> Result<(), InterpretError> {
        let root = document.root().ok_or(InterpretError::NoRootElement)?;

        feed.format = Some(match root.attribute("version") {
            Some(version) => format!("RSS {}", version.trim()),
            None => "RSS".to_owned(),
        });

        ctx.scoped(root, |ctx| {
            ctx.visit_attributes(root, Target::Feed(feed));
            for child in root.elements() {
                if ctx.visit_element(child, Target::Feed(feed)).is_handled() {
                    continue;
                }
                match child.lowercase_name().as_str() {
                    "channel" => process_channel(child, feed, ctx),
                    // Some 0.9x producers put items next to the channel.
                    "item" => process_item(child, feed, ctx),
                    _ => {}
                }
            }
        });
        Ok(())
    }
}

fn process_channel(channel: &Element, feed: &mut Feed, ctx: &mut InterpretContext<'_>) {
    ctx.scoped(channel, |ctx| {
        ctx.visit_attributes(channel, Target::Feed(feed));
        let homepage = common::homepage_link(channel, ctx);
        ctx.set_homepage(homepage);

        for child in channel.elements() {
            if ctx.visit_element(child, Target::Feed(feed)).is_handled() {
                continue;
            }
            match child.lowercase_name().as_str() {
                "title" => feed.title = child.text(),
                "link" => feed.homepage = uri(child, ctx),
                "description" => feed.description = rich_text(child),
                "language" => feed.language = child.text(),
                "copyright" => feed.copyright = child.text(),
                "managingeditor" => {
                    if let Some(text) = child.text() {
                        Target::Feed(feed).set_author(Person::from_rss(&text));
                    }
                }
                "webmaster" => feed.web_master = child.text(),
                "pubdate" => feed.publish_date = date(child),
                "lastbuilddate" => feed.last_build_date = date(child),
                "category" => {
                    if let Some(category) = category(child, "domain") {
                        feed.categories.push(category);
                    }
                }
                "generator" => feed.generator = child.text(),
                "docs" => feed.docs = uri(child, ctx),
                "cloud" => feed.cloud = Some(process_cloud(child, ctx)),
                "ttl" => feed.ttl = int(child),
                "image" => feed.image = Some(process_image(child, ctx)),
                "rating" => feed.rating = child.text(),
                "textinput" => feed.text_input = Some(process_text_input(child, ctx)),
                "skiphours" => {
                    feed.skip_hours = child
                        .children_named("hour")
                        .filter_map(|hour| int(hour).filter(|h| (0..24).contains(h)))
                        .collect();
                }
                "skipdays" => {
                    feed.skip_days = child
                        .children_named("day")
                        .filter_map(Element::text)
                        .collect();
                }
                "item" => process_item(child, feed, ctx),
                _ => {}
            }
        }
    });
}

fn process_cloud(element: &Element, ctx: &mut InterpretContext<'_>) -> Cloud {
    let mut cloud = Cloud::default();
    for attribute in &element.attributes {
        if ctx
            .visit_attribute(attribute, Target::Cloud(&mut cloud))
            .is_handled()
        {
            continue;
        }
        let value = attribute.value.trim();
        match attribute.name.to_ascii_lowercase().as_str() {
            "domain" => cloud.domain = Some(value.to_owned()),
            "port" => cloud.port = crate::util::parse_int(value),
            "path" => cloud.path = Some(value.to_owned()),
            "registerprocedure" => cloud.register_procedure = Some(value.to_owned()),
            "protocol" => cloud.protocol = Some(value.to_owned()),
            _ => {}
        }
    }
    cloud
}

fn process_image(element: &Element, ctx: &mut InterpretContext<'_>) -> Image {
    let mut image = Image::default();
    ctx.visit_attributes(element, Target::Image(&mut image));
    for child in element.elements() {
        if ctx.visit_element(child, Target::Image(&mut image)).is_handled() {
            continue;
        }
        match child.lowercase_name().as_str() {
            "url" => image.link = uri(child, ctx),
            "title" => image.title = child.text(),
            "link" => image.homepage = uri(child, ctx),
            "width" => image.width = int(child),
            "height" => image.height = int(child),
            "description" => image.description = child.text(),
            _ => {}
        }
    }
    image
}

fn process_text_input(element: &Element, ctx: &mut InterpretContext<'_>) -> TextInput {
    let mut input = TextInput::default();
    ctx.visit_attributes(element, Target::TextInput(&mut input));
    for child in element.elements() {
        if ctx
            .visit_element(child, Target::TextInput(&mut input))
            .is_handled()
        {
            continue;
        }
        match child.lowercase_name().as_str() {
            "title" => input.title = child.text(),
            "description" => input.description = child.text(),
            "name" => input.name = child.text(),
            "link" => input.link = uri(child, ctx),
            _ => {}
        }
    }
    input
}

fn process_item(item: &Element, feed: &mut Feed, ctx: &mut InterpretContext<'_>) {
    let mut news = common::new_news(ctx);

    ctx.scoped(item, |ctx| {
        ctx.visit_attributes(item, Target::News(&mut news));

        for child in item.elements() {
            if ctx.visit_element(child, Target::News(&mut news)).is_handled() {
                continue;
            }
            match child.lowercase_name().as_str() {
                "title" => news.title = child.text(),
                "link" => news.link = uri(child, ctx),
                "description" => {
                    // content:encoded may already have filled the description
                    if news.description.is_none() {
                        news.description = rich_text(child);
                    }
                }
                "author" => {
                    if let Some(text) = child.text() {
                        Target::News(&mut news).set_author(Person::from_rss(&text));
                    }
                }
                "category" => {
                    if let Some(category) = category(child, "domain") {
                        news.categories.push(category);
                    }
                }
                "comments" => news.comments = uri(child, ctx),
                "enclosure" => {
                    let link = common::attribute_uri(child, "url", ctx);
                    if let Some(enclosure) =
                        attachment(link, child.attribute("type"), child.attribute("length"))
                    {
                        news.add_attachment(enclosure);
                    }
                }
                "guid" => news.guid = guid(child),
                "pubdate" => news.publish_date = date(child),
                "source" => {
                    news.source = Some(Source {
                        name: child.text(),
                        link: common::attribute_uri(child, "url", ctx),
                    })
                }
                _ => {}
            }
        }
    });

    link_from_guid(&mut news);
    feed.news.push(news);
}

fn guid(element: &Element) -> Option<Guid> {
    let value = element.text()?;
    let is_permalink = element
        .attribute("isPermaLink")
        .and_then(|flag| match flag.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        });
    Some(Guid {
        value,
        is_permalink,
    })
}

/// A permalink guid doubles as the item link when no `<link>` was given.
fn link_from_guid(news: &mut News) {
    if news.link.is_some() {
        return;
    }
    if let Some(guid) = &news.guid {
        if guid.is_permalink != Some(false) {
            news.link = to_uri(&guid.value, None).filter(|url| !url.cannot_be_a_base());
        }
    }
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
    fn test_channel_fields() {
        let feed = interpret(
            r#"<rss version="2.0">
  <channel>
    <title>Example</title>
    <link>https://example.com/</link>
    <description>Things</description>
    <language>en-us</language>
    <managingEditor>ed@example.com (Ed Itor)</managingEditor>
    <pubDate>Sat, 07 Sep 2002 00:00:01 GMT</pubDate>
    <category domain="https://example.com/tax">News</category>
    <ttl>60</ttl>
    <cloud domain="rpc.example.com" port="80" path="/RPC2" registerProcedure="notify" protocol="xml-rpc"/>
    <image><url>https://example.com/logo.png</url><title>Logo</title><link>https://example.com/</link><width>88</width><height>abc</height></image>
    <textInput><title>Search</title><name>q</name><link>https://example.com/search</link></textInput>
    <skipHours><hour>0</hour><hour>25</hour><hour>x</hour><hour>23</hour></skipHours>
    <skipDays><day>Saturday</day><day>Sunday</day></skipDays>
  </channel>
</rss>"#,
        );

        assert_eq!(feed.format.as_deref(), Some("RSS 2.0"));
        assert_eq!(feed.title.as_deref(), Some("Example"));
        assert_eq!(feed.homepage.as_ref().map(|u| u.as_str()), Some("https://example.com/"));
        assert_eq!(feed.language.as_deref(), Some("en-us"));
        assert_eq!(
            feed.author.as_ref().and_then(|a| a.name.as_deref()),
            Some("Ed Itor")
        );
        assert!(feed.publish_date.is_some());
        assert_eq!(feed.categories[0].domain.as_deref(), Some("https://example.com/tax"));
        assert_eq!(feed.ttl, Some(60));

        let cloud = feed.cloud.unwrap();
        assert_eq!(cloud.port, Some(80));
        assert_eq!(cloud.register_procedure.as_deref(), Some("notify"));

        let image = feed.image.unwrap();
        assert_eq!(image.width, Some(88));
        assert_eq!(image.height, None);
        assert_eq!(image.title.as_deref(), Some("Logo"));

        assert_eq!(feed.text_input.unwrap().name.as_deref(), Some("q"));
        assert_eq!(feed.skip_hours, vec![0, 23]);
        assert_eq!(feed.skip_days, vec!["Saturday", "Sunday"]);
    }

    #[test]
    fn test_item_fields() {
        let feed = interpret(
            r#"<rss version="2.0"><channel>
  <item>
    <title>First</title>
    <link>https://example.com/1</link>
    <description>Body</description>
    <author>jane@example.com</author>
    <comments>https://example.com/1#comments</comments>
    <enclosure url="https://example.com/1.mp3" type="audio/mpeg" length="1234"/>
    <guid isPermaLink="false">tag:example.com,2024:1</guid>
    <source url="https://other.example.com/rss">Other</source>
  </item>
</channel></rss>"#,
        );

        let news = &feed.news[0];
        assert_eq!(news.title.as_deref(), Some("First"));
        assert_eq!(news.description.as_deref(), Some("Body"));
        assert_eq!(
            news.author.as_ref().and_then(|a| a.email.as_deref()),
            Some("jane@example.com")
        );
        assert_eq!(news.attachments.len(), 1);
        assert_eq!(news.attachments[0].length, 1234);
        assert_eq!(news.guid.as_ref().unwrap().is_permalink, Some(false));
        assert_eq!(news.source.as_ref().unwrap().name.as_deref(), Some("Other"));
    }

    #[test]
    fn test_permalink_guid_fills_missing_link() {
        let feed = interpret(
            r#"<rss version="2.0"><channel>
  <item><guid>https://example.com/p/1</guid></item>
  <item><guid isPermaLink="false">https://example.com/p/2</guid></item>
</channel></rss>"#,
        );
        assert_eq!(
            feed.news[0].link.as_ref().map(|u| u.as_str()),
            Some("https://example.com/p/1")
        );
        assert_eq!(feed.news[1].link, None);
    }

    #[test]
    fn test_relative_links_resolve_against_channel_link() {
        let feed = interpret(
            r#"<rss version="2.0"><channel>
  <title>Relative</title>
  <link>https://example.com/</link>
  <item>
    <title>One</title>
    <link>/posts/1</link>
    <enclosure url="media/a.mp3" type="audio/mpeg" length="10"/>
  </item>
</channel></rss>"#,
        );

        let news = &feed.news[0];
        assert_eq!(
            news.link.as_ref().map(|u| u.as_str()),
            Some("https://example.com/posts/1")
        );
        assert_eq!(news.attachments.len(), 1);
        assert_eq!(news.attachments[0].link.as_str(), "https://example.com/media/a.mp3");
    }

    #[test]
    fn test_relative_link_without_any_base_is_dropped() {
        let feed = interpret(
            r#"<rss version="2.0"><channel><item><link>/posts/1</link></item></channel></rss>"#,
        );
        assert_eq!(feed.news[0].link, None);
    }

    #[test]
    fn test_malformed_values_are_omitted() {
        let feed = interpret(
            r#"<rss version="0.91"><channel>
  <link>::not a uri::</link>
  <ttl>soon</ttl>
  <item><pubDate>someday</pubDate><enclosure url="" length="1"/></item>
</channel></rss>"#,
        );
        assert_eq!(feed.homepage, None);
        assert_eq!(feed.ttl, None);
        assert_eq!(feed.news[0].publish_date, None);
        assert!(feed.news[0].attachments.is_empty());
    }
}
