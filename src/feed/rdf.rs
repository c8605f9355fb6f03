use super::common::{self, rich_text, uri};
use super::{FormatInterpreter, InterpretContext};
use crate::error::InterpretError;
use crate::model::{Feed, Image, Target, TextInput};
use crate::xml::{Document, Element};

/// Default namespace of Netscape's RSS 0.90.
const RSS_090_NAMESPACE: &str = "http://my.netscape.com/rdf/simple/0.9/";

/// RDF Site Summary: RSS 0.90 and RSS 1.0 (`<rdf:RDF>` root).
///
/// Unlike RSS 2.0 the image, text input and items are siblings of the
/// channel rather than its children.
#[derive(Debug, Default, Clone, Copy)]
pub struct RdfInterpreter;

impl FormatInterpreter for RdfInterpreter {
    fn interpret(
        &self,
        document: &Document,
        feed: &mut Feed,
        ctx: &mut InterpretContext<'_>,
    ) -> Result<(), InterpretError> {
        let root = document.root().ok_or(InterpretError::NoRootElement)?;

        let label = if ctx.default_namespace() == Some(RSS_090_NAMESPACE) {
            "RSS 0.90"
        } else {
            "RSS 1.0"
        };
        feed.format = Some(label.to_owned());

        ctx.scoped(root, |ctx| {
            ctx.visit_attributes(root, Target::Feed(feed));
            // Items are siblings of the channel, so its link is looked up first.
            if let Some(channel) = root.elements().find(|child| child.is("channel")) {
                let homepage = common::homepage_link(channel, ctx);
                ctx.set_homepage(homepage);
            }
            for child in root.elements() {
                if ctx.visit_element(child, Target::Feed(feed)).is_handled() {
                    continue;
                }
                match child.lowercase_name().as_str() {
                    "channel" => process_channel(child, feed, ctx),
                    "image" => feed.image = Some(process_image(child, ctx)),
                    "textinput" => feed.text_input = Some(process_text_input(child, ctx)),
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
        for child in channel.elements() {
            if ctx.visit_element(child, Target::Feed(feed)).is_handled() {
                continue;
            }
            match child.lowercase_name().as_str() {
                "title" => feed.title = child.text(),
                "link" => feed.homepage = uri(child, ctx),
                "description" => feed.description = rich_text(child),
                // image, textinput and items are rdf:resource references here
                _ => {}
            }
        }
    });
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
                    if news.description.is_none() {
                        news.description = rich_text(child);
                    }
                }
                _ => {}
            }
        }
    });

    feed.news.push(news);
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
    fn test_rss_10_with_dublin_core() {
        let feed = interpret(
            r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dc="http://purl.org/dc/elements/1.1/"
         xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="https://example.com/">
    <title>RDF Example</title>
    <link>https://example.com/</link>
    <description>Desc</description>
    <dc:language>de</dc:language>
  </channel>
  <image rdf:about="https://example.com/logo.png">
    <title>Logo</title><url>https://example.com/logo.png</url><link>https://example.com/</link>
  </image>
  <item rdf:about="https://example.com/1">
    <title>One</title>
    <link>https://example.com/1</link>
    <dc:date>2004-05-01T10:00:00+00:00</dc:date>
    <dc:creator>Anna</dc:creator>
  </item>
  <item rdf:about="https://example.com/2"><title>Two</title></item>
</rdf:RDF>"#,
        );

        assert_eq!(feed.format.as_deref(), Some("RSS 1.0"));
        assert_eq!(feed.title.as_deref(), Some("RDF Example"));
        assert_eq!(feed.language.as_deref(), Some("de"));
        assert_eq!(feed.image.as_ref().and_then(|i| i.title.as_deref()), Some("Logo"));
        assert_eq!(feed.news.len(), 2);
        assert!(feed.news[0].publish_date.is_some());
        assert_eq!(
            feed.news[0].author.as_ref().and_then(|a| a.name.as_deref()),
            Some("Anna")
        );
    }

    #[test]
    fn test_rss_090_label() {
        let feed = interpret(
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://my.netscape.com/rdf/simple/0.9/">
  <channel><title>Mozilla Dot Org</title></channel>
  <item><title>New Status Updates</title></item>
</rdf:RDF>"#,
        );
        assert_eq!(feed.format.as_deref(), Some("RSS 0.90"));
        assert_eq!(feed.news.len(), 1);
    }
}
