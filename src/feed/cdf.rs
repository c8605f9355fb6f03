use super::common::{self, attribute_uri};
use super::{FormatInterpreter, InterpretContext};
use crate::error::InterpretError;
use crate::model::{Feed, Image, News, Target};
use crate::util::parse_date;
use crate::xml::{Document, Element};

/// Microsoft Channel Definition Format (`<channel>` root).
///
/// Nested sub-channels are flattened: their items join the top-level feed.
#[derive(Debug, Default, Clone, Copy)]
pub struct CdfInterpreter;

impl FormatInterpreter for CdfInterpreter {
    fn interpret(
        &self,
        document: &Document,
        feed: &mut Feed,
        ctx: &mut InterpretContext<'_>,
    ) -> Result<(), InterpretError> {
        let root = document.root().ok_or(InterpretError::NoRootElement)?;
        feed.format = Some("CDF".to_owned());

        ctx.scoped(root, |ctx| {
            for attribute in &root.attributes {
                if ctx
                    .visit_attribute(attribute, Target::Feed(feed))
                    .is_handled()
                {
                    continue;
                }
                match attribute.name.to_ascii_lowercase().as_str() {
                    "href" => {
                        feed.homepage = ctx.resolve(&attribute.value);
                        ctx.set_homepage(feed.homepage.clone());
                    }
                    "lastmod" => feed.last_modified_date = parse_date(&attribute.value),
                    _ => {}
                }
            }
            process_channel(root, feed, ctx, true);
        });
        Ok(())
    }
}

fn process_channel(channel: &Element, feed: &mut Feed, ctx: &mut InterpretContext<'_>, top: bool) {
    for child in channel.elements() {
        if ctx.visit_element(child, Target::Feed(feed)).is_handled() {
            continue;
        }
        match child.lowercase_name().as_str() {
            "title" if top => feed.title = child.text(),
            "abstract" if top => feed.description = child.text(),
            "logo" if top => {
                if let Some(link) = attribute_uri(child, "href", ctx) {
                    feed.image.get_or_insert_with(Image::default).link = Some(link);
                }
            }
            "item" => process_item(child, feed, ctx),
            "channel" => process_channel(child, feed, ctx, false),
            _ => {}
        }
    }
}

fn process_item(item: &Element, feed: &mut Feed, ctx: &mut InterpretContext<'_>) {
    let mut news = common::new_news(ctx);
    ctx.scoped(item, |ctx| process_item_nodes(item, &mut news, ctx));
    feed.news.push(news);
}

fn process_item_nodes(item: &Element, news: &mut News, ctx: &mut InterpretContext<'_>) {
    for attribute in &item.attributes {
        if ctx
            .visit_attribute(attribute, Target::News(news))
            .is_handled()
        {
            continue;
        }
        match attribute.name.to_ascii_lowercase().as_str() {
            "href" => news.link = ctx.resolve(&attribute.value),
            "lastmod" => news.modified_date = parse_date(&attribute.value),
            _ => {}
        }
    }

    for child in item.elements() {
        if ctx.visit_element(child, Target::News(news)).is_handled() {
            continue;
        }
        match child.lowercase_name().as_str() {
            "title" => news.title = child.text(),
            "abstract" => news.description = child.text(),
            _ => {}
        }
    }
}
