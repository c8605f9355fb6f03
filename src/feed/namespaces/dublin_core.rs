use crate::feed::common::{date, rich_text};
use crate::feed::{InterpretContext, NamespaceHandler};
use crate::model::{Category, Guid, Person, Source, Target};
use crate::xml::Element;

/// Dublin Core elements (`dc:`), common in RSS 1.0 and many RSS 2.0 feeds.
///
/// Dublin Core values never replace an author or description the format
/// itself already provided.
#[derive(Debug, Default, Clone, Copy)]
pub struct DublinCoreNamespace;

impl NamespaceHandler for DublinCoreNamespace {
    fn process_element(&self, element: &Element, mut target: Target<'_>, ctx: &mut InterpretContext<'_>) {
        let Some(text) = element.text() else {
            return;
        };

        match element.lowercase_name().as_str() {
            "title" => target.set_title(text),
            "creator" | "publisher" | "contributor" => {
                if target.author().is_none() {
                    target.set_author(Person::named(text));
                }
            }
            "subject" => target.add_category(Category::named(text)),
            "description" => {
                if target.description().is_none() {
                    if let Some(description) = rich_text(element) {
                        target.set_description(description);
                    }
                }
            }
            "date" => {
                if let Some(date) = date(element) {
                    target.set_publish_date(date);
                }
            }
            "language" => target.set_language(text),
            "rights" => target.set_copyright(text),
            "source" => {
                if let Target::News(news) = target {
                    let link = ctx.resolve(&text);
                    news.source = Some(Source {
                        name: link.is_none().then_some(text),
                        link,
                    });
                }
            }
            "identifier" => {
                if let Target::News(news) = target {
                    if news.guid.is_none() {
                        news.guid = Some(Guid {
                            value: text,
                            is_permalink: None,
                        });
                    }
                }
            }
            _ => {}
        }
    }
}
