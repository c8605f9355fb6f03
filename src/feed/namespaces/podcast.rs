use crate::feed::common::attribute_uri;
use crate::feed::{InterpretContext, NamespaceHandler};
use crate::model::{Category, Image, Person, Target};
use crate::xml::Element;

const ITUNES_DOMAIN: &str = "itunes";

/// iTunes podcast tags (`itunes:`).
///
/// These only fill gaps left by the RSS core elements.
#[derive(Debug, Default, Clone, Copy)]
pub struct PodcastNamespace;

impl NamespaceHandler for PodcastNamespace {
    fn process_element(&self, element: &Element, mut target: Target<'_>, ctx: &mut InterpretContext<'_>) {
        match element.lowercase_name().as_str() {
            "author" => {
                if let Some(name) = element.text() {
                    if target.author().is_none() {
                        target.set_author(Person::named(name));
                    }
                }
            }
            "summary" | "subtitle" => {
                if let Some(text) = element.text() {
                    if target.description().is_none() {
                        target.set_description(text);
                    }
                }
            }
            "category" => add_categories(element, &mut target),
            "image" => {
                if let (Target::Feed(feed), Some(link)) = (target, attribute_uri(element, "href", ctx)) {
                    let image = feed.image.get_or_insert_with(Image::default);
                    if image.link.is_none() {
                        image.link = Some(link);
                    }
                }
            }
            _ => {}
        }
    }
}

/// `<itunes:category text="..">` may nest a sub-category.
fn add_categories(element: &Element, target: &mut Target<'_>) {
    if let Some(text) = element.attribute("text").map(str::trim).filter(|t| !t.is_empty()) {
        target.add_category(Category {
            name: Some(text.to_owned()),
            domain: Some(ITUNES_DOMAIN.to_owned()),
        });
    }
    for child in element.children_named("category") {
        add_categories(child, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Feed;
    use crate::registry::RegistryBuilder;
    use crate::xml::Document;
    use chrono::Utc;

    #[test]
    fn test_nested_categories_and_image() {
        let registry = RegistryBuilder::new().build();
        let document = Document::new(None);
        let mut ctx = InterpretContext::new(&registry, &document, Utc::now());
        let mut feed = Feed::new();

        let mut category = Element::new("category").with_attribute("text", "Technology");
        category.push(Element::new("category").with_attribute("text", "Podcasting"));
        PodcastNamespace.process_element(&category, Target::Feed(&mut feed), &mut ctx);

        let image = Element::new("image").with_attribute("href", "https://example.com/cover.jpg");
        PodcastNamespace.process_element(&image, Target::Feed(&mut feed), &mut ctx);

        let names: Vec<_> = feed.categories.iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec!["Technology", "Podcasting"]);
        assert!(feed.image.and_then(|i| i.link).is_some());
    }
}
