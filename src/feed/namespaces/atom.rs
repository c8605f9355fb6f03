use crate::feed::common::{attach, attachment, attribute_uri, date, person, uri};
use crate::feed::{InterpretContext, NamespaceHandler};
use crate::model::{Guid, Target};
use crate::xml::Element;

/// Atom elements embedded in non-Atom documents, e.g. `atom:link` in RSS 2.0.
///
/// Inside an Atom document these elements are in the default namespace and
/// never reach this handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomNamespace;

impl NamespaceHandler for AtomNamespace {
    fn process_element(&self, element: &Element, mut target: Target<'_>, ctx: &mut InterpretContext<'_>) {
        match element.lowercase_name().as_str() {
            "link" => {
                let rel = element
                    .attribute("rel")
                    .map(|rel| rel.trim().to_ascii_lowercase())
                    .unwrap_or_else(|| "alternate".to_owned());
                let href = attribute_uri(element, "href", ctx);
                match rel.as_str() {
                    "alternate" => {
                        if let Some(link) = href {
                            if !target.has_link() {
                                target.set_link(link);
                            }
                        }
                    }
                    "enclosure" => {
                        if let Some(enclosure) =
                            attachment(href, element.attribute("type"), element.attribute("length"))
                        {
                            attach(target, enclosure);
                        }
                    }
                    _ => {}
                }
            }
            "author" => {
                if target.author().is_none() {
                    target.set_author(person(element, ctx));
                }
            }
            "name" | "email" | "uri" => {
                if let Target::Person(author) = target {
                    match element.lowercase_name().as_str() {
                        "name" => author.name = element.text(),
                        "email" => author.email = element.text(),
                        _ => author.uri = uri(element, ctx),
                    }
                }
            }
            "updated" => {
                if let Some(date) = date(element) {
                    target.set_modified_date(date);
                }
            }
            "id" => {
                if let (Target::News(news), Some(value)) = (target, element.text()) {
                    if news.guid.is_none() {
                        news.guid = Some(Guid {
                            value,
                            is_permalink: Some(false),
                        });
                    }
                }
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
    fn test_atom_link_in_rss_channel() {
        let document = DocumentParser::default()
            .parse_str(
                r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <atom:link rel="self" href="https://example.com/rss.xml"/>
    <atom:link href="https://example.com/"/>
    <item>
      <atom:link rel="enclosure" href="https://example.com/a.ogg" type="audio/ogg"/>
      <atom:author><atom:name>Kim</atom:name></atom:author>
    </item>
  </channel>
</rss>"#,
            )
            .unwrap();
        let feed = Dispatcher::builtin().interpret(&document).unwrap();

        assert_eq!(feed.homepage.as_ref().map(|u| u.as_str()), Some("https://example.com/"));
        let news = &feed.news[0];
        assert_eq!(news.attachments.len(), 1);
        assert_eq!(news.attachments[0].mime_type.as_deref(), Some("audio/ogg"));
        assert_eq!(news.author.as_ref().and_then(|a| a.name.as_deref()), Some("Kim"));
    }
}
