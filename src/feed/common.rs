//! Value extraction shared by the interpreters and namespace handlers.

use chrono::{DateTime, Utc};
use url::Url;

use super::InterpretContext;
use crate::model::{Attachment, Category, News, Person, Target};
use crate::util::{parse_date, parse_int, parse_long};
use crate::xml::{inner_markup, Element};

/// MIME-ish `type` values that mark inline XHTML content.
const XHTML_TYPES: &[&str] = &["xhtml", "application/xhtml+xml"];

/// Text of a content element, keeping inner markup for XHTML content.
///
/// Atom 1.0 signals XHTML with `type="xhtml"`, Atom 0.3 with `mode="xml"`.
pub(crate) fn rich_text(element: &Element) -> Option<String> {
    let is_xhtml = element
        .attribute("type")
        .is_some_and(|kind| XHTML_TYPES.iter().any(|x| kind.trim().eq_ignore_ascii_case(x)))
        || element
            .attribute("mode")
            .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("xml"));

    if !is_xhtml {
        return element.text();
    }
    let markup = inner_markup(element);
    let markup = markup.trim();
    (!markup.is_empty()).then(|| markup.to_owned())
}

pub(crate) fn uri(element: &Element, ctx: &InterpretContext<'_>) -> Option<Url> {
    element.text().and_then(|text| ctx.resolve(&text))
}

pub(crate) fn attribute_uri(
    element: &Element,
    name: &str,
    ctx: &InterpretContext<'_>,
) -> Option<Url> {
    element.attribute(name).and_then(|value| ctx.resolve(value))
}

pub(crate) fn date(element: &Element) -> Option<DateTime<Utc>> {
    element.text().as_deref().and_then(parse_date)
}

pub(crate) fn int(element: &Element) -> Option<i32> {
    element.text().as_deref().and_then(parse_int)
}

/// Absolute text of the first `link` child in the container's own
/// namespace, used as the fallback base for relative links.
pub(crate) fn homepage_link(container: &Element, ctx: &InterpretContext<'_>) -> Option<Url> {
    container
        .elements()
        .filter(|child| child.is("link") && child.namespace == container.namespace)
        .find_map(|link| uri(link, ctx))
}

pub(crate) fn category(element: &Element, domain_attribute: &str) -> Option<Category> {
    let name = element
        .attribute("term")
        .map(str::to_owned)
        .or_else(|| element.text())?;
    Some(Category {
        name: Some(name),
        domain: element.attribute(domain_attribute).map(str::to_owned),
    })
}

/// Builds an attachment when `link` is present; the length defaults to
/// unknown when missing or malformed.
pub(crate) fn attachment(link: Option<Url>, mime_type: Option<&str>, length: Option<&str>) -> Option<Attachment> {
    let mut attachment = Attachment::new(link?);
    attachment.mime_type = mime_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned);
    attachment.length = length
        .and_then(parse_long)
        .unwrap_or(Attachment::UNKNOWN_LENGTH);
    Some(attachment)
}

/// Adds an attachment to a news target; other targets ignore it.
pub(crate) fn attach(target: Target<'_>, attachment: Attachment) {
    if let Target::News(news) = target {
        news.add_attachment(attachment);
    }
}

/// Atom-style person construct: `name`, `email`, `uri` (or `url`) children,
/// each offered to the registry first.
pub(crate) fn person(element: &Element, ctx: &mut InterpretContext<'_>) -> Person {
    let mut person = Person::default();
    for child in element.elements() {
        if ctx.visit_element(child, Target::Person(&mut person)).is_handled() {
            continue;
        }
        match child.lowercase_name().as_str() {
            "name" => person.name = child.text(),
            "email" => person.email = child.text(),
            "uri" | "url" => person.uri = uri(child, ctx),
            _ => {}
        }
    }
    person
}

/// Creates the next news item of the document, stamped by the context clock.
pub(crate) fn new_news(ctx: &mut InterpretContext<'_>) -> News {
    News::new(ctx.next_received_date())
}
