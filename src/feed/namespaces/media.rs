use crate::feed::common::{attach, attachment, attribute_uri};
use crate::feed::{InterpretContext, NamespaceHandler};
use crate::model::Target;
use crate::xml::Element;

/// Media RSS: `media:content` becomes an attachment; `media:group` bundles
/// alternative renditions and is walked recursively.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaNamespace;

impl NamespaceHandler for MediaNamespace {
    fn process_element(&self, element: &Element, mut target: Target<'_>, ctx: &mut InterpretContext<'_>) {
        match element.lowercase_name().as_str() {
            "content" => {
                let link = attribute_uri(element, "url", ctx);
                if let Some(media) =
                    attachment(link, element.attribute("type"), element.attribute("fileSize"))
                {
                    attach(target, media);
                }
            }
            "group" => {
                for child in element.elements() {
                    ctx.visit_element(child, target.reborrow());
                }
            }
            _ => {}
        }
    }
}
