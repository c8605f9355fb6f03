use crate::feed::{InterpretContext, NamespaceHandler};
use crate::model::Target;
use crate::xml::{Attribute, Element};

/// `xml:lang` and `xml:base` attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlNamespace;

impl NamespaceHandler for XmlNamespace {
    fn process_element(&self, _element: &Element, _target: Target<'_>, _ctx: &mut InterpretContext<'_>) {}

    fn process_attribute(&self, attribute: &Attribute, mut target: Target<'_>, ctx: &mut InterpretContext<'_>) {
        let value = attribute.value.trim();
        if value.is_empty() {
            return;
        }
        match attribute.name.as_str() {
            "lang" => target.set_language(value.to_owned()),
            // Interpreters scope every entity element before offering its
            // attributes, so the context already holds the resolved base.
            "base" => {
                if let Some(base) = ctx.base() {
                    target.set_base(base.clone());
                }
            }
            _ => {}
        }
    }
}
