use crate::feed::{InterpretContext, NamespaceHandler};
use crate::model::Target;
use crate::xml::Element;

/// `content:encoded`: the full item body, preferred over `description`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentNamespace;

impl NamespaceHandler for ContentNamespace {
    fn process_element(&self, element: &Element, mut target: Target<'_>, _ctx: &mut InterpretContext<'_>) {
        if element.is("encoded") {
            if let Some(text) = element.text() {
                target.set_description(text);
            }
        }
    }
}
