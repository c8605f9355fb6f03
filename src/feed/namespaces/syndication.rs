use crate::feed::common::{date, int};
use crate::feed::{InterpretContext, NamespaceHandler};
use crate::model::Target;
use crate::xml::Element;

/// RSS 1.0 syndication module: update schedule hints for the channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyndicationNamespace;

impl NamespaceHandler for SyndicationNamespace {
    fn process_element(&self, element: &Element, target: Target<'_>, _ctx: &mut InterpretContext<'_>) {
        let Target::Feed(feed) = target else {
            return;
        };
        match element.lowercase_name().as_str() {
            "updateperiod" => feed.update_period = element.text(),
            "updatefrequency" => feed.update_frequency = int(element),
            "updatebase" => feed.update_base = date(element),
            _ => {}
        }
    }
}
