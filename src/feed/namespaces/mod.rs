//! Built-in namespace handlers.
//!
//! Each handler is registered under the namespace URI it understands and is
//! called for every element (and namespaced attribute) of that namespace,
//! whatever the document format. An element a handler does not recognize is
//! still considered handled and is dropped.

mod atom;
mod content;
mod dublin_core;
mod media;
mod podcast;
mod syndication;
mod xml;

pub use atom::AtomNamespace;
pub use content::ContentNamespace;
pub use dublin_core::DublinCoreNamespace;
pub use media::MediaNamespace;
pub use podcast::PodcastNamespace;
pub use syndication::SyndicationNamespace;
pub use xml::XmlNamespace;

pub const DUBLIN_CORE: &str = "http://purl.org/dc/elements/1.1/";
pub const CONTENT: &str = "http://purl.org/rss/1.0/modules/content/";
pub const MEDIA: &str = "http://search.yahoo.com/mrss/";
/// Media RSS was published under this URI before moving to the one above.
pub const MEDIA_LEGACY: &str = "http://search.yahoo.com/mrss";
pub const ITUNES: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
pub const SYNDICATION: &str = "http://purl.org/rss/1.0/modules/syndication/";
pub const ATOM_10: &str = "http://www.w3.org/2005/Atom";
pub const ATOM_03: &str = "http://purl.org/atom/ns#";
pub use crate::xml::XML_NAMESPACE;
