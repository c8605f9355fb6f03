use super::{ContributionProvider, Origin, RegistryBuilder};
use crate::feed::namespaces::{
    self, AtomNamespace, ContentNamespace, DublinCoreNamespace, MediaNamespace, PodcastNamespace,
    SyndicationNamespace, XmlNamespace,
};
use crate::feed::{
    AtomInterpreter, BugzillaInterpreter, CdfInterpreter, OpmlInterpreter, RdfInterpreter,
    RssInterpreter,
};
use crate::state::opml::{self, OpmlStateExporter, OpmlStateImporter};

/// Every format, namespace and state format supported out of the box.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinProvider;

impl ContributionProvider for BuiltinProvider {
    fn name(&self) -> &str {
        "builtin"
    }

    fn origin(&self) -> Origin {
        Origin::Builtin
    }

    fn contribute(&self, registry: &mut RegistryBuilder) {
        registry
            .format_interpreter("rss", RssInterpreter)
            .format_interpreter("feed", AtomInterpreter)
            .format_interpreter("rdf", RdfInterpreter)
            .format_interpreter("channel", CdfInterpreter)
            .format_interpreter("opml", OpmlInterpreter)
            .format_interpreter("bugzilla", BugzillaInterpreter);

        registry
            .namespace_handler(namespaces::DUBLIN_CORE, DublinCoreNamespace)
            .namespace_handler(namespaces::CONTENT, ContentNamespace)
            .namespace_handler(namespaces::MEDIA, MediaNamespace)
            .namespace_handler(namespaces::MEDIA_LEGACY, MediaNamespace)
            .namespace_handler(namespaces::ITUNES, PodcastNamespace)
            .namespace_handler(namespaces::SYNDICATION, SyndicationNamespace)
            .namespace_handler(namespaces::XML_NAMESPACE, XmlNamespace)
            .namespace_handler(namespaces::ATOM_10, AtomNamespace)
            .namespace_handler(namespaces::ATOM_03, AtomNamespace);

        registry
            .state_importer(opml::FORMAT, OpmlStateImporter)
            .state_exporter(opml::FORMAT, OpmlStateExporter);
    }
}
