//! OPML dialect for application state.
//!
//! Plain `outline` elements carry the folder tree so any OPML reader can
//! still pick up the subscriptions. Everything else lives in the `rssowl`
//! namespace:
//!
//! ```xml
//! <opml version="1.1" xmlns:rssowl="http://www.rssowl.org">
//!   <head><title>Feedloom Subscriptions</title><dateCreated>...</dateCreated></head>
//!   <body>
//!     <outline text="My Bookmarks" rssowl:isSet="true" rssowl:id="1">
//!       <outline text="Example" xmlUrl="https://example.com/feed" rssowl:id="2"/>
//!       <rssowl:savedsearch name="Unread" matchAllConditions="true" rssowl:id="3">
//!         <rssowl:searchcondition>
//!           <rssowl:searchspecifier id="0"/>
//!           <rssowl:searchvalue type="states" value="NEW,UNREAD"/>
//!           <rssowl:searchfield name="state"/>
//!         </rssowl:searchcondition>
//!       </rssowl:savedsearch>
//!       <rssowl:newsbin name="Saved" rssowl:id="4"/>
//!     </outline>
//!     <rssowl:label name="Important" order="0" color="177,39,52" rssowl:id="5"/>
//!     <rssowl:searchfilter name="Archive" order="0" enabled="true" matchAllNews="true">
//!       <rssowl:filteraction id="org.rssowl.core.MoveNewsAction" data="4" dataType="list"/>
//!     </rssowl:searchfilter>
//!     <rssowl:pref id="font.size" value="12" type="integer" scope="global"/>
//!   </body>
//! </opml>
//! ```
//!
//! `rssowl:id` always holds the identifier the entity had when exported.
//! Multi-valued attributes are comma separated.

mod export;
mod import;

pub use export::OpmlStateExporter;
pub use import::OpmlStateImporter;

/// Namespace of every non-OPML element and attribute.
pub const RSSOWL_NS: &str = "http://www.rssowl.org";
pub const RSSOWL_PREFIX: &str = "rssowl";

/// Key the OPML state format is registered under.
pub const FORMAT: &str = "opml";

/// Document version written on export.
const OPML_VERSION: &str = "1.1";

/// Title of the staging folder an import puts loose outlines into.
pub const DEFAULT_SET_NAME: &str = "My Bookmarks";

mod tags {
    pub const OPML: &str = "opml";
    pub const HEAD: &str = "head";
    pub const BODY: &str = "body";
    pub const TITLE: &str = "title";
    pub const DATE_CREATED: &str = "dateCreated";
    pub const OUTLINE: &str = "outline";
    pub const SAVED_SEARCH: &str = "savedsearch";
    pub const NEWS_BIN: &str = "newsbin";
    pub const LABEL: &str = "label";
    pub const SEARCH_FILTER: &str = "searchfilter";
    pub const SEARCH_CONDITION: &str = "searchcondition";
    pub const SEARCH_SPECIFIER: &str = "searchspecifier";
    pub const SEARCH_FIELD: &str = "searchfield";
    pub const SEARCH_VALUE: &str = "searchvalue";
    pub const LOCATION: &str = "location";
    pub const FILTER_ACTION: &str = "filteraction";
    pub const FILTER_ACTION_PROPERTY: &str = "filteractionproperty";
    pub const PREFERENCE: &str = "pref";
}

mod attrs {
    pub const VERSION: &str = "version";
    pub const ID: &str = "id";
    pub const IS_SET: &str = "isSet";
    pub const TEXT: &str = "text";
    pub const TITLE: &str = "title";
    pub const XML_URL: &str = "xmlUrl";
    pub const HTML_URL: &str = "htmlUrl";
    pub const NAME: &str = "name";
    pub const MATCH_ALL_CONDITIONS: &str = "matchAllConditions";
    pub const MATCH_ALL_NEWS: &str = "matchAllNews";
    pub const ENABLED: &str = "enabled";
    pub const ORDER: &str = "order";
    pub const COLOR: &str = "color";
    pub const TYPE: &str = "type";
    pub const VALUE: &str = "value";
    pub const SCOPE: &str = "scope";
    pub const DATA: &str = "data";
    pub const DATA_TYPE: &str = "dataType";
    pub const FOLDERS: &str = "folders";
    pub const BOOKMARKS: &str = "bookmarks";
    pub const NEWS_BINS: &str = "newsbins";

    pub const DATA_TYPE_LIST: &str = "list";
}
