//! Multi-format feed interpretation and OPML state serialization.
//!
//! - [`xml`] - byte stream to element tree, with encoding fallback
//! - [`registry`] - contribution tables consulted during interpretation
//! - [`feed`] - format dispatcher, interpreters and namespace handlers
//! - [`model`] - the normalized feed model
//! - [`state`] - persistent application state and its OPML dialect
//! - [`storage`] - in-memory store that saves imported state
//!
//! ```
//! use feedloom::feed::Dispatcher;
//! use feedloom::xml::DocumentParser;
//!
//! let document = DocumentParser::default()
//!     .parse_str(r#"<rss version="2.0"><channel><title>Hi</title></channel></rss>"#)
//!     .unwrap();
//! let feed = Dispatcher::builtin().interpret(&document).unwrap();
//! assert_eq!(feed.format.as_deref(), Some("RSS 2.0"));
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod model;
pub mod registry;
pub mod state;
pub mod storage;
pub mod util;
pub mod xml;
