use thiserror::Error;

use crate::xml::ParseError;

/// Errors surfaced by feed interpretation and state export.
///
/// Malformed values inside a document (bad URI, date or number) never show
/// up here; they only drop the affected field.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// The document could not be decoded or parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// No interpreter is registered for the root element.
    #[error("Unknown feed format: {0}")]
    UnknownFormat(String),

    /// The document has no root element.
    #[error("Document has no root element")]
    NoRootElement,

    /// Writing an export destination failed.
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}
