/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for tree mutation and XML parsing.

use thiserror::Error;

/// Result type alias for parse operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for tree and attribute operations.
pub type DomResult<T> = std::result::Result<T, DomError>;

/// Failures reported by the mutation engine and the attribute collection.
///
/// Each variant names a kind only. Operations that return one of these have
/// not touched the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DomError {
    #[error("index or size is out of range")]
    IndexSize,

    #[error("invalid character")]
    InvalidCharacter,

    /// The node cannot be inserted at the requested place in the hierarchy.
    #[error("node cannot be inserted at this point in the hierarchy")]
    HierarchyRequest,

    /// The node belongs to a different document.
    #[error("node belongs to a different document")]
    WrongDocument,

    #[error("node cannot be modified")]
    NoModificationAllowed,

    /// The referenced node is not where the operation expects it.
    #[error("node was not found")]
    NotFound,

    #[error("operation is not supported")]
    NotSupported,

    /// The attribute is already owned by an element.
    #[error("attribute is already in use by another element")]
    InUseAttribute,

    /// The node's owner document has been dropped.
    #[error("owner document is no longer alive")]
    InvalidState,
}

/// Errors that can occur while parsing XML text into a document.
///
/// Malformed nesting is recovered from by default and never shows up here;
/// see [`ParseOptions`](crate::ParseOptions) for the strict mode that turns
/// those recoveries into errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the input stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not valid UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// XML syntax error from quick-xml.
    #[error("XML syntax error: {message}{}", .position.map(|p| format!(" at byte {p}")).unwrap_or_default())]
    XmlSyntax {
        message: String,
        /// Byte offset where the error occurred.
        position: Option<u64>,
    },

    /// Unexpected end of input (strict mode only).
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// What was expected when EOF was encountered.
        expected: String,
    },

    /// Mismatched end tag (strict mode only).
    #[error("mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        /// The name of the innermost open element.
        expected: String,
        /// The end tag name actually found.
        found: String,
        position: u64,
    },

    /// Invalid XML structure (strict mode only).
    #[error("invalid XML structure: {message}")]
    InvalidStructure { message: String, position: u64 },

    /// A tree operation failed while building the document.
    #[error("tree construction failed: {0}")]
    Dom(#[from] DomError),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlSyntax {
            message: err.to_string(),
            position: None,
        }
    }
}
