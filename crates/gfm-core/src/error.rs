//! Usage errors.
//!
//! Malformed markdown and invalid UTF-8 are never errors: every byte input
//! produces a document. The variants below are contract violations by the
//! caller, reported at the call that commits them.

use crate::node::NodeType;

/// Error returned by parser, document, and iterator operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `feed` or `attach_extension` called on a parser that already finished.
    #[error("parser has already finished")]
    ParserFinished,
    /// `finish` called a second time.
    #[error("parser finish called twice")]
    AlreadyFinished,
    /// Extensions must be attached before the first `feed`.
    #[error("extension '{0}' attached after input was fed")]
    AttachAfterFeed(String),
    /// No extension with this name is registered.
    #[error("unknown extension '{0}'")]
    UnknownExtension(String),
    /// Registry already holds an extension with this name.
    #[error("extension '{0}' is already registered")]
    DuplicateExtension(String),
    /// Extension attribute accessor used on a node the extension does not own.
    #[error("extension '{extension}' attributes do not apply to {node_type} nodes")]
    AttributeNotApplicable {
        /// Extension whose accessor was invoked.
        extension: &'static str,
        /// Type name of the node it was invoked on.
        node_type: String,
    },
    /// Handle or iterator belongs to a different (or released) document.
    #[error("node handle does not belong to this document")]
    ForeignHandle,
    /// Handle index is out of range for its document.
    #[error("node handle {0} is out of range")]
    InvalidHandle(u32),
    /// Tree edit during post-processing would break the tree's shape.
    #[error("invalid tree edit: {0}")]
    InvalidTreeEdit(&'static str),
}

impl Error {
    pub(crate) fn not_applicable(extension: &'static str, node_type: NodeType) -> Self {
        Self::AttributeNotApplicable {
            extension,
            node_type: node_type.to_string(),
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
