//! The owned document tree.
//!
//! # Architecture
//!
//! Nodes live in a flat `Vec<NodeData>` arena owned by the [`Document`];
//! parent/children relationships are tracked by indices. Callers observe
//! nodes either through borrowed [`NodeRef`] views, whose lifetime is tied
//! to the document, or through detached [`NodeHandle`]s, which carry the
//! document's id and are validated on every use. Dropping the document
//! releases the arena and with it every node.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::attributes::AttrValue;
use crate::error::{Error, Result};
use crate::extension::ExtensionRef;
use crate::iter::{TreeIterator, Walk};
use crate::node::{NodeData, NodeHandle, NodeRef};
use crate::options::Options;

/// Process-unique document identity used to validate handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A parsed document: sole owner of its node tree.
///
/// The tree's shape is fixed once parsing finishes. Extension attributes
/// (e.g. a task-list checkbox) can still be changed in place.
pub struct Document {
    pub(crate) id: DocumentId,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) root: u32,
    pub(crate) options: Options,
    pub(crate) extensions: Vec<ExtensionRef>,
}

impl Document {
    pub(crate) fn new(
        nodes: Vec<NodeData>,
        root: u32,
        options: Options,
        extensions: Vec<ExtensionRef>,
    ) -> Self {
        Self {
            id: DocumentId::next(),
            nodes,
            root,
            options,
            extensions,
        }
    }

    /// The document node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            doc: self,
            index: self.root,
        }
    }

    #[must_use]
    pub fn root_handle(&self) -> NodeHandle {
        self.root().handle()
    }

    /// Options the document was parsed with.
    #[must_use]
    pub fn options(&self) -> Options {
        self.options
    }

    /// Extensions attached to the parser that produced this document, in
    /// attach order.
    #[must_use]
    pub fn extensions(&self) -> &[ExtensionRef] {
        &self.extensions
    }

    /// Attached extension by name.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&ExtensionRef> {
        self.extensions.iter().find(|ext| ext.name() == name)
    }

    /// Number of arena slots, reachable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Fresh iterator over the whole tree.
    #[must_use]
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::from_root(self, self.root)
    }

    /// Borrowing walk over the whole tree, yielding ENTER/EXIT events.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(self, self.iter())
    }

    /// Read an extension attribute.
    ///
    /// # Errors
    ///
    /// Fails when `handle` does not belong to this document.
    pub fn attribute(
        &self,
        handle: NodeHandle,
        extension: &str,
        key: &str,
    ) -> Result<Option<&AttrValue>> {
        Ok(self.node(handle)?.attribute(extension, key))
    }

    /// Set an extension attribute on a node owned by, or already tagged by,
    /// `extension`.
    ///
    /// # Errors
    ///
    /// [`Error::AttributeNotApplicable`] when the node does not belong to
    /// the extension; handle errors as for [`Document::node`].
    pub fn set_attribute(
        &mut self,
        handle: NodeHandle,
        extension: &'static str,
        key: &'static str,
        value: AttrValue,
    ) -> Result<()> {
        self.check(handle)?;
        let data = &mut self.nodes[handle.index as usize];
        if data.owner != Some(extension) && !data.attrs.has_table(extension) {
            return Err(Error::not_applicable(extension, data.node_type));
        }
        data.attrs.insert(extension, key, value);
        Ok(())
    }

    /// Structural comparison: same node types, payloads, literals, spans
    /// and attributes in the same order. Ids and unreachable slots are
    /// ignored.
    #[must_use]
    pub fn same_tree(&self, other: &Document) -> bool {
        let mut pairs = vec![(self.root, other.root)];
        while let Some((left, right)) = pairs.pop() {
            let a = &self.nodes[left as usize];
            let b = &other.nodes[right as usize];
            if a.node_type != b.node_type
                || a.literal != b.literal
                || a.value != b.value
                || a.span != b.span
                || a.owner != b.owner
                || a.attrs != b.attrs
                || a.children.len() != b.children.len()
            {
                return false;
            }
            pairs.extend(a.children.iter().copied().zip(b.children.iter().copied()));
        }
        true
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0usize;
        for (event, node) in self.walk() {
            match event {
                crate::EventType::Enter => {
                    write!(f, "{:indent$}{}", "", node.type_string(), indent = depth * 2)?;
                    if let Some(literal) = node.literal() {
                        write!(f, " {literal:?}")?;
                    }
                    writeln!(f)?;
                    depth += 1;
                }
                _ => depth = depth.saturating_sub(1),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeType, parse_document};

    #[test]
    fn test_root_is_document() {
        let doc = parse_document(b"Hello", Options::DEFAULT);
        assert_eq!(doc.root().node_type(), NodeType::Document);
        assert!(doc.root().parent().is_none());
    }

    #[test]
    fn test_node_lookup_by_handle() {
        let doc = parse_document(b"Hello", Options::DEFAULT);
        let paragraph = doc.root().first_child().unwrap();
        let handle = paragraph.handle();
        assert_eq!(doc.node(handle).unwrap().node_type(), NodeType::Paragraph);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let first = parse_document(b"Hello", Options::DEFAULT);
        let second = parse_document(b"Hello", Options::DEFAULT);
        let handle = first.root_handle();
        assert_eq!(second.node(handle).unwrap_err(), Error::ForeignHandle);
    }

    #[test]
    fn test_handle_outlives_document_is_rejected() {
        let handle = {
            let doc = parse_document(b"Hello", Options::DEFAULT);
            doc.root_handle()
        };
        let replacement = parse_document(b"Hello", Options::DEFAULT);
        assert_eq!(replacement.node(handle).unwrap_err(), Error::ForeignHandle);
    }

    #[test]
    fn test_out_of_range_handle() {
        let doc = parse_document(b"Hello", Options::DEFAULT);
        let handle = NodeHandle {
            document: doc.id,
            index: 10_000,
        };
        assert_eq!(doc.node(handle).unwrap_err(), Error::InvalidHandle(10_000));
    }

    #[test]
    fn test_set_attribute_requires_ownership() {
        let mut doc = parse_document(b"Hello", Options::DEFAULT);
        let paragraph = doc.root().first_child().unwrap().handle();
        let err = doc
            .set_attribute(paragraph, "tasklist", "checked", AttrValue::Bool(true))
            .unwrap_err();
        assert_eq!(
            err,
            Error::AttributeNotApplicable {
                extension: "tasklist",
                node_type: "paragraph".to_owned(),
            }
        );
    }

    #[test]
    fn test_same_tree_ignores_identity() {
        let first = parse_document(b"# Title\n\nbody *text*\n", Options::DEFAULT);
        let second = parse_document(b"# Title\n\nbody *text*\n", Options::DEFAULT);
        let different = parse_document(b"# Title\n\nbody _text_ more\n", Options::DEFAULT);
        assert!(first.same_tree(&second));
        assert!(!first.same_tree(&different));
    }

    #[test]
    fn test_debug_outline() {
        let doc = parse_document(b"# Hi\n", Options::DEFAULT);
        assert_eq!(
            format!("{doc:?}"),
            "document\n  heading\n    text \"Hi\"\n"
        );
    }

    static_assertions::assert_impl_all!(super::Document: Send, Sync);
}
