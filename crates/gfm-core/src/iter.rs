//! Depth-first ENTER/EXIT traversal.
//!
//! [`TreeIterator`] is detached from the document it walks: it stores only
//! indices and the document's identity, and every step borrows the
//! document anew. This lets callers change extension attributes of the
//! current node between steps. [`Walk`] is the borrowing, `Iterator`
//! flavour used by the renderers.

use crate::document::{Document, DocumentId};
use crate::error::{Error, Result};
use crate::node::{NodeHandle, NodeRef};

/// Traversal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EventType {
    /// Before the first `advance`.
    None,
    /// Traversal finished.
    Done,
    /// First visit of a node, before its children.
    Enter,
    /// Last visit of a node, after its children. Leaves get an EXIT right
    /// after their ENTER.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    Iterating,
    Done,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: u32,
    next_child: usize,
}

/// Resumable depth-first iterator over a subtree.
///
/// The explicit frame stack keeps traversal depth independent of the
/// call stack.
#[derive(Debug, Clone)]
pub struct TreeIterator {
    document: DocumentId,
    root: u32,
    stack: Vec<Frame>,
    state: State,
    event: EventType,
    current: Option<u32>,
}

impl TreeIterator {
    /// Iterator over the subtree rooted at `root`.
    ///
    /// # Errors
    ///
    /// Fails when `root` is not a node of `doc`.
    pub fn new(doc: &Document, root: NodeHandle) -> Result<Self> {
        doc.check(root)?;
        Ok(Self::from_root(doc, root.index))
    }

    pub(crate) fn from_root(doc: &Document, root: u32) -> Self {
        Self {
            document: doc.id,
            root,
            stack: Vec::new(),
            state: State::NotStarted,
            event: EventType::None,
            current: None,
        }
    }

    /// Step to the next event.
    ///
    /// After the root's EXIT every call reports [`EventType::Done`].
    ///
    /// # Errors
    ///
    /// [`Error::ForeignHandle`] when `doc` is not the document the iterator
    /// was created for.
    pub fn advance(&mut self, doc: &Document) -> Result<EventType> {
        if doc.id != self.document {
            return Err(Error::ForeignHandle);
        }
        match self.state {
            State::Done => {}
            State::NotStarted => {
                self.state = State::Iterating;
                self.stack.push(Frame {
                    node: self.root,
                    next_child: 0,
                });
                self.set(EventType::Enter, Some(self.root));
            }
            State::Iterating => match self.stack.last_mut() {
                None => {
                    self.state = State::Done;
                    self.set(EventType::Done, None);
                }
                Some(frame) => {
                    let children = &doc.nodes[frame.node as usize].children;
                    if let Some(&child) = children.get(frame.next_child) {
                        frame.next_child += 1;
                        self.stack.push(Frame {
                            node: child,
                            next_child: 0,
                        });
                        self.set(EventType::Enter, Some(child));
                    } else {
                        let node = frame.node;
                        self.stack.pop();
                        self.set(EventType::Exit, Some(node));
                    }
                }
            },
        }
        Ok(self.event)
    }

    fn set(&mut self, event: EventType, node: Option<u32>) {
        self.event = event;
        self.current = node;
    }

    /// Event reported by the last `advance`.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event
    }

    /// Node of the last ENTER/EXIT event; `None` before the first step and
    /// once done.
    #[must_use]
    pub fn node(&self) -> Option<NodeHandle> {
        self.current.map(|index| NodeHandle {
            document: self.document,
            index,
        })
    }

    /// Root the iterator was created against.
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        NodeHandle {
            document: self.document,
            index: self.root,
        }
    }
}

/// Borrowing ENTER/EXIT walk, as a standard iterator.
pub struct Walk<'a> {
    doc: &'a Document,
    iter: TreeIterator,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(doc: &'a Document, iter: TreeIterator) -> Self {
        Self { doc, iter }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (EventType, NodeRef<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.iter.advance(self.doc).ok()?;
        match (event, self.iter.current) {
            (EventType::Enter | EventType::Exit, Some(index)) => Some((
                event,
                NodeRef {
                    doc: self.doc,
                    index,
                },
            )),
            _ => None,
        }
    }
}

impl<'a> NodeRef<'a> {
    /// Walk the subtree rooted at this node.
    #[must_use]
    pub fn walk(&self) -> Walk<'a> {
        Walk::new(self.doc, TreeIterator::from_root(self.doc, self.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtensionRegistry, NodeType, Options, parse_document, parse_document_with};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn trace(doc: &Document) -> Vec<(EventType, &'static str)> {
        doc.walk().map(|(event, node)| (event, node.type_string())).collect()
    }

    fn outline(doc: &Document) -> Vec<(EventType, &'static str, Option<String>)> {
        doc.walk()
            .map(|(event, node)| (event, node.type_string(), node.literal().map(str::to_owned)))
            .collect()
    }

    #[test]
    fn test_hello_world_sequence() {
        let doc = parse_document(b"Hello *world*", Options::DEFAULT);
        assert_eq!(
            trace(&doc),
            vec![
                (EventType::Enter, "document"),
                (EventType::Enter, "paragraph"),
                (EventType::Enter, "text"),
                (EventType::Exit, "text"),
                (EventType::Enter, "emph"),
                (EventType::Enter, "text"),
                (EventType::Exit, "text"),
                (EventType::Exit, "emph"),
                (EventType::Exit, "paragraph"),
                (EventType::Exit, "document"),
            ]
        );
    }

    #[test]
    fn test_done_is_sticky() {
        let doc = parse_document(b"x", Options::DEFAULT);
        let mut iter = doc.iter();
        assert_eq!(iter.event_type(), EventType::None);
        assert!(iter.node().is_none());
        while iter.advance(&doc).unwrap() != EventType::Done {}
        assert_eq!(iter.advance(&doc).unwrap(), EventType::Done);
        assert_eq!(iter.event_type(), EventType::Done);
        assert!(iter.node().is_none());
        assert_eq!(iter.root(), doc.root_handle());
    }

    #[test]
    fn test_subtree_iteration() {
        let doc = parse_document(b"# Title\n\nbody\n", Options::DEFAULT);
        let heading = doc.root().first_child().unwrap();
        let mut iter = TreeIterator::new(&doc, heading.handle()).unwrap();
        let mut seen = Vec::new();
        loop {
            match iter.advance(&doc).unwrap() {
                EventType::Done => break,
                event => seen.push((event, doc.node(iter.node().unwrap()).unwrap().node_type())),
            }
        }
        assert_eq!(
            seen,
            vec![
                (EventType::Enter, NodeType::Heading),
                (EventType::Enter, NodeType::Text),
                (EventType::Exit, NodeType::Text),
                (EventType::Exit, NodeType::Heading),
            ]
        );
    }

    #[test]
    fn test_foreign_document_rejected() {
        let first = parse_document(b"x", Options::DEFAULT);
        let second = parse_document(b"x", Options::DEFAULT);
        let mut iter = first.iter();
        assert_eq!(iter.advance(&second).unwrap_err(), Error::ForeignHandle);
        assert!(TreeIterator::new(&second, first.root_handle()).is_err());
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let source = ">".repeat(1_000) + " deep\n";
        let doc = parse_document(source.as_bytes(), Options::DEFAULT);
        let count = doc.walk().count();
        assert!(count > 2);
        assert_eq!(count % 2, 0);
    }

    #[test]
    fn test_independent_iterators() {
        let doc = parse_document(b"a\n\nb\n", Options::DEFAULT);
        let mut first = doc.iter();
        let mut second = doc.iter();
        first.advance(&doc).unwrap();
        first.advance(&doc).unwrap();
        second.advance(&doc).unwrap();
        assert_eq!(doc.node(first.node().unwrap()).unwrap().node_type(), NodeType::Paragraph);
        assert_eq!(doc.node(second.node().unwrap()).unwrap().node_type(), NodeType::Document);
    }

    proptest! {
        #[test]
        fn prop_events_are_balanced(source in "[-*>#` a-z\\[\\]()\n|~_]{0,200}") {
            let doc = parse_document(source.as_bytes(), Options::DEFAULT);
            let mut open: Vec<NodeHandle> = Vec::new();
            for (event, node) in doc.walk() {
                match event {
                    EventType::Enter => open.push(node.handle()),
                    EventType::Exit => prop_assert_eq!(open.pop(), Some(node.handle())),
                    _ => prop_assert!(false, "unexpected event"),
                }
            }
            prop_assert!(open.is_empty());
        }

        #[test]
        fn prop_render_options_leave_tree_alone(source in "[-*>#` a-z\\[\\]()\n|~_]{0,200}") {
            let annotated = Options::SOURCEPOS | Options::HARDBREAKS;
            let plain = parse_document(source.as_bytes(), Options::DEFAULT);
            let marked = parse_document(source.as_bytes(), annotated);
            prop_assert_eq!(outline(&plain), outline(&marked));

            let registry = ExtensionRegistry::global();
            let extensions: Vec<_> = registry.names().filter_map(|name| registry.find(name)).collect();
            let plain = parse_document_with(source.as_bytes(), Options::DEFAULT, &extensions).unwrap();
            let marked = parse_document_with(source.as_bytes(), annotated, &extensions).unwrap();
            prop_assert_eq!(outline(&plain), outline(&marked));
        }
    }
}
