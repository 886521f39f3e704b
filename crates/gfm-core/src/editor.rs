//! Tree rewriting for extension post-processing.

use std::ops::Range;

use crate::attributes::AttrValue;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::node::{NodeData, NodeHandle, NodeRef, NodeType, NodeValue, SourceSpan};
use crate::options::Options;
use crate::util::LineIndex;

/// Mutable access to a freshly parsed tree, handed to
/// [`SyntaxExtension::postprocess`](crate::SyntaxExtension::postprocess).
///
/// Positions are byte ranges into the decoded source. Spans computed here
/// are always real, whether or not `SOURCEPOS` was requested.
pub struct DocumentEditor<'a> {
    doc: &'a mut Document,
    lines: &'a LineIndex<'a>,
}

impl<'a> DocumentEditor<'a> {
    pub(crate) fn new(doc: &'a mut Document, lines: &'a LineIndex<'a>) -> Self {
        Self { doc, lines }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        self.doc
    }

    #[must_use]
    pub fn options(&self) -> Options {
        self.doc.options
    }

    /// Decoded source text.
    #[must_use]
    pub fn source(&self) -> &str {
        self.lines.source()
    }

    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.doc.root_handle()
    }

    pub fn node(&self, handle: NodeHandle) -> Result<NodeRef<'_>> {
        self.doc.node(handle)
    }

    /// Handles of every node reachable from the root, in document order.
    ///
    /// A snapshot, so the tree can be edited while walking it.
    #[must_use]
    pub fn handles(&self) -> Vec<NodeHandle> {
        let mut handles = Vec::with_capacity(self.doc.nodes.len());
        let mut stack = vec![self.doc.root];
        while let Some(index) = stack.pop() {
            handles.push(NodeHandle {
                document: self.doc.id,
                index,
            });
            stack.extend(self.doc.nodes[index as usize].children.iter().rev());
        }
        handles
    }

    pub fn source_range(&self, handle: NodeHandle) -> Result<Range<usize>> {
        Ok(self.data(handle)?.range.clone())
    }

    pub fn source_span(&self, handle: NodeHandle) -> Result<SourceSpan> {
        Ok(self.lines.span(&self.data(handle)?.range))
    }

    /// Set an attribute, tagging the node with the extension's table.
    pub fn set_attribute(
        &mut self,
        handle: NodeHandle,
        extension: &'static str,
        key: &'static str,
        value: impl Into<AttrValue>,
    ) -> Result<()> {
        self.data_mut(handle)?.attrs.insert(extension, key, value.into());
        Ok(())
    }

    pub fn set_owner(&mut self, handle: NodeHandle, owner: Option<&'static str>) -> Result<()> {
        self.data_mut(handle)?.owner = owner;
        Ok(())
    }

    pub fn set_literal(&mut self, handle: NodeHandle, literal: impl Into<String>) -> Result<()> {
        self.data_mut(handle)?.literal = Some(literal.into());
        Ok(())
    }

    /// Change a node's type. Extension types take the extension as owner.
    pub fn set_type(&mut self, handle: NodeHandle, node_type: NodeType) -> Result<()> {
        let data = self.data_mut(handle)?;
        data.node_type = node_type;
        if let NodeType::Extension(ext) = node_type {
            data.owner = Some(ext.extension);
        }
        Ok(())
    }

    /// Create a detached node.
    pub fn new_node(&mut self, node_type: NodeType, range: Range<usize>) -> NodeHandle {
        let mut data = NodeData::new(node_type, range);
        if let NodeType::Extension(ext) = node_type {
            data.owner = Some(ext.extension);
        }
        self.push(data)
    }

    pub fn new_text(&mut self, literal: impl Into<String>, range: Range<usize>) -> NodeHandle {
        let mut data = NodeData::new(NodeType::Text, range);
        data.literal = Some(literal.into());
        self.push(data)
    }

    pub fn new_link(
        &mut self,
        url: impl Into<String>,
        title: impl Into<String>,
        autolink: bool,
        range: Range<usize>,
    ) -> NodeHandle {
        let mut data = NodeData::new(NodeType::Link, range);
        data.value = NodeValue::Link {
            url: url.into(),
            title: title.into(),
            autolink,
        };
        self.push(data)
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.check_move(parent, child)?;
        self.detach(child)?;
        self.doc.nodes[parent.index as usize].children.push(child.index);
        self.doc.nodes[child.index as usize].parent = Some(parent.index);
        self.renumber(parent.index);
        Ok(())
    }

    /// Move `node` right before `anchor` under the anchor's parent.
    pub fn insert_before(&mut self, anchor: NodeHandle, node: NodeHandle) -> Result<()> {
        let parent = self
            .data(anchor)?
            .parent
            .ok_or(Error::InvalidTreeEdit("anchor has no parent"))?;
        let parent_handle = NodeHandle {
            document: self.doc.id,
            index: parent,
        };
        self.check_move(parent_handle, node)?;
        if anchor == node {
            return Err(Error::InvalidTreeEdit("node cannot be its own anchor"));
        }
        self.detach(node)?;
        let siblings = &mut self.doc.nodes[parent as usize].children;
        let position = siblings
            .iter()
            .position(|&index| index == anchor.index)
            .unwrap_or(siblings.len());
        siblings.insert(position, node.index);
        self.doc.nodes[node.index as usize].parent = Some(parent);
        self.renumber(parent);
        Ok(())
    }

    /// Remove a node (with its subtree) from the tree.
    pub fn detach(&mut self, handle: NodeHandle) -> Result<()> {
        let Some(parent) = self.data(handle)?.parent else {
            return Ok(());
        };
        self.doc.nodes[parent as usize]
            .children
            .retain(|&index| index != handle.index);
        self.doc.nodes[handle.index as usize].parent = None;
        self.renumber(parent);
        Ok(())
    }

    /// Replace a node with its children.
    pub fn unwrap_node(&mut self, handle: NodeHandle) -> Result<()> {
        let children = self.data(handle)?.children.clone();
        for child in children {
            self.insert_before(
                handle,
                NodeHandle {
                    document: self.doc.id,
                    index: child,
                },
            )?;
        }
        self.detach(handle)
    }

    /// Merge runs of adjacent text children of `parent`.
    pub fn merge_adjacent_text(&mut self, parent: NodeHandle) -> Result<()> {
        let children = self.data(parent)?.children.clone();
        let mut kept: Vec<u32> = Vec::with_capacity(children.len());
        for child in children {
            let is_text = self.doc.nodes[child as usize].node_type == NodeType::Text;
            let previous = kept
                .last()
                .copied()
                .filter(|&last| is_text && self.doc.nodes[last as usize].node_type == NodeType::Text);
            if let Some(previous) = previous {
                let (literal, end) = {
                    let data = &self.doc.nodes[child as usize];
                    (data.literal.clone().unwrap_or_default(), data.range.end)
                };
                let target = &mut self.doc.nodes[previous as usize];
                target.literal.get_or_insert_with(String::new).push_str(&literal);
                target.range.end = target.range.end.max(end);
                self.doc.nodes[child as usize].parent = None;
            } else {
                kept.push(child);
            }
        }
        self.doc.nodes[parent.index as usize].children = kept;
        self.renumber(parent.index);
        Ok(())
    }

    /// Refresh the sibling positions of `parent`'s children.
    fn renumber(&mut self, parent: u32) {
        let children = std::mem::take(&mut self.doc.nodes[parent as usize].children);
        for (position, &child) in children.iter().enumerate() {
            self.doc.nodes[child as usize].position = u32::try_from(position).unwrap_or(u32::MAX);
        }
        self.doc.nodes[parent as usize].children = children;
    }

    fn push(&mut self, data: NodeData) -> NodeHandle {
        let index = u32::try_from(self.doc.nodes.len()).unwrap_or(u32::MAX);
        self.doc.nodes.push(data);
        NodeHandle {
            document: self.doc.id,
            index,
        }
    }

    fn data(&self, handle: NodeHandle) -> Result<&NodeData> {
        self.doc.check(handle)?;
        Ok(&self.doc.nodes[handle.index as usize])
    }

    fn data_mut(&mut self, handle: NodeHandle) -> Result<&mut NodeData> {
        self.doc.check(handle)?;
        Ok(&mut self.doc.nodes[handle.index as usize])
    }

    /// `child` may move under `parent` unless that would create a cycle.
    fn check_move(&self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.doc.check(parent)?;
        self.doc.check(child)?;
        if child.index == self.doc.root {
            return Err(Error::InvalidTreeEdit("the document node cannot move"));
        }
        let mut cursor = Some(parent.index);
        while let Some(index) = cursor {
            if index == child.index {
                return Err(Error::InvalidTreeEdit("node cannot move under itself"));
            }
            cursor = self.doc.nodes[index as usize].parent;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use pretty_assertions::assert_eq;

    fn document(source: &str) -> Document {
        let (nodes, root) = engine::build(source, pulldown_cmark::Options::empty());
        Document::new(nodes, root, Options::DEFAULT, Vec::new())
    }

    fn texts(doc: &Document) -> Vec<String> {
        doc.walk()
            .filter(|(event, node)| *event == crate::EventType::Enter && node.node_type() == NodeType::Text)
            .map(|(_, node)| node.literal().unwrap_or_default().to_owned())
            .collect()
    }

    #[test]
    fn test_handles_in_document_order() {
        let mut doc = document("a *b*\n");
        let source = "a *b*\n";
        let lines = LineIndex::new(source);
        let editor = DocumentEditor::new(&mut doc, &lines);
        let types: Vec<_> = editor
            .handles()
            .into_iter()
            .map(|h| editor.node(h).unwrap().node_type())
            .collect();
        assert_eq!(
            types,
            vec![
                NodeType::Document,
                NodeType::Paragraph,
                NodeType::Text,
                NodeType::Emph,
                NodeType::Text,
            ]
        );
    }

    #[test]
    fn test_unwrap_and_merge() {
        let source = "a *b* c\n";
        let mut doc = document(source);
        let lines = LineIndex::new(source);
        let mut editor = DocumentEditor::new(&mut doc, &lines);
        let handles = editor.handles();
        let paragraph = handles[1];
        let emph = handles[3];
        editor.unwrap_node(emph).unwrap();
        editor.merge_adjacent_text(paragraph).unwrap();
        assert_eq!(texts(&doc), vec!["a b c"]);
    }

    #[test]
    fn test_sibling_links_follow_edits() {
        let source = "a *b* `c`\n";
        let mut doc = document(source);
        let lines = LineIndex::new(source);
        let mut editor = DocumentEditor::new(&mut doc, &lines);
        let handles = editor.handles();
        let (text, emph, code) = (handles[2], handles[3], handles[6]);
        editor.insert_before(text, code).unwrap();
        editor.detach(emph).unwrap();
        let paragraph = doc.root().first_child().unwrap();
        let first = paragraph.first_child().unwrap();
        assert_eq!(first.node_type(), NodeType::Code);
        assert!(first.previous_sibling().is_none());
        let second = first.next_sibling().unwrap();
        assert_eq!(second.literal(), Some("a "));
        assert_eq!(second.previous_sibling().unwrap().node_type(), NodeType::Code);
        let last = second.next_sibling().unwrap();
        assert_eq!(last.literal(), Some(" "));
        assert!(last.next_sibling().is_none());
    }

    #[test]
    fn test_cycle_rejected() {
        let source = "*a*\n";
        let mut doc = document(source);
        let lines = LineIndex::new(source);
        let mut editor = DocumentEditor::new(&mut doc, &lines);
        let handles = editor.handles();
        let (paragraph, emph) = (handles[1], handles[2]);
        assert_eq!(
            editor.append_child(emph, paragraph).unwrap_err(),
            Error::InvalidTreeEdit("node cannot move under itself")
        );
    }

    #[test]
    fn test_source_span_is_real() {
        let source = "\n# Title\n";
        let mut doc = document(source);
        let lines = LineIndex::new(source);
        let editor = DocumentEditor::new(&mut doc, &lines);
        let heading = editor.handles()[1];
        assert_eq!(editor.source_span(heading).unwrap().to_string(), "2:1-2:7");
    }
}
