//! Node types, handles, and borrowed node views.

use std::fmt;
use std::ops::Range;

use crate::attributes::{AttrValue, ExtensionAttributes};
use crate::document::{Document, DocumentId};
use crate::error::{Error, Result};

/// An extension-defined node type, named by its owning extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExtensionNodeType {
    /// Name of the extension that defines the type (e.g. `"table"`).
    pub extension: &'static str,
    /// Type name reported by `type_string` (e.g. `"table_cell"`).
    pub name: &'static str,
}

/// Node kind.
///
/// The core set is closed; extension-specific kinds live under
/// [`NodeType::Extension`] instead of widening it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NodeType {
    /// Unset sentinel.
    None,
    Document,
    BlockQuote,
    List,
    Item,
    CodeBlock,
    HtmlBlock,
    Paragraph,
    Heading,
    ThematicBreak,
    FootnoteDefinition,
    Text,
    SoftBreak,
    LineBreak,
    Code,
    HtmlInline,
    Emph,
    Strong,
    Link,
    Image,
    FootnoteReference,
    Extension(ExtensionNodeType),
}

impl NodeType {
    /// Display name (`"paragraph"`, `"text"`, `"table_cell"`, ...).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Document => "document",
            Self::BlockQuote => "block_quote",
            Self::List => "list",
            Self::Item => "item",
            Self::CodeBlock => "code_block",
            Self::HtmlBlock => "html_block",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::ThematicBreak => "thematic_break",
            Self::FootnoteDefinition => "footnote_definition",
            Self::Text => "text",
            Self::SoftBreak => "softbreak",
            Self::LineBreak => "linebreak",
            Self::Code => "code",
            Self::HtmlInline => "html_inline",
            Self::Emph => "emph",
            Self::Strong => "strong",
            Self::Link => "link",
            Self::Image => "image",
            Self::FootnoteReference => "footnote_reference",
            Self::Extension(ext) => ext.name,
        }
    }

    /// Block-level kinds. Extension kinds report `false`.
    #[must_use]
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::BlockQuote
                | Self::List
                | Self::Item
                | Self::CodeBlock
                | Self::HtmlBlock
                | Self::Paragraph
                | Self::Heading
                | Self::ThematicBreak
                | Self::FootnoteDefinition
        )
    }

    /// Kinds that carry a literal text payload.
    #[must_use]
    pub fn has_literal(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Code | Self::CodeBlock | Self::HtmlBlock | Self::HtmlInline
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 1-based source position of a node. All zero when source positions
/// were not requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceSpan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// Bullet or ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ListType {
    Bullet,
    Ordered,
}

/// List attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListInfo {
    pub list_type: ListType,
    /// First number of an ordered list (1 for bullet lists).
    pub start: u64,
    /// No blank lines between items or their children.
    pub tight: bool,
    /// Marker character from the source: `-`, `*`, `+`, `.` or `)`.
    pub marker: char,
}

/// Type-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum NodeValue {
    #[default]
    None,
    Heading {
        level: u8,
    },
    List(ListInfo),
    CodeBlock {
        info: String,
        fenced: bool,
    },
    Link {
        url: String,
        title: String,
        autolink: bool,
    },
    Footnote {
        label: String,
    },
}

/// Arena slot for one node.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) node_type: NodeType,
    pub(crate) literal: Option<String>,
    pub(crate) value: NodeValue,
    pub(crate) range: Range<usize>,
    pub(crate) span: SourceSpan,
    pub(crate) parent: Option<u32>,
    /// Index within the parent's `children`.
    pub(crate) position: u32,
    pub(crate) children: Vec<u32>,
    pub(crate) owner: Option<&'static str>,
    pub(crate) attrs: ExtensionAttributes,
}

impl NodeData {
    pub(crate) fn new(node_type: NodeType, range: Range<usize>) -> Self {
        Self {
            node_type,
            literal: None,
            value: NodeValue::None,
            range,
            span: SourceSpan::default(),
            parent: None,
            position: 0,
            children: Vec::new(),
            owner: None,
            attrs: ExtensionAttributes::default(),
        }
    }
}

/// Detached reference to a node of one specific [`Document`].
///
/// Handles are plain values and do not borrow the document, so they can be
/// kept across mutations of extension attributes. Presenting a handle to
/// any other document fails with [`Error::ForeignHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) document: DocumentId,
    pub(crate) index: u32,
}

impl NodeHandle {
    /// Arena index of the node within its document.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }
}

/// Borrowed view of a node. Cannot outlive its document.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) index: u32,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn data(&self) -> &'a NodeData {
        &self.doc.nodes[self.index as usize]
    }

    fn at(&self, index: u32) -> NodeRef<'a> {
        NodeRef {
            doc: self.doc,
            index,
        }
    }

    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        NodeHandle {
            document: self.doc.id,
            index: self.index,
        }
    }

    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.data().node_type
    }

    /// Type name, as overridden by the owning extension when it does so.
    #[must_use]
    pub fn type_string(&self) -> &'static str {
        let node_type = self.node_type();
        self.owner()
            .and_then(|owner| self.doc.extension(owner))
            .and_then(|ext| ext.node_type_string(node_type))
            .unwrap_or_else(|| node_type.name())
    }

    /// Text payload of literal-bearing nodes.
    #[must_use]
    pub fn literal(&self) -> Option<&'a str> {
        self.data().literal.as_deref()
    }

    /// Source span; zero unless the document was parsed with `SOURCEPOS`.
    #[must_use]
    pub fn span(&self) -> SourceSpan {
        self.data().span
    }

    /// Extension that produced or claimed this node.
    #[must_use]
    pub fn owner(&self) -> Option<&'static str> {
        self.data().owner
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|index| self.at(index))
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + ExactSizeIterator + use<'a> {
        let doc = self.doc;
        self.data()
            .children
            .iter()
            .map(move |&index| NodeRef { doc, index })
    }

    #[must_use]
    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.data().children.first().map(|&index| self.at(index))
    }

    #[must_use]
    pub fn last_child(&self) -> Option<NodeRef<'a>> {
        self.data().children.last().map(|&index| self.at(index))
    }

    fn sibling(&self, offset: isize) -> Option<NodeRef<'a>> {
        let parent = self.parent()?;
        let target = (self.data().position as usize).checked_add_signed(offset)?;
        parent.data().children.get(target).map(|&index| self.at(index))
    }

    #[must_use]
    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        self.sibling(1)
    }

    #[must_use]
    pub fn previous_sibling(&self) -> Option<NodeRef<'a>> {
        self.sibling(-1)
    }

    /// Heading level (1-6) for heading nodes.
    #[must_use]
    pub fn heading_level(&self) -> Option<u8> {
        match self.data().value {
            NodeValue::Heading { level } => Some(level),
            _ => None,
        }
    }

    #[must_use]
    pub fn list_info(&self) -> Option<ListInfo> {
        match self.data().value {
            NodeValue::List(info) => Some(info),
            _ => None,
        }
    }

    /// Full info string of a code block (or of a block claimed from one).
    #[must_use]
    pub fn code_info(&self) -> Option<&'a str> {
        match &self.data().value {
            NodeValue::CodeBlock { info, .. } => Some(info),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_fenced(&self) -> bool {
        matches!(self.data().value, NodeValue::CodeBlock { fenced: true, .. })
    }

    /// Destination of links and images.
    #[must_use]
    pub fn url(&self) -> Option<&'a str> {
        match &self.data().value {
            NodeValue::Link { url, .. } => Some(url),
            _ => None,
        }
    }

    #[must_use]
    pub fn title(&self) -> Option<&'a str> {
        match &self.data().value {
            NodeValue::Link { title, .. } => Some(title),
            _ => None,
        }
    }

    /// Link written as `<url>` in the source (or produced by `autolink`).
    #[must_use]
    pub fn is_autolink(&self) -> bool {
        matches!(self.data().value, NodeValue::Link { autolink: true, .. })
    }

    #[must_use]
    pub fn footnote_label(&self) -> Option<&'a str> {
        match &self.data().value {
            NodeValue::Footnote { label } => Some(label),
            _ => None,
        }
    }

    /// Extension attribute stored under `extension`.
    #[must_use]
    pub fn attribute(&self, extension: &str, key: &str) -> Option<&'a AttrValue> {
        self.data().attrs.get(extension, key)
    }

    /// Concatenated literals of all descendant text-like nodes.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        match self.node_type() {
            NodeType::SoftBreak | NodeType::LineBreak => out.push(' '),
            _ => {
                if let Some(literal) = self.literal() {
                    out.push_str(literal);
                }
            }
        }
        for child in self.children() {
            child.collect_text(out);
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("index", &self.index)
            .field("type", &self.type_string())
            .field("literal", &self.literal())
            .finish()
    }
}

impl Document {
    /// Borrow the node behind `handle`.
    ///
    /// # Errors
    ///
    /// [`Error::ForeignHandle`] when the handle came from another document,
    /// [`Error::InvalidHandle`] when its index is out of range.
    pub fn node(&self, handle: NodeHandle) -> Result<NodeRef<'_>> {
        self.check(handle)?;
        Ok(NodeRef {
            doc: self,
            index: handle.index,
        })
    }

    pub(crate) fn check(&self, handle: NodeHandle) -> Result<()> {
        if handle.document != self.id {
            return Err(Error::ForeignHandle);
        }
        if handle.index as usize >= self.nodes.len() {
            return Err(Error::InvalidHandle(handle.index));
        }
        Ok(())
    }
}
