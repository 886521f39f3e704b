//! Tree construction from the pulldown-cmark event stream.
//!
//! The engine's events carry byte ranges into the source. The builder keeps
//! a stack of open containers and appends leaves to the innermost one,
//! which yields the same block/inline tree a CommonMark reference parser
//! produces: text runs are merged, tight list items get their implicit
//! paragraph back, and list tightness is recorded on the list.

use std::ops::Range;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, LinkType, Tag, TagEnd};

use crate::attributes::AttrValue;
use crate::extension::{EngineFeature, ExtensionRef};
use crate::extension::{strikethrough, table, tasklist};
use crate::node::{ExtensionNodeType, ListInfo, ListType, NodeData, NodeType, NodeValue};
use crate::options::Options;
use crate::util::heading_level_to_num;

/// Engine switches derived from the parse options and attached extensions.
pub(crate) fn engine_options(options: Options, extensions: &[ExtensionRef]) -> pulldown_cmark::Options {
    let mut flags = pulldown_cmark::Options::empty();
    if options.contains(Options::SMART) {
        flags.insert(pulldown_cmark::Options::ENABLE_SMART_PUNCTUATION);
    }
    if options.contains(Options::FOOTNOTES) {
        flags.insert(pulldown_cmark::Options::ENABLE_FOOTNOTES);
    }
    for feature in extensions.iter().flat_map(|ext| ext.engine_features()) {
        flags.insert(match feature {
            EngineFeature::Tables => pulldown_cmark::Options::ENABLE_TABLES,
            EngineFeature::Strikethrough => pulldown_cmark::Options::ENABLE_STRIKETHROUGH,
            EngineFeature::TaskLists => pulldown_cmark::Options::ENABLE_TASKLISTS,
        });
    }
    flags
}

/// Parse `source` into arena nodes. Returns the nodes and the root index.
pub(crate) fn build(source: &str, flags: pulldown_cmark::Options) -> (Vec<NodeData>, u32) {
    let mut builder = TreeBuilder::new(source);
    for (event, range) in pulldown_cmark::Parser::new_ext(source, flags).into_offset_iter() {
        builder.push(event, range);
    }
    builder.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    /// A node from a start tag.
    Node,
    /// Paragraph restored around the inline content of a tight list item.
    ImplicitParagraph,
    /// Tag with no node of its own; children go to the enclosing node.
    Transparent,
    /// Tag whose content is dropped.
    Skip,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    node: u32,
}

struct TreeBuilder<'s> {
    source: &'s str,
    nodes: Vec<NodeData>,
    stack: Vec<Frame>,
    alignments: Vec<Vec<Alignment>>,
    after_task_marker: bool,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        let root = NodeData::new(NodeType::Document, 0..source.len());
        Self {
            source,
            nodes: vec![root],
            stack: vec![Frame {
                kind: FrameKind::Node,
                node: 0,
            }],
            alignments: Vec::new(),
            after_task_marker: false,
        }
    }

    fn finish(mut self) -> (Vec<NodeData>, u32) {
        while self.stack.len() > 1 {
            self.pop();
        }
        (self.nodes, 0)
    }

    /// Innermost frame that owns a node.
    fn current(&self) -> u32 {
        self.stack
            .iter()
            .rev()
            .find(|frame| matches!(frame.kind, FrameKind::Node | FrameKind::ImplicitParagraph))
            .map_or(0, |frame| frame.node)
    }

    fn current_type(&self) -> NodeType {
        self.nodes[self.current() as usize].node_type
    }

    fn skipping(&self) -> bool {
        self.stack.iter().any(|frame| frame.kind == FrameKind::Skip)
    }

    fn append(&mut self, mut data: NodeData) -> u32 {
        let parent = self.current();
        let index = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        data.parent = Some(parent);
        data.position = u32::try_from(self.nodes[parent as usize].children.len()).unwrap_or(u32::MAX);
        self.nodes.push(data);
        self.nodes[parent as usize].children.push(index);
        index
    }

    fn open(&mut self, data: NodeData) -> u32 {
        let index = self.append(data);
        self.stack.push(Frame {
            kind: FrameKind::Node,
            node: index,
        });
        index
    }

    fn pop(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if frame.kind == FrameKind::ImplicitParagraph {
            let end = self.nodes[frame.node as usize]
                .children
                .last()
                .map(|&child| self.nodes[child as usize].range.end);
            if let Some(end) = end {
                self.nodes[frame.node as usize].range.end = end;
            }
        }
    }

    fn close_implicit_paragraph(&mut self) {
        if self
            .stack
            .last()
            .is_some_and(|frame| frame.kind == FrameKind::ImplicitParagraph)
        {
            self.pop();
        }
    }

    /// Inline content directly inside a list item belongs to a paragraph.
    fn ensure_inline_container(&mut self, start: usize) {
        if self.current_type() == NodeType::Item {
            let index = self.append(NodeData::new(NodeType::Paragraph, start..start));
            self.stack.push(Frame {
                kind: FrameKind::ImplicitParagraph,
                node: index,
            });
        }
    }

    fn open_block(&mut self, data: NodeData) -> u32 {
        self.close_implicit_paragraph();
        self.open(data)
    }

    fn open_inline(&mut self, data: NodeData) -> u32 {
        self.ensure_inline_container(data.range.start);
        self.open(data)
    }

    fn push(&mut self, event: Event<'_>, range: Range<usize>) {
        let after_task_marker = std::mem::take(&mut self.after_task_marker);
        match event {
            Event::Text(text) if after_task_marker => {
                let trimmed = text.trim_start();
                let skipped = text.len() - trimmed.len();
                if !trimmed.is_empty() {
                    self.text(trimmed, (range.start + skipped).min(range.end)..range.end);
                }
            }
            Event::Start(tag) => self.start(tag, range),
            Event::End(tag) => self.end(tag),
            Event::Text(text) | Event::InlineMath(text) | Event::DisplayMath(text) => {
                self.text(&text, range);
            }
            Event::Code(code) => {
                self.inline_leaf(NodeType::Code, Some(code.into_string()), range);
            }
            Event::Html(html) => {
                if self.current_type() == NodeType::HtmlBlock {
                    self.extend_literal(&html);
                } else {
                    self.inline_leaf(NodeType::HtmlInline, Some(html.into_string()), range);
                }
            }
            Event::InlineHtml(html) => {
                self.inline_leaf(NodeType::HtmlInline, Some(html.into_string()), range);
            }
            Event::FootnoteReference(label) => {
                if self.skipping() {
                    return;
                }
                self.ensure_inline_container(range.start);
                let mut data = NodeData::new(NodeType::FootnoteReference, range);
                data.value = NodeValue::Footnote {
                    label: label.into_string(),
                };
                self.append(data);
            }
            Event::SoftBreak => self.inline_leaf(NodeType::SoftBreak, None, range),
            Event::HardBreak => self.inline_leaf(NodeType::LineBreak, None, range),
            Event::Rule => {
                if self.skipping() {
                    return;
                }
                self.close_implicit_paragraph();
                self.append(NodeData::new(NodeType::ThematicBreak, range));
            }
            Event::TaskListMarker(checked) => self.task_marker(checked),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        if self.skipping() {
            self.stack.push(Frame {
                kind: FrameKind::Skip,
                node: 0,
            });
            return;
        }
        match tag {
            Tag::Paragraph => {
                self.close_implicit_paragraph();
                if self.current_type() == NodeType::Item {
                    self.mark_loose();
                }
                self.open(NodeData::new(NodeType::Paragraph, range));
            }
            Tag::Heading { level, .. } => {
                let mut data = NodeData::new(NodeType::Heading, range);
                data.value = NodeValue::Heading {
                    level: heading_level_to_num(level),
                };
                self.open_block(data);
            }
            Tag::BlockQuote(_) => {
                self.open_block(NodeData::new(NodeType::BlockQuote, range));
            }
            Tag::CodeBlock(kind) => {
                let (info, fenced) = match kind {
                    CodeBlockKind::Fenced(info) => (info.into_string(), true),
                    CodeBlockKind::Indented => (String::new(), false),
                };
                let mut data = NodeData::new(NodeType::CodeBlock, range);
                data.literal = Some(String::new());
                data.value = NodeValue::CodeBlock { info, fenced };
                self.open_block(data);
            }
            Tag::HtmlBlock => {
                let mut data = NodeData::new(NodeType::HtmlBlock, range);
                data.literal = Some(String::new());
                self.open_block(data);
            }
            Tag::List(start) => {
                let list_type = if start.is_some() {
                    ListType::Ordered
                } else {
                    ListType::Bullet
                };
                let mut data = NodeData::new(NodeType::List, range.clone());
                data.value = NodeValue::List(ListInfo {
                    list_type,
                    start: start.unwrap_or(1),
                    tight: true,
                    marker: list_marker(self.source, range.start, list_type),
                });
                self.open_block(data);
            }
            Tag::Item => {
                self.open_block(NodeData::new(NodeType::Item, range));
            }
            Tag::FootnoteDefinition(label) => {
                let mut data = NodeData::new(NodeType::FootnoteDefinition, range);
                data.value = NodeValue::Footnote {
                    label: label.into_string(),
                };
                self.open_block(data);
            }
            Tag::Table(alignments) => {
                let mut data = extension_node(table::TABLE, range);
                let columns = i64::try_from(alignments.len()).unwrap_or(i64::MAX);
                data.attrs
                    .insert(table::NAME, "columns", AttrValue::Int(columns));
                self.alignments.push(alignments);
                self.open_block(data);
            }
            Tag::TableHead => {
                self.open(extension_node(table::TABLE_HEADER, range));
            }
            Tag::TableRow => {
                self.open(extension_node(table::TABLE_ROW, range));
            }
            Tag::TableCell => {
                let column = self.nodes[self.current() as usize].children.len();
                let mut data = extension_node(table::TABLE_CELL, range);
                let alignment = self
                    .alignments
                    .last()
                    .and_then(|alignments| alignments.get(column))
                    .and_then(|alignment| table::alignment_name(*alignment));
                if let Some(alignment) = alignment {
                    data.attrs
                        .insert(table::NAME, "align", AttrValue::from(alignment));
                }
                self.open(data);
            }
            Tag::Emphasis => {
                self.open_inline(NodeData::new(NodeType::Emph, range));
            }
            Tag::Strong => {
                self.open_inline(NodeData::new(NodeType::Strong, range));
            }
            Tag::Strikethrough => {
                self.open_inline(extension_node(strikethrough::STRIKETHROUGH, range));
            }
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let autolink = matches!(link_type, LinkType::Autolink | LinkType::Email);
                let mut url = dest_url.into_string();
                if link_type == LinkType::Email && !url.starts_with("mailto:") {
                    url.insert_str(0, "mailto:");
                }
                let mut data = NodeData::new(NodeType::Link, range);
                data.value = NodeValue::Link {
                    url,
                    title: title.into_string(),
                    autolink,
                };
                self.open_inline(data);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut data = NodeData::new(NodeType::Image, range);
                data.value = NodeValue::Link {
                    url: dest_url.into_string(),
                    title: title.into_string(),
                    autolink: false,
                };
                self.open_inline(data);
            }
            Tag::MetadataBlock(_) => self.stack.push(Frame {
                kind: FrameKind::Skip,
                node: 0,
            }),
            Tag::Superscript
            | Tag::Subscript
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition => self.stack.push(Frame {
                kind: FrameKind::Transparent,
                node: 0,
            }),
        }
    }

    fn end(&mut self, tag: TagEnd) {
        if !matches!(tag, TagEnd::Paragraph) {
            self.close_implicit_paragraph();
        }
        if matches!(tag, TagEnd::Table) {
            self.alignments.pop();
        }
        self.pop();
    }

    fn text(&mut self, text: &str, range: Range<usize>) {
        if self.skipping() {
            return;
        }
        if matches!(
            self.current_type(),
            NodeType::CodeBlock | NodeType::HtmlBlock
        ) {
            self.extend_literal(text);
            return;
        }
        self.ensure_inline_container(range.start);
        let parent = self.current();
        if let Some(&last) = self.nodes[parent as usize].children.last() {
            let sibling = &mut self.nodes[last as usize];
            if sibling.node_type == NodeType::Text {
                if let Some(literal) = sibling.literal.as_mut() {
                    literal.push_str(text);
                }
                sibling.range.end = sibling.range.end.max(range.end);
                return;
            }
        }
        let mut data = NodeData::new(NodeType::Text, range);
        data.literal = Some(text.to_owned());
        self.append(data);
    }

    fn extend_literal(&mut self, text: &str) {
        let current = self.current() as usize;
        self.nodes[current]
            .literal
            .get_or_insert_with(String::new)
            .push_str(text);
    }

    fn inline_leaf(&mut self, node_type: NodeType, literal: Option<String>, range: Range<usize>) {
        if self.skipping() {
            return;
        }
        self.ensure_inline_container(range.start);
        let mut data = NodeData::new(node_type, range);
        data.literal = literal;
        self.append(data);
    }

    fn mark_loose(&mut self) {
        let item = self.current() as usize;
        if let Some(list) = self.nodes[item].parent {
            if let NodeValue::List(info) = &mut self.nodes[list as usize].value {
                info.tight = false;
            }
        }
    }

    /// The checkbox belongs to the innermost open item.
    fn task_marker(&mut self, checked: bool) {
        let item = self
            .stack
            .iter()
            .rev()
            .find(|frame| {
                frame.kind == FrameKind::Node
                    && self.nodes[frame.node as usize].node_type == NodeType::Item
            })
            .map(|frame| frame.node as usize);
        if let Some(item) = item {
            self.after_task_marker = true;
            let data = &mut self.nodes[item];
            data.owner = Some(tasklist::NAME);
            data.attrs
                .insert(tasklist::NAME, "checked", AttrValue::Bool(checked));
        }
    }
}

fn extension_node(node_type: ExtensionNodeType, range: Range<usize>) -> NodeData {
    let mut data = NodeData::new(NodeType::Extension(node_type), range);
    data.owner = Some(node_type.extension);
    data
}

/// Marker character used in the source for a list starting at `offset`.
fn list_marker(source: &str, offset: usize, list_type: ListType) -> char {
    let rest = source.get(offset..).unwrap_or_default();
    let mut chars = rest.chars().skip_while(|c| *c == ' ' || *c == '\t');
    match list_type {
        ListType::Bullet => match chars.next() {
            Some(c @ ('-' | '*' | '+')) => c,
            _ => '-',
        },
        ListType::Ordered => match chars.find(|c| !c.is_ascii_digit()) {
            Some(c @ ('.' | ')')) => c,
            _ => '.',
        },
    }
}
