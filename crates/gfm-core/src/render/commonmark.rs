//! CommonMark rendering.
//!
//! Writes markdown that parses back to the same tree. Block structure is
//! carried by a prefix stack (`> ` for quotes, spaces for list items);
//! pending newlines are collapsed so tight lists stay tight.

use crate::document::Document;
use crate::extension::ExtensionRef;
use crate::iter::EventType;
use crate::node::{ListType, NodeRef, NodeType};
use crate::options::Options;
use crate::util::collapse_whitespace;

/// Output buffer and state of one CommonMark rendering pass, handed to
/// [`SyntaxExtension::render_commonmark`](crate::SyntaxExtension::render_commonmark).
pub struct CommonMarkContext<'a> {
    doc: &'a Document,
    options: Options,
    extensions: &'a [ExtensionRef],
    width: usize,
    out: String,
    prefix: String,
    prefix_marks: Vec<usize>,
    column: usize,
    need_cr: u8,
    begin_content: bool,
    item_start: bool,
    last_breakable: Option<usize>,
    previous: Option<char>,
    no_linebreaks: usize,
    escape_pipes: bool,
    tight: Vec<bool>,
    counters: Vec<(u64, char)>,
    skip: Option<u32>,
}

impl<'a> CommonMarkContext<'a> {
    fn new(doc: &'a Document, options: Options, extensions: &'a [ExtensionRef], width: usize) -> Self {
        Self {
            doc,
            options,
            extensions,
            width,
            out: String::with_capacity(4096),
            prefix: String::new(),
            prefix_marks: Vec::new(),
            column: 0,
            need_cr: 0,
            begin_content: true,
            item_start: false,
            last_breakable: None,
            previous: None,
            no_linebreaks: 0,
            escape_pipes: false,
            tight: Vec::new(),
            counters: Vec::new(),
            skip: None,
        }
    }

    #[must_use]
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    #[must_use]
    pub fn options(&self) -> Options {
        self.options
    }

    /// Target line width; 0 disables wrapping.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// End the current line before the next output.
    pub fn cr(&mut self) {
        if !self.item_start && !self.out.is_empty() {
            self.need_cr = self.need_cr.max(1);
        }
    }

    /// Leave a blank line before the next output (a single newline inside
    /// tight lists).
    pub fn blank_line(&mut self) {
        if !self.item_start && !self.out.is_empty() {
            self.need_cr = if self.tight.last() == Some(&true) { 1 } else { 2 };
        }
    }

    /// Prefix for every following line, e.g. `"> "`.
    pub fn push_prefix(&mut self, prefix: &str) {
        self.prefix_marks.push(self.prefix.len());
        self.prefix.push_str(prefix);
    }

    pub fn pop_prefix(&mut self) {
        if let Some(mark) = self.prefix_marks.pop() {
            self.prefix.truncate(mark);
        }
    }

    /// Inside table cells, `|` is escaped and line breaks become spaces.
    pub fn set_table_cell(&mut self, in_cell: bool) {
        self.escape_pipes = in_cell;
        if in_cell {
            self.no_linebreaks += 1;
        } else {
            self.no_linebreaks = self.no_linebreaks.saturating_sub(1);
        }
    }

    /// Append markdown syntax verbatim.
    pub fn push_raw(&mut self, text: &str) {
        self.flush();
        self.out.push_str(text);
        self.column += text.chars().count();
        if let Some(last) = text.chars().last() {
            self.begin_content = false;
            self.previous = Some(last);
        }
    }

    /// Append text, escaping characters that would read as syntax.
    pub fn push_text(&mut self, text: &str) {
        self.flush();
        let wrap = self.width > 0 && self.no_linebreaks == 0;
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            let next = chars.peek().copied();
            if self.needs_escape(c, next) {
                self.out.push('\\');
                self.column += 1;
            }
            if wrap && c == ' ' && !self.begin_content {
                self.last_breakable = Some(self.out.len());
            }
            self.out.push(c);
            self.column += 1;
            self.begin_content = self.begin_content && c.is_ascii_digit();
            self.previous = Some(c);
            if wrap && self.column > self.width {
                self.wrap();
            }
        }
    }

    /// Open a list item: marker (plus `suffix`, e.g. a task checkbox) on the
    /// first line, continuation indent for the rest.
    pub fn begin_list_item(&mut self, suffix: &str) {
        let (number, delimiter) = self.counters.last().copied().unwrap_or((0, '-'));
        let marker = if matches!(delimiter, '.' | ')') {
            if let Some(counter) = self.counters.last_mut() {
                counter.0 += 1;
            }
            format!("{number}{delimiter} ")
        } else {
            format!("{delimiter} ")
        };
        self.cr();
        self.push_raw(&marker);
        if !suffix.is_empty() {
            self.push_raw(suffix);
        }
        self.push_prefix(&" ".repeat(marker.len()));
        self.item_start = true;
        self.begin_content = true;
        self.previous = None;
    }

    pub fn end_list_item(&mut self) {
        self.item_start = false;
        self.pop_prefix();
        self.cr();
    }

    /// Render an event with the built-in rules, skipping extension hooks.
    #[allow(clippy::too_many_lines)]
    pub fn render_core(&mut self, node: NodeRef<'_>, event: EventType) {
        let entering = event == EventType::Enter;
        match node.node_type() {
            NodeType::None | NodeType::Document => {}
            NodeType::BlockQuote => {
                if entering {
                    self.cr();
                    self.push_raw("> ");
                    self.push_prefix("> ");
                    self.tight.push(false);
                    self.item_start = true;
                    self.begin_content = true;
                    self.previous = None;
                } else {
                    self.item_start = false;
                    self.tight.pop();
                    self.pop_prefix();
                    self.blank_line();
                }
            }
            NodeType::List => {
                if entering {
                    self.cr();
                    let info = node.list_info();
                    let ordered = info.is_some_and(|info| info.list_type == ListType::Ordered);
                    let alternate = preceding_lists(node) % 2 == 1;
                    let delimiter = match (ordered, alternate) {
                        (true, false) => '.',
                        (true, true) => ')',
                        (false, false) => '-',
                        (false, true) => '*',
                    };
                    self.counters
                        .push((info.map_or(1, |info| info.start), delimiter));
                    self.tight.push(info.is_some_and(|info| info.tight));
                } else {
                    self.counters.pop();
                    self.tight.pop();
                    self.blank_line();
                }
            }
            NodeType::Item => {
                if entering {
                    self.begin_list_item("");
                } else {
                    self.end_list_item();
                }
            }
            NodeType::Heading => {
                let level = node.heading_level().unwrap_or(1);
                let setext = level <= 2 && contains_line_break(node);
                if entering {
                    self.cr();
                    if !setext {
                        self.push_raw(&format!("{} ", "#".repeat(usize::from(level))));
                        self.no_linebreaks += 1;
                    }
                } else if setext {
                    self.cr();
                    self.push_raw(if level == 1 { "===" } else { "---" });
                    self.blank_line();
                } else {
                    self.no_linebreaks = self.no_linebreaks.saturating_sub(1);
                    self.blank_line();
                }
            }
            NodeType::CodeBlock => {
                if entering {
                    self.code_block(node);
                }
            }
            NodeType::HtmlBlock => {
                if entering {
                    self.cr();
                    let literal = node.literal().unwrap_or_default();
                    self.raw_lines(literal.strip_suffix('\n').unwrap_or(literal));
                    self.blank_line();
                }
            }
            NodeType::ThematicBreak => {
                if entering {
                    self.cr();
                    self.push_raw("***");
                    self.blank_line();
                }
            }
            NodeType::Paragraph => {
                if entering {
                    self.cr();
                } else {
                    self.blank_line();
                }
            }
            NodeType::FootnoteDefinition => {
                if entering {
                    self.cr();
                    let label = node.footnote_label().unwrap_or_default();
                    self.push_raw(&format!("[^{label}]: "));
                    self.push_prefix("    ");
                    self.tight.push(false);
                    self.item_start = true;
                } else {
                    self.item_start = false;
                    self.tight.pop();
                    self.pop_prefix();
                    self.blank_line();
                }
            }
            NodeType::Text => {
                if entering {
                    let literal = node.literal().unwrap_or_default();
                    if self.options.contains(Options::NORMALIZE) {
                        self.push_text(&collapse_whitespace(literal));
                    } else {
                        self.push_text(literal);
                    }
                }
            }
            NodeType::SoftBreak => {
                if entering {
                    if self.options.contains(Options::HARDBREAKS) && self.no_linebreaks == 0 {
                        self.push_raw("\\");
                        self.cr();
                    } else if self.no_linebreaks > 0
                        || self.width > 0
                        || self.options.contains(Options::NOBREAKS)
                    {
                        self.push_text(" ");
                    } else {
                        self.cr();
                    }
                }
            }
            NodeType::LineBreak => {
                if entering {
                    if self.no_linebreaks > 0 {
                        self.push_text(" ");
                    } else {
                        self.push_raw("\\");
                        self.cr();
                    }
                }
            }
            NodeType::Code => {
                if entering {
                    self.code_span(node.literal().unwrap_or_default());
                }
            }
            NodeType::HtmlInline => {
                if entering {
                    self.push_raw(node.literal().unwrap_or_default());
                }
            }
            NodeType::Emph | NodeType::Strong => {
                let count = if node.node_type() == NodeType::Strong { 2 } else { 1 };
                let run: String = std::iter::repeat_n(delimiter(node), count).collect();
                self.push_raw(&run);
            }
            NodeType::Link => {
                if entering {
                    if let Some(url) = autolink_form(node) {
                        self.push_raw(&format!("<{url}>"));
                        self.skip = Some(node.index);
                    } else {
                        self.push_raw("[");
                    }
                } else {
                    self.link_tail(node);
                }
            }
            NodeType::Image => {
                if entering {
                    self.push_raw("![");
                } else {
                    self.link_tail(node);
                }
            }
            NodeType::FootnoteReference => {
                if entering {
                    let label = node.footnote_label().unwrap_or_default();
                    self.push_raw(&format!("[^{label}]"));
                }
            }
            NodeType::Extension(_) => {
                if entering && node.code_info().is_some() {
                    self.code_block(node);
                }
            }
        }
    }

    fn code_block(&mut self, node: NodeRef<'_>) {
        let literal = node.literal().unwrap_or_default();
        let info = node.code_info().unwrap_or_default();
        let (fence_char, run) = if info.contains('`') {
            ('~', longest_run(literal, '~'))
        } else {
            ('`', longest_run(literal, '`'))
        };
        let fence: String = std::iter::repeat_n(fence_char, (run + 1).max(3)).collect();
        self.cr();
        self.push_raw(&fence);
        self.push_raw(info);
        let body = literal.strip_suffix('\n').unwrap_or(literal);
        if !literal.is_empty() {
            self.need_cr = 1;
            self.raw_lines(body);
        }
        self.need_cr = 1;
        self.push_raw(&fence);
        self.blank_line();
    }

    /// Verbatim lines, each under the current prefix.
    fn raw_lines(&mut self, text: &str) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.need_cr = 1;
            }
            self.flush();
            self.push_raw(line);
        }
    }

    fn code_span(&mut self, literal: &str) {
        let mut ticks = 1;
        while contains_exact_run(literal, '`', ticks) {
            ticks += 1;
        }
        let fence = "`".repeat(ticks);
        let pad = literal.starts_with('`')
            || literal.ends_with('`')
            || (literal.starts_with(' ') && literal.ends_with(' ') && !literal.trim().is_empty());
        let pad = if pad { " " } else { "" };
        self.push_raw(&format!("{fence}{pad}{literal}{pad}{fence}"));
    }

    fn link_tail(&mut self, node: NodeRef<'_>) {
        let url = node.url().unwrap_or_default();
        let title = node.title().unwrap_or_default();
        let mut tail = String::from("](");
        let bare = !url.is_empty()
            && !url
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>');
        if bare {
            for c in url.chars() {
                if matches!(c, '(' | ')' | '\\') {
                    tail.push('\\');
                }
                tail.push(c);
            }
        } else {
            tail.push('<');
            for c in url.chars() {
                if matches!(c, '<' | '>' | '\\') {
                    tail.push('\\');
                }
                tail.push(c);
            }
            tail.push('>');
        }
        if !title.is_empty() {
            tail.push_str(" \"");
            for c in title.chars() {
                if matches!(c, '"' | '\\') {
                    tail.push('\\');
                }
                tail.push(c);
            }
            tail.push('"');
        }
        tail.push(')');
        self.push_raw(&tail);
    }

    fn needs_escape(&self, c: char, next: Option<char>) -> bool {
        match c {
            '*' | '_' | '[' | ']' | '#' | '<' | '>' | '\\' | '`' | '~' => true,
            '|' => self.escape_pipes,
            '!' => next == Some('['),
            '&' => next.is_some_and(|n| n.is_ascii_alphabetic() || n == '#'),
            '-' | '+' | '=' => self.begin_content,
            '.' | ')' => {
                self.begin_content
                    && self.previous.is_some_and(|p| p.is_ascii_digit())
                    && next.is_none_or(|n| n == ' ' || n == '\t')
            }
            _ => false,
        }
    }

    /// Turn the last breakable space into a line break when the word after
    /// it cannot be mistaken for block syntax.
    fn wrap(&mut self) {
        let Some(position) = self.last_breakable else {
            return;
        };
        let remainder = self.out[position + 1..].to_owned();
        match remainder.chars().next() {
            None => return,
            Some(c) if !c.is_alphabetic() => {
                self.last_breakable = None;
                return;
            }
            Some(_) => {}
        }
        self.last_breakable = None;
        self.out.truncate(position);
        self.out.push('\n');
        self.out.push_str(&self.prefix);
        self.out.push_str(&remainder);
        self.column = self.prefix.chars().count() + remainder.chars().count();
    }

    /// Emit pending newlines and, at a line start, the prefix.
    fn flush(&mut self) {
        if self.out.is_empty() {
            self.need_cr = 0;
            if self.begin_content && self.column == 0 {
                self.out.push_str(&self.prefix);
                self.column = self.prefix.chars().count();
            }
        }
        if self.need_cr > 0 {
            self.out.push('\n');
            for _ in 1..self.need_cr {
                self.out.push_str(self.prefix.trim_end());
                self.out.push('\n');
            }
            self.out.push_str(&self.prefix);
            self.column = self.prefix.chars().count();
            self.need_cr = 0;
            self.begin_content = true;
            self.last_breakable = None;
            self.previous = None;
        }
        self.item_start = false;
    }

    fn render_event(&mut self, node: NodeRef<'_>, event: EventType) {
        let extensions = self.extensions;
        let handled = node
            .owner()
            .and_then(|owner| extensions.iter().find(|ext| ext.name() == owner))
            .is_some_and(|ext| ext.render_commonmark(node, event, self));
        if !handled {
            self.render_core(node, event);
        }
    }

    fn finish(mut self) -> String {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }
}

/// Count of directly preceding sibling lists of the same kind.
fn preceding_lists(node: NodeRef<'_>) -> usize {
    let list_type = node.list_info().map(|info| info.list_type);
    let mut count = 0;
    let mut cursor = node.previous_sibling();
    while let Some(sibling) = cursor {
        if sibling.list_info().map(|info| info.list_type) != list_type {
            break;
        }
        count += 1;
        cursor = sibling.previous_sibling();
    }
    count
}

/// Emphasis whose delimiters would touch its parent's delimiters.
fn hugs_parent_delimiter(node: NodeRef<'_>) -> bool {
    node.parent().is_some_and(is_emphasis) && (node.previous_sibling().is_none() || node.next_sibling().is_none())
}

fn is_emphasis(node: NodeRef<'_>) -> bool {
    matches!(node.node_type(), NodeType::Emph | NodeType::Strong)
}

/// Delimiter character of an emphasis node.
///
/// `*` unless the run would merge with a neighbouring `*` run: `*x*` inside
/// `*..*` reads as strong, `**` directly after `**` cannot close. `_` only
/// works when the run does not touch a word character.
fn delimiter(node: NodeRef<'_>) -> char {
    let nested =
        node.node_type() == NodeType::Emph && hugs_parent_delimiter(node) && node.parent().is_some_and(starred);
    let adjacent = node.previous_sibling().is_some_and(starred);
    if (nested || adjacent) && !touches_word(node) {
        '_'
    } else {
        '*'
    }
}

fn starred(node: NodeRef<'_>) -> bool {
    is_emphasis(node) && delimiter(node) == '*'
}

/// Whether the character right outside the delimiter run of `node`, on
/// either side, is alphanumeric. Runs of hugging ancestors count as one.
fn touches_word(node: NodeRef<'_>) -> bool {
    [false, true]
        .into_iter()
        .any(|forward| outer_char(node, forward).is_some_and(char::is_alphanumeric))
}

fn outer_char(node: NodeRef<'_>, forward: bool) -> Option<char> {
    let mut current = node;
    loop {
        let sibling = if forward {
            current.next_sibling()
        } else {
            current.previous_sibling()
        };
        if let Some(sibling) = sibling {
            if sibling.node_type() != NodeType::Text {
                return None;
            }
            let literal = sibling.literal()?;
            return if forward {
                literal.chars().next()
            } else {
                literal.chars().next_back()
            };
        }
        current = current.parent().filter(|parent| is_emphasis(*parent))?;
    }
}

/// Setext form is the only way to keep line breaks inside a heading.
fn contains_line_break(node: NodeRef<'_>) -> bool {
    node.children().any(|child| {
        matches!(child.node_type(), NodeType::SoftBreak | NodeType::LineBreak) || contains_line_break(child)
    })
}

/// The `<url>` form of a link, when the link can be written as one.
fn autolink_form(node: NodeRef<'_>) -> Option<&str> {
    let url = node.url()?;
    if !node.title().unwrap_or_default().is_empty() {
        return None;
    }
    let (scheme, _) = url.split_once(':')?;
    let valid_scheme = (2..=32).contains(&scheme.len())
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'));
    if !valid_scheme
        || url
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
    {
        return None;
    }
    let mut children = node.children();
    let text = match (children.next(), children.next()) {
        (Some(child), None) if child.node_type() == NodeType::Text => child.literal()?,
        _ => return None,
    };
    if text == url {
        Some(url)
    } else if url.strip_prefix("mailto:") == Some(text) && !text.contains(':') {
        Some(text)
    } else {
        None
    }
}

fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn contains_exact_run(text: &str, c: char, len: usize) -> bool {
    let mut current = 0;
    for ch in text.chars().chain(std::iter::once('\0')) {
        if ch == c {
            current += 1;
        } else {
            if current == len {
                return true;
            }
            current = 0;
        }
    }
    false
}

/// Render a document as CommonMark.
pub(crate) fn render(doc: &Document, options: Options, extensions: &[ExtensionRef], width: usize) -> String {
    let mut ctx = CommonMarkContext::new(doc, options, extensions, width);
    for (event, node) in doc.walk() {
        if let Some(index) = ctx.skip {
            if index == node.index && event == EventType::Exit {
                ctx.skip = None;
            }
            continue;
        }
        ctx.render_event(node, event);
    }
    ctx.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtensionRegistry, parse_document, parse_document_with};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn outline(doc: &Document) -> Vec<(EventType, &'static str, Option<String>)> {
        doc.walk()
            .map(|(event, node)| (event, node.type_string(), node.literal().map(str::to_owned)))
            .collect()
    }

    /// Render `source` and parse the result again; both trees must match.
    fn assert_round_trip(source: &str, options: Options) {
        let doc = parse_document(source.as_bytes(), options);
        let rendered = doc.to_commonmark(0);
        let reparsed = parse_document(rendered.as_bytes(), options);
        assert_eq!(outline(&doc), outline(&reparsed), "source: {source:?}\nrendered: {rendered:?}");
    }

    fn markdown() -> impl Strategy<Value = String> {
        let prefix = prop::sample::select(vec!["- ", "> ", "1. ", "# "]);
        let inline = prop::sample::select(vec![
            "a", "b c", "*e*", "**s**", "`k`", "[l](/u)", "x***y***z", "*_w_*", "**_v_ t**", "1.", "#", "-", ">",
            "\\*",
        ]);
        let line = (prop::collection::vec(prefix, 0..3), prop::collection::vec(inline, 0..4))
            .prop_map(|(prefix, inline)| format!("{}{}", prefix.concat(), inline.join(" ")));
        prop::collection::vec((line, any::<bool>()), 1..6).prop_map(|lines| {
            lines
                .into_iter()
                .map(|(line, blank)| format!("{line}{}", if blank { "\n\n" } else { "\n" }))
                .collect()
        })
    }

    fn commonmark(source: &str) -> String {
        parse_document(source.as_bytes(), Options::DEFAULT).to_commonmark(0)
    }

    fn gfm(source: &str) -> String {
        let registry = ExtensionRegistry::global();
        let extensions: Vec<_> = ["table", "strikethrough", "tasklist", "autolink", "tagfilter"]
            .iter()
            .filter_map(|name| registry.find(name))
            .collect();
        parse_document_with(source.as_bytes(), Options::DEFAULT, &extensions)
            .unwrap()
            .to_commonmark(0)
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(commonmark(""), "");
    }

    #[test]
    fn test_heading_and_paragraph() {
        assert_eq!(
            commonmark("Title\n=====\n\nSome *text* and **more**.\n"),
            "# Title\n\nSome *text* and **more**.\n"
        );
    }

    #[test]
    fn test_tight_list() {
        assert_eq!(commonmark("* a\n* b\n"), "- a\n- b\n");
    }

    #[test]
    fn test_loose_list() {
        assert_eq!(commonmark("- a\n\n- b\n"), "- a\n\n- b\n");
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(commonmark("- a\n  - b\n- c\n"), "- a\n  - b\n- c\n");
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(commonmark("3) x\n4) y\n"), "3. x\n4. y\n");
    }

    #[test]
    fn test_adjacent_lists_alternate_markers() {
        assert_eq!(commonmark("- a\n\n* b\n"), "- a\n\n* b\n");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            commonmark("> a\n>\n> b\n"),
            "> a\n>\n> b\n"
        );
    }

    #[test]
    fn test_block_quote_on_marker_line() {
        assert_eq!(commonmark("- > a\n"), "- > a\n");
        assert_eq!(commonmark("1. > a\n"), "1. > a\n");
        assert_eq!(commonmark("> - > a\n"), "> - > a\n");
        assert_eq!(commonmark("- > a\n- b\n"), "- > a\n- b\n");
        let doc = parse_document(b"[^x]: > q\n\nr[^x]\n", Options::FOOTNOTES);
        assert_eq!(doc.to_commonmark(0), "[^x]: > q\n\nr[^x]\n");
    }

    #[test]
    fn test_separate_block_quotes() {
        assert_eq!(commonmark("> a\n\n> b\n"), "> a\n\n> b\n");
        assert_eq!(commonmark(">\n\na\n"), "> \n\na\n");
    }

    #[test]
    fn test_heading_with_line_break_uses_setext() {
        assert_eq!(commonmark("a\nb\n===\n"), "a\nb\n===\n");
        assert_eq!(commonmark("> a\n> b\n> -\n"), "> a\n> b\n> ---\n");
        assert_eq!(commonmark("a\n-\n"), "## a\n");
    }

    #[test]
    fn test_code_block() {
        assert_eq!(
            commonmark("    indented\n"),
            "```\nindented\n```\n"
        );
        assert_eq!(
            commonmark("```rust\nlet a = \"```\";\n```\n"),
            "````rust\nlet a = \"```\";\n````\n"
        );
    }

    #[test]
    fn test_code_block_in_list() {
        assert_eq!(
            commonmark("- ```\n  x\n  ```\n"),
            "- ```\n  x\n  ```\n"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            commonmark("\\*not emphasis\\* and 1\\. \\[x\\]\n"),
            "\\*not emphasis\\* and 1. \\[x\\]\n"
        );
        assert_eq!(commonmark("1986\\. A year\n"), "1986\\. A year\n");
        assert_eq!(commonmark("\\- not a list\n"), "\\- not a list\n");
    }

    #[test]
    fn test_code_span() {
        assert_eq!(commonmark("`` a`b ``\n"), "``a`b``\n");
        assert_eq!(commonmark("`` `a ``\n"), "`` `a ``\n");
    }

    #[test]
    fn test_links() {
        assert_eq!(
            commonmark("[a](/url \"title\") and <https://x.org>\n"),
            "[a](/url \"title\") and <https://x.org>\n"
        );
        assert_eq!(commonmark("[a](<b c>)\n"), "[a](<b c>)\n");
    }

    #[test]
    fn test_image() {
        assert_eq!(commonmark("![alt *x*](/i.png)\n"), "![alt *x*](/i.png)\n");
    }

    #[test]
    fn test_breaks() {
        assert_eq!(commonmark("a\nb\n"), "a\nb\n");
        assert_eq!(commonmark("a  \nb\n"), "a\\\nb\n");
    }

    #[test]
    fn test_thematic_break() {
        assert_eq!(commonmark("a\n\n---\n\nb\n"), "a\n\n***\n\nb\n");
    }

    #[test]
    fn test_nested_emphasis() {
        assert_eq!(commonmark("***a***\n"), "***a***\n");
        assert_eq!(commonmark("*_a_*\n"), "*_a_*\n");
        assert_eq!(commonmark("**_a_ b**\n"), "**_a_ b**\n");
        assert_eq!(commonmark("*a *_b_* c*\n"), "*a *_b_* c*\n");
    }

    #[test]
    fn test_emphasis_inside_word_keeps_stars() {
        assert_eq!(commonmark("x***a***y\n"), "x***a***y\n");
        assert_round_trip("x***a***y\n", Options::DEFAULT);
        assert_round_trip("x**a*b*c**y\n", Options::DEFAULT);
    }

    #[test]
    fn test_wrapping() {
        let doc = parse_document(b"one two three four five six\n", Options::DEFAULT);
        assert_eq!(doc.to_commonmark(10), "one two\nthree four\nfive six\n");
    }

    #[test]
    fn test_tasklist() {
        assert_eq!(
            gfm("- [ ] I am\n- [x] a tasklist\n"),
            "- [ ] I am\n- [x] a tasklist\n"
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            gfm("a | b\n:-|-:\n1 | 2\n"),
            "| a | b |\n| :-- | --: |\n| 1 | 2 |\n"
        );
    }

    #[test]
    fn test_strikethrough() {
        assert_eq!(gfm("~~x~~\n"), "~~x~~\n");
    }

    #[test]
    fn test_round_trip_is_stable() {
        let corpus = [
            "# Title\n\nPara with *emph*, **strong**, `code` and [link](/u).\n",
            "- a\n- b\n  - c\n\n1. one\n2. two\n",
            "> quote\n> more\n\n```\ncode\n```\n",
            "Text with \\* and \\_ and <not html> & more\n",
            "Line one  \nline two\n",
            "- > a\n",
            "1. > a\n",
            "> - > a\n",
            "x***a***y\n",
            "a\nb\n---\n",
        ];
        for source in corpus {
            let first = commonmark(source);
            let second = commonmark(&first);
            assert_eq!(first, second, "source: {source:?}");
            assert_round_trip(source, Options::DEFAULT);
        }
        assert_round_trip("[^x]: > q\n\nr[^x]\n", Options::FOOTNOTES);
    }

    #[test]
    fn test_helpers() {
        assert_eq!(longest_run("a```b``", '`'), 3);
        assert!(contains_exact_run("a`b", '`', 1));
        assert!(!contains_exact_run("a``b", '`', 1));
    }

    proptest! {
        #[test]
        fn prop_render_then_parse_keeps_tree(source in markdown()) {
            let doc = parse_document(source.as_bytes(), Options::DEFAULT);
            let rendered = doc.to_commonmark(0);
            let reparsed = parse_document(rendered.as_bytes(), Options::DEFAULT);
            prop_assert_eq!(outline(&doc), outline(&reparsed), "rendered: {:?}", rendered);
        }
    }
}
