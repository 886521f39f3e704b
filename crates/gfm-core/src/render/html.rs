//! HTML rendering.
//!
//! Output follows the CommonMark reference renderer: block elements start
//! on their own line, tight list items omit their `<p>` wrappers, and raw
//! HTML is replaced by a comment unless `UNSAFE` is set.

use std::borrow::Cow;
use std::fmt::Write;

use crate::document::Document;
use crate::extension::ExtensionRef;
use crate::iter::EventType;
use crate::node::{ListType, NodeRef, NodeType};
use crate::options::Options;
use crate::render::escape::{escape_href, is_safe_url, push_escaped_html};
use crate::util::collapse_whitespace;

const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

/// Output buffer and state of one HTML rendering pass, handed to
/// [`SyntaxExtension::render_html`](crate::SyntaxExtension::render_html).
pub struct HtmlContext<'a> {
    doc: &'a Document,
    options: Options,
    extensions: &'a [ExtensionRef],
    out: String,
    footnotes: Vec<String>,
    backref: Option<(u32, usize)>,
    alt_depth: usize,
}

impl<'a> HtmlContext<'a> {
    fn new(doc: &'a Document, options: Options, extensions: &'a [ExtensionRef]) -> Self {
        Self {
            doc,
            options,
            extensions,
            out: String::with_capacity(4096),
            footnotes: Vec::new(),
            backref: None,
            alt_depth: 0,
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

    /// Append raw HTML.
    pub fn push_str(&mut self, html: &str) {
        self.out.push_str(html);
    }

    /// Append text, HTML-escaped.
    pub fn push_escaped(&mut self, text: &str) {
        push_escaped_html(&mut self.out, text);
    }

    /// Start a new line unless already at the start of one.
    pub fn cr(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    /// Append ` data-sourcepos="..."` when `SOURCEPOS` is set.
    pub fn sourcepos(&mut self, node: NodeRef<'_>) {
        if self.options.contains(Options::SOURCEPOS) {
            let _ = write!(self.out, r#" data-sourcepos="{}""#, node.span());
        }
    }

    /// Raw HTML as allowed by the options and attached tag filters.
    pub fn push_raw_html(&mut self, html: &str) {
        if self.options.contains(Options::UNSAFE) {
            let filtered = filter_tags(html, self.extensions);
            self.out.push_str(&filtered);
        } else {
            self.out.push_str(RAW_HTML_OMITTED);
        }
    }

    /// Render an event with the built-in rules, skipping extension hooks.
    pub fn render_core(&mut self, node: NodeRef<'_>, event: EventType) {
        let entering = event == EventType::Enter;
        match node.node_type() {
            NodeType::None | NodeType::Document => {}
            NodeType::BlockQuote => {
                self.cr();
                if entering {
                    self.out.push_str("<blockquote");
                    self.sourcepos(node);
                    self.out.push_str(">\n");
                } else {
                    self.out.push_str("</blockquote>\n");
                }
            }
            NodeType::List => self.list(node, entering),
            NodeType::Item => {
                if entering {
                    self.cr();
                    self.out.push_str("<li");
                    self.sourcepos(node);
                    self.out.push('>');
                } else {
                    self.out.push_str("</li>\n");
                }
            }
            NodeType::Heading => {
                let level = node.heading_level().unwrap_or(1);
                if entering {
                    self.cr();
                    let _ = write!(self.out, "<h{level}");
                    self.sourcepos(node);
                    self.out.push('>');
                } else {
                    let _ = writeln!(self.out, "</h{level}>");
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
                    self.push_raw_html(node.literal().unwrap_or_default());
                    self.cr();
                }
            }
            NodeType::ThematicBreak => {
                if entering {
                    self.cr();
                    self.out.push_str("<hr");
                    self.sourcepos(node);
                    self.out.push_str(" />\n");
                }
            }
            NodeType::Paragraph => self.paragraph(node, entering),
            NodeType::FootnoteDefinition => self.footnote_definition(node, entering),
            NodeType::Text => {
                if entering {
                    let literal = node.literal().unwrap_or_default();
                    if self.options.contains(Options::NORMALIZE) {
                        push_escaped_html(&mut self.out, &collapse_whitespace(literal));
                    } else {
                        push_escaped_html(&mut self.out, literal);
                    }
                }
            }
            NodeType::SoftBreak => {
                if entering {
                    if self.options.contains(Options::HARDBREAKS) {
                        self.out.push_str("<br />\n");
                    } else if self.options.contains(Options::NOBREAKS) {
                        self.out.push(' ');
                    } else {
                        self.out.push('\n');
                    }
                }
            }
            NodeType::LineBreak => {
                if entering {
                    self.out.push_str("<br />\n");
                }
            }
            NodeType::Code => {
                if entering {
                    self.out.push_str("<code>");
                    self.push_escaped(node.literal().unwrap_or_default());
                    self.out.push_str("</code>");
                }
            }
            NodeType::HtmlInline => {
                if entering {
                    self.push_raw_html(node.literal().unwrap_or_default());
                }
            }
            NodeType::Emph => self.out.push_str(if entering { "<em>" } else { "</em>" }),
            NodeType::Strong => self
                .out
                .push_str(if entering { "<strong>" } else { "</strong>" }),
            NodeType::Link => {
                if entering {
                    self.out.push_str("<a href=\"");
                    self.push_url(node.url().unwrap_or_default());
                    self.out.push('"');
                    self.push_title(node.title().unwrap_or_default());
                    self.out.push('>');
                } else {
                    self.out.push_str("</a>");
                }
            }
            NodeType::Image => {
                if entering {
                    self.out.push_str("<img src=\"");
                    self.push_url(node.url().unwrap_or_default());
                    self.out.push_str("\" alt=\"");
                    self.alt_depth += 1;
                }
            }
            NodeType::FootnoteReference => {
                if entering {
                    let label = node.footnote_label().unwrap_or_default();
                    let number = self.footnote_number(label);
                    let anchor = escape_href(label);
                    let _ = write!(
                        self.out,
                        r##"<sup class="footnote-ref"><a href="#fn-{anchor}" id="fnref-{anchor}" data-footnote-ref>{number}</a></sup>"##
                    );
                }
            }
            NodeType::Extension(_) => {
                // Without its extension, a claimed fence still reads as code.
                if entering && node.code_info().is_some() {
                    self.code_block(node);
                }
            }
        }
    }

    fn list(&mut self, node: NodeRef<'_>, entering: bool) {
        let info = node.list_info();
        let ordered = info.is_some_and(|info| info.list_type == ListType::Ordered);
        self.cr();
        if !entering {
            self.out.push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
            return;
        }
        if ordered {
            self.out.push_str("<ol");
            self.sourcepos(node);
            match info.map_or(1, |info| info.start) {
                1 => {}
                start => {
                    let _ = write!(self.out, r#" start="{start}""#);
                }
            }
            self.out.push_str(">\n");
        } else {
            self.out.push_str("<ul");
            self.sourcepos(node);
            self.out.push_str(">\n");
        }
    }

    fn paragraph(&mut self, node: NodeRef<'_>, entering: bool) {
        let tight = node
            .parent()
            .filter(|parent| parent.node_type() == NodeType::Item)
            .and_then(|item| item.parent())
            .and_then(|list| list.list_info())
            .is_some_and(|info| info.tight);
        if entering {
            if !tight {
                self.cr();
                self.out.push_str("<p");
                self.sourcepos(node);
                self.out.push('>');
            }
            return;
        }
        if let Some((target, number)) = self.backref {
            if target == node.index {
                self.backref = None;
                self.push_backref(node, number);
            }
        }
        if !tight {
            self.out.push_str("</p>\n");
        }
    }

    fn code_block(&mut self, node: NodeRef<'_>) {
        let info = node.code_info().unwrap_or_default().trim();
        let (lang, meta) = match info.split_once(char::is_whitespace) {
            Some((lang, meta)) => (lang, meta.trim()),
            None => (info, ""),
        };
        let meta = if self.options.contains(Options::FULL_INFO_STRING) {
            meta
        } else {
            ""
        };
        self.cr();
        self.out.push_str("<pre");
        self.sourcepos(node);
        if lang.is_empty() {
            self.out.push_str("><code>");
        } else if self.options.contains(Options::GITHUB_PRE_LANG) {
            self.out.push_str(" lang=\"");
            self.push_escaped(lang);
            self.out.push('"');
            self.push_meta(meta);
            self.out.push_str("><code>");
        } else {
            self.out.push_str("><code class=\"language-");
            self.push_escaped(lang);
            self.out.push('"');
            self.push_meta(meta);
            self.out.push('>');
        }
        self.push_escaped(node.literal().unwrap_or_default());
        self.out.push_str("</code></pre>\n");
    }

    fn push_meta(&mut self, meta: &str) {
        if !meta.is_empty() {
            self.out.push_str(" data-meta=\"");
            self.push_escaped(meta);
            self.out.push('"');
        }
    }

    fn push_url(&mut self, url: &str) {
        if self.options.contains(Options::UNSAFE) || is_safe_url(url) {
            self.out.push_str(&escape_href(url));
        }
    }

    fn push_title(&mut self, title: &str) {
        if !title.is_empty() {
            self.out.push_str(" title=\"");
            self.push_escaped(title);
            self.out.push('"');
        }
    }

    fn footnote_number(&mut self, label: &str) -> usize {
        if let Some(position) = self.footnotes.iter().position(|known| known == label) {
            return position + 1;
        }
        self.footnotes.push(label.to_owned());
        self.footnotes.len()
    }

    fn footnote_definition(&mut self, node: NodeRef<'_>, entering: bool) {
        let label = node.footnote_label().unwrap_or_default();
        if entering {
            self.cr();
            let _ = writeln!(self.out, r#"<li id="fn-{}">"#, escape_href(label));
            return;
        }
        if let Some((_, number)) = self.backref.take() {
            self.push_backref(node, number);
            self.out.push('\n');
        }
        self.out.push_str("</li>\n");
    }

    fn push_backref(&mut self, node: NodeRef<'_>, number: usize) {
        let label = node
            .footnote_label()
            .or_else(|| node.parent().and_then(|parent| parent.footnote_label()))
            .unwrap_or_default();
        let _ = write!(
            self.out,
            r##" <a href="#fnref-{}" class="footnote-backref" data-footnote-backref data-footnote-backref-idx="{number}" aria-label="Back to reference {number}">↩</a>"##,
            escape_href(label)
        );
    }

    /// Inside an image, only the textual content goes into `alt`.
    fn render_alt(&mut self, node: NodeRef<'_>, event: EventType) {
        match (node.node_type(), event) {
            (NodeType::Image, EventType::Enter) => self.alt_depth += 1,
            (NodeType::Image, EventType::Exit) => {
                self.alt_depth -= 1;
                if self.alt_depth == 0 {
                    self.out.push('"');
                    self.push_title(node.title().unwrap_or_default());
                    self.out.push_str(" />");
                }
            }
            (NodeType::SoftBreak | NodeType::LineBreak, EventType::Enter) => self.out.push(' '),
            (_, EventType::Enter) => {
                if let Some(literal) = node.literal() {
                    self.push_escaped(literal);
                }
            }
            _ => {}
        }
    }

    fn render_event(&mut self, node: NodeRef<'_>, event: EventType) {
        if self.alt_depth > 0 {
            self.render_alt(node, event);
            return;
        }
        let extensions = self.extensions;
        let handled = node
            .owner()
            .and_then(|owner| extensions.iter().find(|ext| ext.name() == owner))
            .is_some_and(|ext| ext.render_html(node, event, self));
        if !handled {
            self.render_core(node, event);
        }
    }

    /// Render a subtree. Footnote definitions below `root` are held back
    /// for the footnote section.
    fn render_subtree(&mut self, root: NodeRef<'_>) {
        let mut skipping: Option<u32> = None;
        for (event, node) in root.walk() {
            if let Some(index) = skipping {
                if index == node.index && event == EventType::Exit {
                    skipping = None;
                }
                continue;
            }
            if node.node_type() == NodeType::FootnoteDefinition && node.index != root.index {
                skipping = Some(node.index);
                continue;
            }
            self.render_event(node, event);
        }
    }

    fn render_footnotes(&mut self) {
        if self.footnotes.is_empty() {
            return;
        }
        let definitions: Vec<NodeRef<'a>> = self
            .doc
            .walk()
            .filter(|(event, node)| {
                *event == EventType::Enter && node.node_type() == NodeType::FootnoteDefinition
            })
            .map(|(_, node)| node)
            .collect();
        let mut opened = false;
        let mut position = 0;
        while position < self.footnotes.len() {
            let label = self.footnotes[position].clone();
            position += 1;
            let Some(definition) = definitions
                .iter()
                .find(|node| node.footnote_label() == Some(label.as_str()))
            else {
                continue;
            };
            if !opened {
                self.cr();
                self.out
                    .push_str("<section class=\"footnotes\" data-footnotes>\n<ol>\n");
                opened = true;
            }
            let target = definition
                .last_child()
                .filter(|child| child.node_type() == NodeType::Paragraph)
                .map_or(definition.index, |child| child.index);
            self.backref = Some((target, position));
            self.render_subtree(*definition);
        }
        if opened {
            self.out.push_str("</ol>\n</section>\n");
        }
    }
}

/// Neutralize `<` of raw HTML tags that an attached extension rejects.
fn filter_tags<'h>(html: &'h str, extensions: &[ExtensionRef]) -> Cow<'h, str> {
    let mut out: Option<String> = None;
    let mut copied = 0;
    for (position, _) in html.match_indices('<') {
        let rest = &html[position + 1..];
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let name_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-')
            .count();
        if name_len == 0 || !rest.as_bytes()[0].is_ascii_alphabetic() {
            continue;
        }
        let terminated = rest[name_len..]
            .chars()
            .next()
            .is_none_or(|c| c.is_ascii_whitespace() || c == '>' || c == '/');
        if !terminated {
            continue;
        }
        let name = rest[..name_len].to_ascii_lowercase();
        if extensions.iter().all(|ext| ext.allows_html_tag(&name)) {
            continue;
        }
        let buffer = out.get_or_insert_with(|| String::with_capacity(html.len() + 8));
        buffer.push_str(&html[copied..position]);
        buffer.push_str("&lt;");
        copied = position + 1;
    }
    match out {
        Some(mut buffer) => {
            buffer.push_str(&html[copied..]);
            Cow::Owned(buffer)
        }
        None => Cow::Borrowed(html),
    }
}

/// Render a document, consulting `extensions` for the nodes they own.
pub(crate) fn render(doc: &Document, options: Options, extensions: &[ExtensionRef]) -> String {
    let mut ctx = HtmlContext::new(doc, options, extensions);
    ctx.render_subtree(doc.root());
    ctx.render_footnotes();
    ctx.out
}
