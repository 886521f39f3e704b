//! Streaming parser front end.
//!
//! The engine parses whole documents, so `feed` only buffers bytes; the
//! tree is built in `finish`. Chunk boundaries therefore never affect the
//! result, including boundaries inside a multi-byte character.

use std::fmt;
use std::time::Instant;

use crate::document::Document;
use crate::editor::DocumentEditor;
use crate::engine;
use crate::error::{Error, Result};
use crate::extension::{ExtensionRef, ExtensionRegistry};
use crate::node::{ExtensionNodeType, NodeType};
use crate::options::Options;
use crate::util::{LineIndex, decode_input};

/// Which extension claims a fenced block several extensions want.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Precedence {
    /// The earliest attached extension wins.
    #[default]
    FirstAttached,
    /// The latest attached extension wins.
    LastAttached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    Feeding,
    Finished,
}

/// Incremental markdown parser.
///
/// Lifecycle: attach extensions, feed any number of chunks, then `finish`
/// exactly once to take the [`Document`].
///
/// ```
/// use gfm_core::{ExtensionRegistry, Options, Parser};
///
/// let mut parser = Parser::new(Options::DEFAULT);
/// parser
///     .attach_extension_by_name(ExtensionRegistry::global(), "tasklist")
///     .unwrap();
/// parser.feed(b"- [x] done\n").unwrap();
/// let doc = parser.finish().unwrap();
/// assert_eq!(doc.to_html(), "<ul>\n<li data-gfm-task=\"1:1-1:10\"><input type=\"checkbox\" checked=\"\" disabled=\"\" /> done</li>\n</ul>\n");
/// ```
pub struct Parser {
    options: Options,
    precedence: Precedence,
    extensions: Vec<ExtensionRef>,
    buffer: Vec<u8>,
    state: State,
}

impl Parser {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            precedence: Precedence::default(),
            extensions: Vec::new(),
            buffer: Vec::new(),
            state: State::Ready,
        }
    }

    #[must_use]
    pub fn options(&self) -> Options {
        self.options
    }

    /// Attached extensions in attach order.
    #[must_use]
    pub fn extensions(&self) -> &[ExtensionRef] {
        &self.extensions
    }

    #[must_use]
    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn set_precedence(&mut self, precedence: Precedence) {
        self.precedence = precedence;
    }

    /// Attach an extension. Attaching one that is already attached (by
    /// name) does nothing.
    ///
    /// # Errors
    ///
    /// [`Error::ParserFinished`] after `finish`,
    /// [`Error::AttachAfterFeed`] once input has been fed.
    pub fn attach_extension(&mut self, extension: ExtensionRef) -> Result<()> {
        match self.state {
            State::Finished => return Err(Error::ParserFinished),
            State::Feeding => return Err(Error::AttachAfterFeed(extension.name().to_owned())),
            State::Ready => {}
        }
        let name = extension.name();
        if self.extensions.iter().any(|ext| ext.name() == name) {
            tracing::trace!(extension = name, "Extension already attached");
            return Ok(());
        }
        tracing::trace!(extension = name, "Attached extension");
        self.extensions.push(extension);
        Ok(())
    }

    /// Look up `name` in `registry` and attach it.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownExtension`] when the registry has no such extension,
    /// otherwise as [`Parser::attach_extension`].
    pub fn attach_extension_by_name(&mut self, registry: &ExtensionRegistry, name: &str) -> Result<()> {
        let extension = registry
            .find(name)
            .ok_or_else(|| Error::UnknownExtension(name.to_owned()))?;
        self.attach_extension(extension)
    }

    /// Append a chunk of input. Empty chunks are allowed.
    ///
    /// # Errors
    ///
    /// [`Error::ParserFinished`] after `finish`.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        if self.state == State::Finished {
            return Err(Error::ParserFinished);
        }
        self.state = State::Feeding;
        self.buffer.extend_from_slice(chunk);
        tracing::trace!(chunk = chunk.len(), total = self.buffer.len(), "Fed input");
        Ok(())
    }

    /// Build the document from everything fed so far.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyFinished`] on a second call; errors raised by an
    /// extension's post-processing.
    pub fn finish(&mut self) -> Result<Document> {
        if self.state == State::Finished {
            return Err(Error::AlreadyFinished);
        }
        self.state = State::Finished;
        let start = Instant::now();
        let bytes = std::mem::take(&mut self.buffer);
        let source = decode_input(&bytes);
        let flags = engine::engine_options(self.options, &self.extensions);
        let (nodes, root) = engine::build(&source, flags);
        let mut doc = Document::new(nodes, root, self.options, self.extensions.clone());

        let lines = LineIndex::new(&source);
        self.claim_fences(&mut doc);
        {
            let mut editor = DocumentEditor::new(&mut doc, &lines);
            for extension in &self.extensions {
                extension.postprocess(&mut editor)?;
            }
        }
        if self.options.contains(Options::SOURCEPOS) {
            for node in &mut doc.nodes {
                node.span = lines.span(&node.range);
            }
        }
        tracing::debug!(
            bytes = bytes.len(),
            nodes = doc.len(),
            extensions = self.extensions.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Parsed document"
        );
        Ok(doc)
    }

    /// Hand fenced code blocks to the extension that claims their info
    /// string.
    fn claim_fences(&self, doc: &mut Document) {
        if self.extensions.is_empty() {
            return;
        }
        let ordered: Vec<&ExtensionRef> = match self.precedence {
            Precedence::FirstAttached => self.extensions.iter().collect(),
            Precedence::LastAttached => self.extensions.iter().rev().collect(),
        };
        for node in &mut doc.nodes {
            if node.node_type != NodeType::CodeBlock {
                continue;
            }
            let crate::node::NodeValue::CodeBlock { info, fenced: true } = &node.value else {
                continue;
            };
            let claim = ordered
                .iter()
                .find_map(|ext| ext.claim_fence(info).map(|name| (ext.name(), name)));
            if let Some((extension, name)) = claim {
                tracing::trace!(extension, node_type = name, "Fenced block claimed");
                node.node_type = NodeType::Extension(ExtensionNodeType { extension, name });
                node.owner = Some(extension);
            }
        }
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("options", &self.options)
            .field("precedence", &self.precedence)
            .field(
                "extensions",
                &self.extensions.iter().map(|ext| ext.name()).collect::<Vec<_>>(),
            )
            .field("buffered", &self.buffer.len())
            .field("state", &self.state)
            .finish()
    }
}

/// Parse a complete input in one call.
#[must_use]
pub fn parse_document(input: &[u8], options: Options) -> Document {
    parse_document_with(input, options, &[]).unwrap_or_else(|_| {
        // Without extensions no step of `finish` can fail.
        Document::new(
            vec![crate::node::NodeData::new(NodeType::Document, 0..0)],
            0,
            options,
            Vec::new(),
        )
    })
}

/// Parse a complete input with the given extensions attached in order.
///
/// # Errors
///
/// Errors raised by an extension's post-processing.
pub fn parse_document_with(input: &[u8], options: Options, extensions: &[ExtensionRef]) -> Result<Document> {
    let mut parser = Parser::new(options);
    for extension in extensions {
        parser.attach_extension(std::sync::Arc::clone(extension))?;
    }
    parser.feed(input)?;
    parser.finish()
}
