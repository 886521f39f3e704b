//! Owned CommonMark/GFM document trees with pluggable syntax extensions.
//!
//! Markdown is parsed by `pulldown-cmark` into a [`Document`]: an arena of
//! nodes addressed by [`NodeHandle`]s and read through borrowed
//! [`NodeRef`]s. Documents can be walked with ENTER/EXIT events, annotated
//! by extensions, and rendered back to HTML or CommonMark.
//!
//! # Architecture
//!
//! ```text
//! bytes ──feed──▶ Parser ──finish──▶ Document ──▶ render_html / render_commonmark
//!                   │                   ▲
//!                   └── extensions ─────┘ (fence claims, post-processing, render hooks)
//! ```
//!
//! - [`Parser`] buffers fed chunks and builds the tree on [`Parser::finish`].
//! - [`SyntaxExtension`]s are attached by value or by name from an
//!   [`ExtensionRegistry`]. The core GFM extensions are `table`,
//!   `strikethrough`, `tasklist`, `autolink` and `tagfilter`.
//! - [`TreeIterator`] yields [`EventType::Enter`]/[`EventType::Exit`] pairs
//!   for every node and holds only handles, so attributes can be changed
//!   between steps.
//!
//! # Example
//!
//! ```
//! use gfm_core::{Options, parse_gfm};
//!
//! let doc = parse_gfm("- [x] write docs\n", Options::DEFAULT).unwrap();
//! assert_eq!(doc.tasks()[0].identifier(), "1:1-1:16");
//! assert_eq!(
//!     doc.to_html(),
//!     "<ul>\n<li data-gfm-task=\"1:1-1:16\"><input type=\"checkbox\" checked=\"\" disabled=\"\" /> write docs</li>\n</ul>\n"
//! );
//! ```

mod attributes;
mod document;
mod editor;
mod engine;
mod error;
pub mod extension;
mod iter;
mod node;
mod options;
mod parser;
mod render;
mod tasks;
mod util;

pub use attributes::AttrValue;
pub use document::Document;
pub use editor::DocumentEditor;
pub use error::{Error, Result};
pub use extension::{
    EngineFeature, ExtensionRef, ExtensionRegistry, SyntaxExtension, ensure_core_extensions_registered,
    find_syntax_extension,
};
pub use iter::{EventType, TreeIterator, Walk};
pub use node::{ExtensionNodeType, ListInfo, ListType, NodeHandle, NodeRef, NodeType, SourceSpan};
pub use options::Options;
pub use parser::{Parser, Precedence, parse_document, parse_document_with};
pub use render::{
    CommonMarkContext, HtmlContext, escape_href, escape_html, is_safe_url, render_commonmark, render_html,
};
pub use tasks::{
    GFM_EXTENSIONS, TaskNode, Toggle, gfm_to_html, gfm_toggle_task_by_id, markdown_to_html, parse_gfm,
    parse_markdown,
};
