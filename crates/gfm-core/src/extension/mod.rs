//! Pluggable syntax extensions.
//!
//! # Architecture
//!
//! An extension is a [`SyntaxExtension`] trait object shared behind an
//! [`ExtensionRef`]. Extensions take part in three phases:
//!
//! 1. **Parsing**: [`engine_features`](SyntaxExtension::engine_features)
//!    switches on engine syntax, and
//!    [`claim_fence`](SyntaxExtension::claim_fence) lets an extension take
//!    over fenced code blocks by info string.
//! 2. **Post-processing**: [`postprocess`](SyntaxExtension::postprocess)
//!    rewrites the finished tree through a [`DocumentEditor`], in attach
//!    order.
//! 3. **Rendering**: [`render_html`](SyntaxExtension::render_html) and
//!    [`render_commonmark`](SyntaxExtension::render_commonmark) handle nodes
//!    the extension owns. The owner's hook runs first; when it returns
//!    `false` the core renderer handles the node.
//!
//! Extensions are found by name in an [`ExtensionRegistry`]. The
//! process-wide registry from [`ExtensionRegistry::global`] holds the core
//! GFM extensions and is initialized on first use.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gfm_core::{ExtensionRegistry, Options, Parser, SyntaxExtension};
//!
//! struct Mermaid;
//!
//! impl SyntaxExtension for Mermaid {
//!     fn name(&self) -> &'static str { "mermaid" }
//!
//!     fn claim_fence(&self, info: &str) -> Option<&'static str> {
//!         (info.split_whitespace().next() == Some("mermaid")).then_some("mermaid_block")
//!     }
//! }
//!
//! let mut registry = ExtensionRegistry::with_core_extensions();
//! registry.register(Mermaid).unwrap();
//!
//! let mut parser = Parser::new(Options::DEFAULT);
//! parser.attach_extension_by_name(&registry, "mermaid").unwrap();
//! parser.feed(b"```mermaid\ngraph TD\n```\n").unwrap();
//! let doc = parser.finish().unwrap();
//! assert_eq!(doc.root().first_child().unwrap().type_string(), "mermaid_block");
//! ```

pub mod autolink;
pub mod strikethrough;
pub mod table;
pub mod tagfilter;
pub mod tasklist;

use std::sync::{Arc, LazyLock};

use crate::editor::DocumentEditor;
use crate::error::{Error, Result};
use crate::iter::EventType;
use crate::node::{NodeRef, NodeType};
use crate::render::{CommonMarkContext, HtmlContext};

/// Engine syntax an extension needs switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFeature {
    Tables,
    Strikethrough,
    TaskLists,
}

/// A named syntax extension.
///
/// All hooks have no-op defaults, so an extension implements only the
/// phases it takes part in. Implementations are shared between parsers and
/// documents, and must be `Send + Sync`.
pub trait SyntaxExtension: Send + Sync {
    /// Unique name (e.g. "table", "tasklist").
    fn name(&self) -> &'static str;

    /// Engine syntax to enable while parsing.
    fn engine_features(&self) -> &'static [EngineFeature] {
        &[]
    }

    /// Claim a fenced code block by its full info string. Returns the name
    /// of the extension node type the block becomes.
    fn claim_fence(&self, _info: &str) -> Option<&'static str> {
        None
    }

    /// Rewrite the tree after parsing.
    fn postprocess(&self, _editor: &mut DocumentEditor<'_>) -> Result<()> {
        Ok(())
    }

    /// Override the reported type string of nodes this extension owns.
    fn node_type_string(&self, _node_type: NodeType) -> Option<&'static str> {
        None
    }

    /// Whether raw HTML with this tag name may be emitted verbatim.
    fn allows_html_tag(&self, _tag: &str) -> bool {
        true
    }

    /// Render an owned node as HTML. Returns `false` to fall back to the
    /// core renderer.
    fn render_html(&self, _node: NodeRef<'_>, _event: EventType, _ctx: &mut HtmlContext<'_>) -> bool {
        false
    }

    /// Render an owned node as CommonMark. Returns `false` to fall back to
    /// the core renderer.
    fn render_commonmark(
        &self,
        _node: NodeRef<'_>,
        _event: EventType,
        _ctx: &mut CommonMarkContext<'_>,
    ) -> bool {
        false
    }
}

/// Shared reference to a registered extension.
pub type ExtensionRef = Arc<dyn SyntaxExtension>;

/// Name-keyed collection of extensions.
///
/// Names are unique; lookup order is registration order.
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: Vec<ExtensionRef>,
}

impl ExtensionRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the core GFM extensions.
    #[must_use]
    pub fn with_core_extensions() -> Self {
        Self {
            extensions: core_extensions(),
        }
    }

    /// The process-wide registry of core extensions.
    ///
    /// Initialized once, on first use, from any thread.
    pub fn global() -> &'static ExtensionRegistry {
        &GLOBAL
    }

    /// Register an extension.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateExtension`] when the name is taken.
    pub fn register<E: SyntaxExtension + 'static>(&mut self, extension: E) -> Result<ExtensionRef> {
        let extension: ExtensionRef = Arc::new(extension);
        self.register_ref(Arc::clone(&extension))?;
        Ok(extension)
    }

    /// Register an already shared extension.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateExtension`] when the name is taken.
    pub fn register_ref(&mut self, extension: ExtensionRef) -> Result<()> {
        let name = extension.name();
        if self.find(name).is_some() {
            return Err(Error::DuplicateExtension(name.to_owned()));
        }
        tracing::debug!(extension = name, "Registered syntax extension");
        self.extensions.push(extension);
        Ok(())
    }

    /// Look up an extension by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ExtensionRef> {
        self.extensions
            .iter()
            .find(|ext| ext.name() == name)
            .map(Arc::clone)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.extensions.iter().map(|ext| ext.name())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

static GLOBAL: LazyLock<ExtensionRegistry> = LazyLock::new(|| {
    tracing::debug!("Registering core syntax extensions");
    ExtensionRegistry::with_core_extensions()
});

fn core_extensions() -> Vec<ExtensionRef> {
    vec![
        Arc::new(table::Table),
        Arc::new(strikethrough::Strikethrough),
        Arc::new(tasklist::TaskList),
        Arc::new(autolink::Autolink),
        Arc::new(tagfilter::TagFilter),
    ]
}

/// Make sure the process-wide registry of core extensions exists.
///
/// Idempotent and safe to call concurrently.
pub fn ensure_core_extensions_registered() -> &'static ExtensionRegistry {
    LazyLock::force(&GLOBAL)
}

/// Look up an extension in the process-wide registry.
#[must_use]
pub fn find_syntax_extension(name: &str) -> Option<ExtensionRef> {
    ExtensionRegistry::global().find(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Named(&'static str);

    impl SyntaxExtension for Named {
        fn name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn test_core_extensions_are_found() {
        let registry = ExtensionRegistry::with_core_extensions();
        for name in ["table", "strikethrough", "tasklist", "autolink", "tagfilter"] {
            let ext = registry.find(name).unwrap();
            assert_eq!(ext.name(), name);
        }
        assert!(registry.find("nonexistent").is_none());
    }

    #[test]
    fn test_find_is_stable() {
        let first = find_syntax_extension("table").unwrap();
        let second = find_syntax_extension("table").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_ensure_registered_is_idempotent() {
        let first = ensure_core_extensions_registered();
        let second = ensure_core_extensions_registered();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_ensure_registered_from_many_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| ensure_core_extensions_registered().len()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 5);
        }
    }

    #[test]
    fn test_register_custom_extension() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Named("custom")).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["custom"]);
    }

    #[test]
    fn test_register_duplicate_name_fails() {
        let mut registry = ExtensionRegistry::with_core_extensions();
        let err = registry.register(Named("table")).err().unwrap();
        assert_eq!(err, Error::DuplicateExtension("table".to_owned()));
    }

    static_assertions::assert_impl_all!(super::ExtensionRegistry: Send, Sync);
}
