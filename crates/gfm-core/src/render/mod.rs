//! Document renderers.
//!
//! Both renderers walk the tree with ENTER/EXIT events. For a node owned by
//! an extension, that extension's hook runs first; when it declines, the
//! built-in rules apply. Nodes of extensions that are not attached degrade
//! to their children, or to a code block for claimed fences.

mod commonmark;
mod escape;
mod html;

pub use commonmark::CommonMarkContext;
pub use escape::{escape_href, escape_html, is_safe_url};
pub use html::HtmlContext;

use crate::document::Document;
use crate::extension::ExtensionRef;
use crate::options::Options;

/// Render `doc` as HTML, consulting `extensions` for the nodes they own.
///
/// Nodes owned by an extension missing from `extensions` render as their
/// children.
#[must_use]
pub fn render_html(doc: &Document, options: Options, extensions: &[ExtensionRef]) -> String {
    let output = html::render(doc, options, extensions);
    tracing::debug!(bytes = output.len(), "Rendered HTML");
    output
}

/// Render `doc` as CommonMark. `width` 0 disables wrapping.
///
/// Uses the extensions the document was parsed with.
#[must_use]
pub fn render_commonmark(doc: &Document, options: Options, width: usize) -> String {
    let output = commonmark::render(doc, options, &doc.extensions, width);
    tracing::debug!(bytes = output.len(), width, "Rendered CommonMark");
    output
}

impl Document {
    /// Render as HTML with the document's own options and extensions.
    #[must_use]
    pub fn to_html(&self) -> String {
        render_html(self, self.options, &self.extensions)
    }

    /// Render as CommonMark with the document's own options. `width` 0
    /// disables wrapping.
    #[must_use]
    pub fn to_commonmark(&self, width: usize) -> String {
        render_commonmark(self, self.options, width)
    }
}
