//! GFM strikethrough: `~~text~~`, and `~text~` unless
//! `STRIKETHROUGH_DOUBLE_TILDE` is set.

use crate::editor::DocumentEditor;
use crate::error::Result;
use crate::extension::{EngineFeature, SyntaxExtension};
use crate::iter::EventType;
use crate::node::{ExtensionNodeType, NodeRef, NodeType};
use crate::options::Options;
use crate::render::{CommonMarkContext, HtmlContext};

pub const NAME: &str = "strikethrough";

pub const STRIKETHROUGH: ExtensionNodeType = ExtensionNodeType {
    extension: NAME,
    name: "strikethrough",
};

/// The `strikethrough` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strikethrough;

impl SyntaxExtension for Strikethrough {
    fn name(&self) -> &'static str {
        NAME
    }

    fn engine_features(&self) -> &'static [EngineFeature] {
        &[EngineFeature::Strikethrough]
    }

    /// Single-tilde spans go back to literal text when only double tildes
    /// are allowed.
    fn postprocess(&self, editor: &mut DocumentEditor<'_>) -> Result<()> {
        if !editor.options().contains(Options::STRIKETHROUGH_DOUBLE_TILDE) {
            return Ok(());
        }
        for handle in editor.handles() {
            if editor.node(handle)?.node_type() != NodeType::Extension(STRIKETHROUGH) {
                continue;
            }
            let range = editor.source_range(handle)?;
            let doubled = editor
                .source()
                .get(range.start..)
                .is_some_and(|rest| rest.starts_with("~~"));
            if doubled || range.is_empty() {
                continue;
            }
            let parent = editor.node(handle)?.parent().map(|parent| parent.handle());
            let open = editor.new_text("~", range.start..range.start + 1);
            let close = editor.new_text("~", range.end - 1..range.end);
            editor.insert_before(handle, open)?;
            editor.append_child(handle, close)?;
            editor.unwrap_node(handle)?;
            if let Some(parent) = parent {
                editor.merge_adjacent_text(parent)?;
            }
        }
        Ok(())
    }

    fn render_html(&self, node: NodeRef<'_>, event: EventType, ctx: &mut HtmlContext<'_>) -> bool {
        if node.node_type() != NodeType::Extension(STRIKETHROUGH) {
            return false;
        }
        ctx.push_str(if event == EventType::Enter { "<del>" } else { "</del>" });
        true
    }

    fn render_commonmark(
        &self,
        node: NodeRef<'_>,
        _event: EventType,
        ctx: &mut CommonMarkContext<'_>,
    ) -> bool {
        if node.node_type() != NodeType::Extension(STRIKETHROUGH) {
            return false;
        }
        ctx.push_raw("~~");
        true
    }
}
