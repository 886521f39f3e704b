//! GFM task list items: `- [ ] open` and `- [x] done`.
//!
//! Task items stay `item` nodes owned by this extension, so they report
//! `"tasklist"` as their type string. Each carries two attributes:
//! `checked` (bool) and `id`, the item's source span as `"l:c-l:c"`, which
//! is computed whether or not `SOURCEPOS` was requested.

use crate::attributes::AttrValue;
use crate::document::Document;
use crate::editor::DocumentEditor;
use crate::error::{Error, Result};
use crate::extension::{EngineFeature, SyntaxExtension};
use crate::iter::EventType;
use crate::node::{NodeHandle, NodeRef, NodeType};
use crate::render::{CommonMarkContext, HtmlContext};

pub const NAME: &str = "tasklist";

/// The `tasklist` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskList;

fn is_task(node: &NodeRef<'_>) -> bool {
    node.node_type() == NodeType::Item && node.owner() == Some(NAME)
}

fn checked(node: &NodeRef<'_>) -> bool {
    node.attribute(NAME, "checked")
        .and_then(AttrValue::as_bool)
        .unwrap_or(false)
}

impl SyntaxExtension for TaskList {
    fn name(&self) -> &'static str {
        NAME
    }

    fn engine_features(&self) -> &'static [EngineFeature] {
        &[EngineFeature::TaskLists]
    }

    fn postprocess(&self, editor: &mut DocumentEditor<'_>) -> Result<()> {
        for handle in editor.handles() {
            if !is_task(&editor.node(handle)?) {
                continue;
            }
            let span = editor.source_span(handle)?;
            editor.set_attribute(handle, NAME, "id", span.to_string())?;
        }
        Ok(())
    }

    fn node_type_string(&self, node_type: NodeType) -> Option<&'static str> {
        (node_type == NodeType::Item).then_some("tasklist")
    }

    fn render_html(&self, node: NodeRef<'_>, event: EventType, ctx: &mut HtmlContext<'_>) -> bool {
        if !is_task(&node) {
            return false;
        }
        if event == EventType::Enter {
            let id = node
                .attribute(NAME, "id")
                .and_then(AttrValue::as_text)
                .unwrap_or_default();
            ctx.cr();
            ctx.push_str("<li");
            ctx.sourcepos(node);
            ctx.push_str(" data-gfm-task=\"");
            ctx.push_escaped(id);
            ctx.push_str("\"><input type=\"checkbox\"");
            if checked(&node) {
                ctx.push_str(" checked=\"\"");
            }
            ctx.push_str(" disabled=\"\" /> ");
        } else {
            ctx.push_str("</li>\n");
        }
        true
    }

    fn render_commonmark(
        &self,
        node: NodeRef<'_>,
        event: EventType,
        ctx: &mut CommonMarkContext<'_>,
    ) -> bool {
        if !is_task(&node) {
            return false;
        }
        if event == EventType::Enter {
            ctx.begin_list_item(if checked(&node) { "[x] " } else { "[ ] " });
        } else {
            ctx.end_list_item();
        }
        true
    }
}

/// Whether `node` is a checked task item.
///
/// # Errors
///
/// [`Error::AttributeNotApplicable`] when the node is not a task item.
pub fn is_checked(node: &NodeRef<'_>) -> Result<bool> {
    if !is_task(node) {
        return Err(Error::not_applicable(NAME, node.node_type()));
    }
    Ok(checked(node))
}

/// Check or uncheck the task item at `handle`. The tree's shape is
/// unchanged.
///
/// # Errors
///
/// [`Error::AttributeNotApplicable`] when the node is not a task item, or a
/// handle error when `handle` does not belong to `doc`.
pub fn set_checked(doc: &mut Document, handle: NodeHandle, checked: bool) -> Result<()> {
    doc.set_attribute(handle, NAME, "checked", AttrValue::Bool(checked))
}

impl Document {
    /// Shorthand for [`is_checked`] on the node at `handle`.
    pub fn is_task_checked(&self, handle: NodeHandle) -> Result<bool> {
        is_checked(&self.node(handle)?)
    }

    /// Shorthand for [`set_checked`].
    pub fn set_task_checked(&mut self, handle: NodeHandle, checked: bool) -> Result<()> {
        set_checked(self, handle, checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtensionRef, Options, parse_document, parse_document_with};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn parse(source: &str) -> Document {
        let ext: ExtensionRef = Arc::new(TaskList);
        parse_document_with(source.as_bytes(), Options::DEFAULT, &[ext]).unwrap()
    }

    #[test]
    fn test_items_are_tagged() {
        let doc = parse("- [ ] open\n- [x] done\n- plain\n");
        let list = doc.root().first_child().unwrap();
        let items: Vec<_> = list
            .children()
            .map(|item| (item.type_string(), item.text_content()))
            .collect();
        assert_eq!(
            items,
            vec![
                ("tasklist", "open".to_owned()),
                ("tasklist", "done".to_owned()),
                ("item", "plain".to_owned()),
            ]
        );
    }

    #[test]
    fn test_checked_state() {
        let mut doc = parse("- [ ] open\n- [x] done\n");
        let handles: Vec<_> = doc
            .root()
            .first_child()
            .unwrap()
            .children()
            .map(|item| item.handle())
            .collect();
        assert!(!doc.is_task_checked(handles[0]).unwrap());
        assert!(doc.is_task_checked(handles[1]).unwrap());
        doc.set_task_checked(handles[0], true).unwrap();
        assert!(doc.is_task_checked(handles[0]).unwrap());
        assert_eq!(doc.to_commonmark(0), "- [x] open\n- [x] done\n");
        assert_eq!(
            doc.to_html(),
            "<ul>\n\
             <li data-gfm-task=\"1:1-1:10\"><input type=\"checkbox\" checked=\"\" disabled=\"\" /> open</li>\n\
             <li data-gfm-task=\"2:1-2:10\"><input type=\"checkbox\" checked=\"\" disabled=\"\" /> done</li>\n\
             </ul>\n"
        );
        doc.set_task_checked(handles[1], false).unwrap();
        assert!(doc.to_html().contains("<li data-gfm-task=\"2:1-2:10\"><input type=\"checkbox\" disabled=\"\" /> done</li>"));
    }

    #[test]
    fn test_id_without_sourcepos() {
        let doc = parse("\n- [ ] I am\n- [x] a tasklist\n");
        let ids: Vec<_> = doc
            .root()
            .first_child()
            .unwrap()
            .children()
            .map(|item| item.attribute(NAME, "id").and_then(AttrValue::as_text).map(str::to_owned))
            .collect();
        assert_eq!(
            ids,
            vec![Some("2:1-2:10".to_owned()), Some("3:1-3:16".to_owned())]
        );
        assert!(doc.root().first_child().unwrap().span().is_empty());
    }

    #[test]
    fn test_accessor_rejects_other_nodes() {
        let mut doc = parse("- plain\n");
        let item = doc.root().first_child().unwrap().first_child().unwrap().handle();
        assert_eq!(
            doc.is_task_checked(item).unwrap_err(),
            Error::not_applicable(NAME, NodeType::Item)
        );
        assert!(doc.set_task_checked(item, true).is_err());
        let paragraph = doc.root().first_child().unwrap().first_child().unwrap().first_child().unwrap();
        assert_eq!(
            is_checked(&paragraph).unwrap_err(),
            Error::not_applicable(NAME, NodeType::Paragraph)
        );
    }

    #[test]
    fn test_without_extension_markers_are_text() {
        let doc = parse_document(b"- [ ] open\n", Options::DEFAULT);
        assert_eq!(doc.root().text_content(), "[ ] open");
    }

    #[test]
    fn test_html() {
        let doc = parse("- [x] done\n");
        assert_eq!(
            doc.to_html(),
            "<ul>\n<li data-gfm-task=\"1:1-1:10\"><input type=\"checkbox\" checked=\"\" disabled=\"\" /> done</li>\n</ul>\n"
        );
    }
}
