//! GFM pipe tables.
//!
//! Nodes: `table` > `table_header` | `table_row` > `table_cell`. The header
//! holds its cells directly. Cells carry an `align` attribute (`left`,
//! `center` or `right`) when their column declares one; the table carries
//! its column count as `columns`.

use pulldown_cmark::Alignment;

use crate::attributes::AttrValue;
use crate::extension::{EngineFeature, SyntaxExtension};
use crate::iter::EventType;
use crate::node::{ExtensionNodeType, NodeRef, NodeType};
use crate::options::Options;
use crate::render::{CommonMarkContext, HtmlContext};

pub const NAME: &str = "table";

pub const TABLE: ExtensionNodeType = ExtensionNodeType {
    extension: NAME,
    name: "table",
};
pub const TABLE_HEADER: ExtensionNodeType = ExtensionNodeType {
    extension: NAME,
    name: "table_header",
};
pub const TABLE_ROW: ExtensionNodeType = ExtensionNodeType {
    extension: NAME,
    name: "table_row",
};
pub const TABLE_CELL: ExtensionNodeType = ExtensionNodeType {
    extension: NAME,
    name: "table_cell",
};

pub(crate) fn alignment_name(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}

fn cell_alignment<'a>(cell: &NodeRef<'a>) -> Option<&'a str> {
    cell.attribute(NAME, "align").and_then(AttrValue::as_text)
}

fn is_header_cell(cell: &NodeRef<'_>) -> bool {
    cell.parent()
        .is_some_and(|row| row.node_type() == NodeType::Extension(TABLE_HEADER))
}

/// The `table` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Table;

impl SyntaxExtension for Table {
    fn name(&self) -> &'static str {
        NAME
    }

    fn engine_features(&self) -> &'static [EngineFeature] {
        &[EngineFeature::Tables]
    }

    fn render_html(&self, node: NodeRef<'_>, event: EventType, ctx: &mut HtmlContext<'_>) -> bool {
        let NodeType::Extension(kind) = node.node_type() else {
            return false;
        };
        let entering = event == EventType::Enter;
        match kind {
            TABLE => {
                ctx.cr();
                if entering {
                    ctx.push_str("<table");
                    ctx.sourcepos(node);
                    ctx.push_str(">\n");
                } else {
                    if node.children().len() > 1 {
                        ctx.push_str("</tbody>\n");
                    }
                    ctx.push_str("</table>\n");
                }
            }
            TABLE_HEADER => {
                ctx.cr();
                if entering {
                    ctx.push_str("<thead>\n<tr");
                    ctx.sourcepos(node);
                    ctx.push_str(">\n");
                } else {
                    ctx.push_str("</tr>\n</thead>\n");
                }
            }
            TABLE_ROW => {
                ctx.cr();
                if entering {
                    let first_body_row = node
                        .previous_sibling()
                        .is_some_and(|prev| prev.node_type() == NodeType::Extension(TABLE_HEADER));
                    if first_body_row {
                        ctx.push_str("<tbody>\n");
                    }
                    ctx.push_str("<tr");
                    ctx.sourcepos(node);
                    ctx.push_str(">\n");
                } else {
                    ctx.push_str("</tr>\n");
                }
            }
            TABLE_CELL => {
                let tag = if is_header_cell(&node) { "th" } else { "td" };
                if entering {
                    ctx.cr();
                    ctx.push_str("<");
                    ctx.push_str(tag);
                    if let Some(alignment) = cell_alignment(&node) {
                        if ctx.options().contains(Options::TABLE_PREFER_STYLE_ATTRIBUTES) {
                            ctx.push_str(&format!(r#" style="text-align: {alignment}""#));
                        } else {
                            ctx.push_str(&format!(r#" align="{alignment}""#));
                        }
                    }
                    ctx.sourcepos(node);
                    ctx.push_str(">");
                } else {
                    ctx.push_str(&format!("</{tag}>\n"));
                }
            }
            _ => return false,
        }
        true
    }

    fn render_commonmark(
        &self,
        node: NodeRef<'_>,
        event: EventType,
        ctx: &mut CommonMarkContext<'_>,
    ) -> bool {
        let NodeType::Extension(kind) = node.node_type() else {
            return false;
        };
        let entering = event == EventType::Enter;
        match kind {
            TABLE => {
                if entering {
                    ctx.cr();
                } else {
                    ctx.blank_line();
                }
            }
            TABLE_HEADER | TABLE_ROW => {
                if entering {
                    ctx.cr();
                    ctx.push_raw("|");
                } else if kind == TABLE_HEADER {
                    let mut delimiter = String::from("|");
                    for cell in node.children() {
                        let marker = match cell_alignment(&cell) {
                            Some("left") => ":--",
                            Some("center") => ":-:",
                            Some("right") => "--:",
                            _ => "---",
                        };
                        delimiter.push(' ');
                        delimiter.push_str(marker);
                        delimiter.push_str(" |");
                    }
                    ctx.cr();
                    ctx.push_raw(&delimiter);
                }
            }
            TABLE_CELL => {
                if entering {
                    ctx.push_raw(" ");
                    ctx.set_table_cell(true);
                } else {
                    ctx.set_table_cell(false);
                    ctx.push_raw(" |");
                }
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtensionRef, Options, parse_document_with};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn parse(source: &str) -> crate::Document {
        let ext: ExtensionRef = Arc::new(Table);
        parse_document_with(source.as_bytes(), Options::DEFAULT, &[ext]).unwrap()
    }

    #[test]
    fn test_table_structure() {
        let doc = parse("| a | b |\n|---|:-:|\n| 1 | 2 |\n| 3 | 4 |\n");
        let table = doc.root().first_child().unwrap();
        assert_eq!(table.type_string(), "table");
        assert_eq!(table.owner(), Some("table"));
        assert_eq!(table.attribute(NAME, "columns"), Some(&AttrValue::Int(2)));
        let kinds: Vec<_> = table.children().map(|row| row.type_string()).collect();
        assert_eq!(kinds, vec!["table_header", "table_row", "table_row"]);
        let header = table.first_child().unwrap();
        let cells: Vec<_> = header
            .children()
            .map(|cell| (cell.text_content(), cell_alignment(&cell).map(str::to_owned)))
            .collect();
        assert_eq!(
            cells,
            vec![("a".to_owned(), None), ("b".to_owned(), Some("center".to_owned()))]
        );
    }

    #[test]
    fn test_header_only_table_has_no_body() {
        let doc = parse("| a |\n|---|\n");
        assert_eq!(
            doc.to_html(),
            "<table>\n<thead>\n<tr>\n<th>a</th>\n</tr>\n</thead>\n</table>\n"
        );
    }

    #[test]
    fn test_pipes_in_cells_are_escaped() {
        let doc = parse("| a \\| b |\n|---|\n");
        assert_eq!(doc.to_commonmark(0), "| a \\| b |\n| --- |\n");
    }

    #[test]
    fn test_without_extension_pipes_are_text() {
        let doc = parse_document_with(b"| a |\n|---|\n", Options::DEFAULT, &[]).unwrap();
        assert_eq!(doc.root().first_child().unwrap().node_type(), NodeType::Paragraph);
    }
}
