//! One-call helpers over the parser and renderers, and the task-list API.
//!
//! Extensions are looked up by name in the process-wide registry, so the
//! helpers accept the same names a configuration file does.
//!
//! ```
//! use gfm_core::{Options, Toggle, gfm_toggle_task_by_id};
//!
//! let text = "- [ ] ship it\n";
//! let toggled = gfm_toggle_task_by_id(text, "1:1-1:13", Toggle::Flip, Options::DEFAULT).unwrap();
//! assert_eq!(toggled, "- [x] ship it\n");
//! ```

use std::fmt;

use crate::attributes::AttrValue;
use crate::document::Document;
use crate::error::Result;
use crate::extension::{ExtensionRegistry, tasklist};
use crate::iter::EventType;
use crate::node::{NodeHandle, NodeRef};
use crate::options::Options;
use crate::parser::Parser;

/// Extensions enabled by the GFM helpers, in attach order.
pub const GFM_EXTENSIONS: &[&str] = &["autolink", "strikethrough", "table", "tagfilter", "tasklist"];

/// Requested state for [`gfm_toggle_task_by_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Toggle {
    /// Invert the current state.
    #[default]
    Flip,
    /// Force checked (`true`) or unchecked (`false`).
    Set(bool),
}

impl Toggle {
    fn apply(self, current: bool) -> bool {
        match self {
            Self::Flip => !current,
            Self::Set(checked) => checked,
        }
    }
}

/// A task list item in a [`Document`].
#[derive(Clone, Copy)]
pub struct TaskNode<'a> {
    node: NodeRef<'a>,
}

impl<'a> TaskNode<'a> {
    /// Source span of the item as `"line:col-line:col"`, the value of the
    /// `data-gfm-task` HTML attribute.
    pub fn identifier(&self) -> &'a str {
        self.node
            .attribute(tasklist::NAME, "id")
            .and_then(AttrValue::as_text)
            .unwrap_or_default()
    }

    pub fn checked(&self) -> bool {
        self.node
            .attribute(tasklist::NAME, "checked")
            .and_then(AttrValue::as_bool)
            .unwrap_or(false)
    }

    pub fn handle(&self) -> NodeHandle {
        self.node.handle()
    }

    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl fmt::Debug for TaskNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.checked() { "checked" } else { "unchecked" };
        write!(f, "<TaskNode {state} ID '{}'>", self.identifier())
    }
}

impl Document {
    /// Task items in the order their EXIT events occur, so nested tasks
    /// come before the task that contains them.
    pub fn tasks(&self) -> Vec<TaskNode<'_>> {
        self.walk()
            .filter(|(event, node)| *event == EventType::Exit && node.type_string() == "tasklist")
            .map(|(_, node)| TaskNode { node })
            .collect()
    }

    /// The task whose identifier is `id`.
    pub fn task_by_id(&self, id: &str) -> Option<TaskNode<'_>> {
        self.tasks().into_iter().find(|task| task.identifier() == id)
    }

    /// Apply `toggle` to the task `id` and return its new state, or `None`
    /// when no task has that identifier.
    pub fn toggle_task(&mut self, id: &str, toggle: Toggle) -> Result<Option<bool>> {
        let Some((handle, checked)) = self.task_by_id(id).map(|task| (task.handle(), task.checked())) else {
            tracing::debug!(id, "Task not found");
            return Ok(None);
        };
        let checked = toggle.apply(checked);
        tasklist::set_checked(self, handle, checked)?;
        tracing::debug!(id, checked, "Toggled task");
        Ok(Some(checked))
    }
}

/// Parse `text` with the named extensions from the global registry.
///
/// # Errors
///
/// [`Error::UnknownExtension`](crate::Error::UnknownExtension) for a name the registry does not hold.
pub fn parse_markdown<S: AsRef<str>>(text: &str, options: Options, extensions: &[S]) -> Result<Document> {
    let registry = ExtensionRegistry::global();
    let mut parser = Parser::new(options);
    for name in extensions {
        parser.attach_extension_by_name(registry, name.as_ref())?;
    }
    parser.feed(text.as_bytes())?;
    parser.finish()
}

/// Parse `text` with [`GFM_EXTENSIONS`].
pub fn parse_gfm(text: &str, options: Options) -> Result<Document> {
    parse_markdown(text, options, GFM_EXTENSIONS)
}

/// Render `text` as HTML with the named extensions.
pub fn markdown_to_html<S: AsRef<str>>(text: &str, options: Options, extensions: &[S]) -> Result<String> {
    Ok(parse_markdown(text, options, extensions)?.to_html())
}

/// Render GitHub Flavored Markdown as HTML.
pub fn gfm_to_html(text: &str, options: Options) -> Result<String> {
    Ok(parse_gfm(text, options)?.to_html())
}

/// Set the state of the task `id` and return the document as CommonMark.
///
/// An unknown `id` returns `text` unchanged. Otherwise the whole document
/// is re-rendered, so the output is a normalized form of `text`.
pub fn gfm_toggle_task_by_id(text: &str, id: &str, toggle: Toggle, options: Options) -> Result<String> {
    let mut doc = parse_gfm(text, options)?;
    match doc.toggle_task(id, toggle)? {
        Some(_) => Ok(doc.to_commonmark(0)),
        None => Ok(text.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn outline(doc: &Document) -> Vec<(EventType, &'static str, Option<String>)> {
        doc.walk()
            .map(|(event, node)| (event, node.type_string(), node.literal().map(str::to_owned)))
            .collect()
    }

    #[test]
    fn test_markdown_to_html_without_extensions() {
        let text = "\nHello *world*. This is ~nice~.\n\n# A nice heading\n\n- [ ] I am\n- [ ] a list\n";
        let no_extensions: &[&str] = &[];
        assert_eq!(
            markdown_to_html(text, Options::DEFAULT, no_extensions).unwrap(),
            "<p>Hello <em>world</em>. This is ~nice~.</p>\n\
             <h1>A nice heading</h1>\n\
             <ul>\n<li>[ ] I am</li>\n<li>[ ] a list</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_gfm_to_html() {
        let text = "\nHello *world*. This is ~deleted~.\n\n# A nice heading\n\n- [ ] I am\n\
                    - [x] a tasklist with a [http://example.org](https://example.com)\n";
        assert_eq!(
            gfm_to_html(text, Options::DEFAULT).unwrap(),
            "<p>Hello <em>world</em>. This is <del>deleted</del>.</p>\n\
             <h1>A nice heading</h1>\n\
             <ul>\n\
             <li data-gfm-task=\"6:1-6:10\"><input type=\"checkbox\" disabled=\"\" /> I am</li>\n\
             <li data-gfm-task=\"7:1-7:65\"><input type=\"checkbox\" checked=\"\" disabled=\"\" /> \
             a tasklist with a <a href=\"https://example.com\">http://example.org</a></li>\n\
             </ul>\n"
        );
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(
            parse_markdown("x", Options::DEFAULT, &["table", "nope"]).unwrap_err(),
            Error::UnknownExtension("nope".to_owned())
        );
    }

    #[test]
    fn test_get_tasks() {
        let doc = parse_gfm("\n- [ ] I am\n- [x] a tasklist\n", Options::DEFAULT).unwrap();
        let tasks: Vec<_> = doc
            .tasks()
            .iter()
            .map(|task| (task.identifier().to_owned(), task.checked()))
            .collect();
        assert_eq!(
            tasks,
            vec![("2:1-2:10".to_owned(), false), ("3:1-3:16".to_owned(), true)]
        );
        assert_eq!(
            format!("{:?}", doc.tasks()[1]),
            "<TaskNode checked ID '3:1-3:16'>"
        );
    }

    #[test]
    fn test_tasks_in_exit_order() {
        let doc = parse_gfm("- [ ] outer\n  - [x] inner\n", Options::DEFAULT).unwrap();
        let ids: Vec<_> = doc.tasks().iter().map(TaskNode::identifier).collect();
        assert_eq!(ids, vec!["2:3-2:13", "1:1-2:13"]);
    }

    #[test]
    fn test_task_by_id() {
        let doc = parse_gfm("- [ ] a\n- [x] b\n", Options::DEFAULT).unwrap();
        assert!(doc.task_by_id("2:1-2:7").unwrap().checked());
        assert!(doc.task_by_id("9:9-9:9").is_none());
    }

    #[test]
    fn test_toggle() {
        let text = "\n- [ ] I am\n- [x] a tasklist\n";
        assert_eq!(
            gfm_toggle_task_by_id(text, "2:1-2:10", Toggle::Set(true), Options::DEFAULT)
                .unwrap()
                .trim(),
            "- [x] I am\n- [x] a tasklist"
        );
        assert_eq!(
            gfm_toggle_task_by_id(text, "3:1-3:16", Toggle::Flip, Options::DEFAULT)
                .unwrap()
                .trim(),
            "- [ ] I am\n- [ ] a tasklist"
        );
    }

    #[test]
    fn test_toggle_task_reports_state() {
        let mut doc = parse_gfm("- [ ] a\n- [x] b\n", Options::DEFAULT).unwrap();
        assert_eq!(doc.toggle_task("1:1-1:7", Toggle::Flip).unwrap(), Some(true));
        assert_eq!(doc.toggle_task("2:1-2:7", Toggle::Set(true)).unwrap(), Some(true));
        assert_eq!(doc.toggle_task("3:1-3:7", Toggle::Flip).unwrap(), None);
        assert!(doc.tasks().iter().all(TaskNode::checked));
        assert!(doc.to_html().contains("checked=\"\" disabled=\"\" /> a</li>"));
    }

    #[test]
    fn test_toggle_keeps_quotes_in_items() {
        let text = "- [ ] a\n- > quoted\n";
        let toggled = gfm_toggle_task_by_id(text, "1:1-1:7", Toggle::Flip, Options::DEFAULT).unwrap();
        assert_eq!(toggled, "- [x] a\n- > quoted\n");
    }

    #[test]
    fn test_toggle_missing_id_is_noop() {
        let text = "\nText.\n\n- [ ] I am\n- [x] a tasklist\n\nExtra text.\n";
        for id in ["does-not-exist", "2:1-2:10"] {
            assert_eq!(
                gfm_toggle_task_by_id(text, id, Toggle::Set(false), Options::DEFAULT).unwrap(),
                text
            );
        }
    }

    #[test]
    fn test_toggle_leaves_shape_alone() {
        let text = "- [ ] a\n- [x] b\n";
        let before = parse_gfm(text, Options::DEFAULT).unwrap();
        let toggled = gfm_toggle_task_by_id(text, "1:1-1:7", Toggle::Flip, Options::DEFAULT).unwrap();
        let after = parse_gfm(&toggled, Options::DEFAULT).unwrap();
        assert_eq!(outline(&before), outline(&after));
        assert!(after.tasks()[0].checked());
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let text = "# T\n\n- [x] a www.example.com\n\n| a | b |\n| - | - |\n| 1 | 2 |\n";
        let first = gfm_to_html(text, Options::SOURCEPOS).unwrap();
        let second = gfm_to_html(text, Options::SOURCEPOS).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_commonmark_round_trip_is_stable() {
        let corpus = [
            "# Title\n\nSome *emph* and **strong** text.\n",
            "- a\n- b\n\n1. one\n2. two\n",
            "> quoted\n> more\n",
            "```rust\nfn main() {}\n```\n",
            "[link](http://x.com \"t\") and `code`\n",
            "- [ ] todo\n- [x] done\n",
            "~~gone~~ but *not* forgotten\n",
            "| a | b |\n| --- | :-: |\n| 1 | 2 |\n",
            "Line one\\\nline two\n\n***\n",
            "- > a\n",
            "1. > a\n",
            "> - > a\n",
            "- [ ] > quoted task\n",
            "x***a***y\n",
        ];
        for input in corpus {
            let doc = parse_gfm(input, Options::DEFAULT).unwrap();
            let rendered = doc.to_commonmark(0);
            let reparsed = parse_gfm(&rendered, Options::DEFAULT).unwrap();
            assert_eq!(outline(&doc), outline(&reparsed), "input: {input:?}\nrendered: {rendered:?}");
        }
    }

    fn gfm_markdown() -> impl Strategy<Value = String> {
        let prefix = prop::sample::select(vec!["- ", "> ", "1. ", "- [ ] ", "- [x] "]);
        let inline = prop::sample::select(vec!["a", "b c", "*e*", "**s**", "~~d~~", "`k`", "x***y***z", "*_w_*", "1."]);
        let line = (prop::collection::vec(prefix, 0..3), prop::collection::vec(inline, 1..4))
            .prop_map(|(prefix, inline)| format!("{}{}", prefix.concat(), inline.join(" ")));
        prop::collection::vec((line, any::<bool>()), 1..6).prop_map(|lines| {
            lines
                .into_iter()
                .map(|(line, blank)| format!("{line}{}", if blank { "\n\n" } else { "\n" }))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_gfm_render_then_parse_keeps_tree(source in gfm_markdown()) {
            let doc = parse_gfm(&source, Options::DEFAULT).unwrap();
            let rendered = doc.to_commonmark(0);
            let reparsed = parse_gfm(&rendered, Options::DEFAULT).unwrap();
            prop_assert_eq!(outline(&doc), outline(&reparsed), "rendered: {:?}", rendered);
        }
    }
}
