//! GFM extended autolinks: bare `www.`, `http://`, `https://` URLs and
//! email addresses in text become links.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::editor::DocumentEditor;
use crate::error::Result;
use crate::extension::SyntaxExtension;
use crate::node::{NodeRef, NodeType};

pub const NAME: &str = "autolink";

/// Candidate links, preceded by start of text, whitespace, or an opening
/// delimiter.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s*_~(])((?:https?://|www\.)[^\s<]+|[a-z0-9.+_-]+@[a-z0-9_-]+(?:\.[a-z0-9_-]+)+)",
    )
    .unwrap()
});

/// The `autolink` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Autolink;

impl SyntaxExtension for Autolink {
    fn name(&self) -> &'static str {
        NAME
    }

    fn postprocess(&self, editor: &mut DocumentEditor<'_>) -> Result<()> {
        for handle in editor.handles() {
            let node = editor.node(handle)?;
            if node.node_type() != NodeType::Text || inside_link(&node) {
                continue;
            }
            let literal = node.literal().unwrap_or_default().to_owned();
            let links = find_links(&literal);
            if links.is_empty() {
                continue;
            }
            let range = editor.source_range(handle)?;
            let at = |offset: usize| (range.start + offset).min(range.end);
            let mut cursor = 0;
            for (found, url) in links {
                if found.start > cursor {
                    let text = editor.new_text(&literal[cursor..found.start], at(cursor)..at(found.start));
                    editor.insert_before(handle, text)?;
                }
                let span = at(found.start)..at(found.end);
                let link = editor.new_link(url, "", true, span.clone());
                let text = editor.new_text(&literal[found.clone()], span);
                editor.append_child(link, text)?;
                editor.insert_before(handle, link)?;
                cursor = found.end;
            }
            if cursor < literal.len() {
                let text = editor.new_text(&literal[cursor..], at(cursor)..range.end);
                editor.insert_before(handle, text)?;
            }
            editor.detach(handle)?;
        }
        Ok(())
    }
}

fn inside_link(node: &NodeRef<'_>) -> bool {
    let mut cursor = node.parent();
    while let Some(ancestor) = cursor {
        if matches!(ancestor.node_type(), NodeType::Link | NodeType::Image) {
            return true;
        }
        cursor = ancestor.parent();
    }
    false
}

/// Byte ranges of links within `text`, with their destinations.
fn find_links(text: &str) -> Vec<(Range<usize>, String)> {
    let mut links = Vec::new();
    for captures in LINK_RE.captures_iter(text) {
        let Some(found) = captures.get(1) else {
            continue;
        };
        let raw = found.as_str();
        let lower = raw.to_ascii_lowercase();
        let web = lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.");
        if !web {
            if raw.ends_with(['-', '_']) {
                continue;
            }
            links.push((found.range(), format!("mailto:{raw}")));
            continue;
        }
        let trimmed = trim_trailing(raw);
        let scheme_len = lower.find("://").map_or(4, |i| i + 3);
        let host = trimmed
            .get(scheme_len..)
            .unwrap_or_default()
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        if host.is_empty() {
            continue;
        }
        let url = if lower.starts_with("www.") {
            format!("http://{trimmed}")
        } else {
            trimmed.to_owned()
        };
        links.push((found.start()..found.start() + trimmed.len(), url));
    }
    links
}

/// Drop trailing punctuation, and closing parentheses without a match.
fn trim_trailing(url: &str) -> &str {
    let mut end = url.len();
    loop {
        let candidate = &url[..end];
        let Some(last) = candidate.chars().last() else {
            break;
        };
        let drop = match last {
            '?' | '!' | '.' | ',' | ':' | '*' | '_' | '~' | '\'' | '"' | ';' => true,
            ')' => candidate.matches(')').count() > candidate.matches('(').count(),
            _ => false,
        };
        if !drop {
            break;
        }
        end -= last.len_utf8();
    }
    &url[..end]
}
