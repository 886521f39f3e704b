//! GFM tag filter: raw HTML for a fixed set of tags is neutralized by
//! escaping its `<`, even under `UNSAFE`.

use crate::extension::SyntaxExtension;

pub const NAME: &str = "tagfilter";

const FILTERED_TAGS: [&str; 9] = [
    "title",
    "textarea",
    "style",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "script",
    "plaintext",
];

/// The `tagfilter` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagFilter;

impl SyntaxExtension for TagFilter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn allows_html_tag(&self, tag: &str) -> bool {
        !FILTERED_TAGS.iter().any(|filtered| filtered.eq_ignore_ascii_case(tag))
    }
}
