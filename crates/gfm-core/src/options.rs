//! Option bitmask shared by parsing and rendering.
//!
//! Every flag is independent: its absence disables the feature outright.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Independent boolean flags combined with `|`.
///
/// ```
/// use gfm_core::Options;
///
/// let options = Options::SOURCEPOS | Options::SMART;
/// assert!(options.contains(Options::SMART));
/// assert!(!options.contains(Options::UNSAFE));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Options(u32);

impl Options {
    /// No flags.
    pub const DEFAULT: Self = Self(0);
    /// Populate source spans and emit `data-sourcepos` on block elements.
    pub const SOURCEPOS: Self = Self(1 << 1);
    /// Render soft breaks as hard line breaks.
    pub const HARDBREAKS: Self = Self(1 << 2);
    /// Let raw HTML and dangerous URLs through to HTML output.
    pub const UNSAFE: Self = Self(1 << 17);
    /// Render soft breaks as spaces.
    pub const NOBREAKS: Self = Self(1 << 4);
    /// Collapse whitespace runs inside text when rendering.
    pub const NORMALIZE: Self = Self(1 << 8);
    /// Replace invalid UTF-8 sequences with U+FFFD.
    pub const VALIDATE_UTF8: Self = Self(1 << 9);
    /// Typographic quotes and dashes.
    pub const SMART: Self = Self(1 << 10);
    /// `<pre lang="x">` instead of `<code class="language-x">`.
    pub const GITHUB_PRE_LANG: Self = Self(1 << 11);
    /// Be liberal in interpreting inline HTML tags.
    pub const LIBERAL_HTML_TAG: Self = Self(1 << 12);
    /// Parse footnote references and definitions.
    pub const FOOTNOTES: Self = Self(1 << 13);
    /// Only `~~text~~` counts as strikethrough.
    pub const STRIKETHROUGH_DOUBLE_TILDE: Self = Self(1 << 14);
    /// Align table cells with `style` instead of `align`.
    pub const TABLE_PREFER_STYLE_ATTRIBUTES: Self = Self(1 << 15);
    /// Keep the info string remainder as `data-meta`.
    pub const FULL_INFO_STRING: Self = Self(1 << 16);

    const NAMED: [(&'static str, Self); 13] = [
        ("sourcepos", Self::SOURCEPOS),
        ("hardbreaks", Self::HARDBREAKS),
        ("unsafe", Self::UNSAFE),
        ("nobreaks", Self::NOBREAKS),
        ("normalize", Self::NORMALIZE),
        ("validate_utf8", Self::VALIDATE_UTF8),
        ("smart", Self::SMART),
        ("github_pre_lang", Self::GITHUB_PRE_LANG),
        ("liberal_html_tag", Self::LIBERAL_HTML_TAG),
        ("footnotes", Self::FOOTNOTES),
        ("strikethrough_double_tilde", Self::STRIKETHROUGH_DOUBLE_TILDE),
        (
            "table_prefer_style_attributes",
            Self::TABLE_PREFER_STYLE_ATTRIBUTES,
        ),
        ("full_info_string", Self::FULL_INFO_STRING),
    ];

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, dropping unknown ones.
    #[must_use]
    pub fn from_bits_truncate(bits: u32) -> Self {
        let known = Self::NAMED.iter().fold(0, |acc, (_, flag)| acc | flag.0);
        Self(bits & known)
    }

    /// True when every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Copy with `other` switched on or off.
    #[must_use]
    pub const fn with(self, other: Self, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | other.0)
        } else {
            Self(self.0 & !other.0)
        }
    }

    /// Look up a flag by its snake_case name (`"sourcepos"`, `"unsafe"`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "default" {
            return Some(Self::DEFAULT);
        }
        Self::NAMED
            .iter()
            .find(|(flag_name, _)| *flag_name == name)
            .map(|(_, flag)| *flag)
    }

    /// Names of the flags that are set, in declaration order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .iter()
            .filter(move |(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
    }

    /// Every recognized flag name.
    pub fn all_names() -> impl Iterator<Item = &'static str> {
        Self::NAMED.iter().map(|(name, _)| *name)
    }
}

impl BitOr for Options {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Options {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("Options(DEFAULT)");
        }
        f.write_str("Options(")?;
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        f.write_str(")")
    }
}
