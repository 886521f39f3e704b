//! Shared helpers for decoding input and mapping byte offsets to positions.

use std::borrow::Cow;
use std::ops::Range;

use pulldown_cmark::HeadingLevel;

use crate::node::SourceSpan;

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Decode raw input bytes.
///
/// Invalid UTF-8 sequences and NUL bytes become U+FFFD.
pub(crate) fn decode_input(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if matches!(text, Cow::Owned(_)) {
        tracing::debug!(len = bytes.len(), "Replaced invalid UTF-8 in input");
    }
    if text.contains('\0') {
        text.replace('\0', "\u{FFFD}")
    } else {
        text.into_owned()
    }
}

/// Collapse every run of whitespace into a single space.
pub(crate) fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    let needs_work = text
        .as_bytes()
        .windows(2)
        .any(|pair| pair[0].is_ascii_whitespace() && pair[1].is_ascii_whitespace())
        || text.bytes().any(|b| b.is_ascii_whitespace() && b != b' ');
    if !needs_work {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    Cow::Owned(out)
}

/// Line start offsets of a source text, for byte offset to line/column
/// conversion. Columns are 1-based byte columns.
pub(crate) struct LineIndex<'s> {
    source: &'s str,
    starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { source, starts }
    }

    pub(crate) fn source(&self) -> &'s str {
        self.source
    }

    /// 1-based (line, column) of a byte offset.
    pub(crate) fn position(&self, offset: usize) -> (u32, u32) {
        let line = self.starts.partition_point(|&start| start <= offset).max(1);
        let column = offset - self.starts[line - 1] + 1;
        (to_u32(line), to_u32(column))
    }

    /// Span of a byte range with trailing whitespace excluded. The end
    /// position is inclusive; an empty range spans its start position.
    pub(crate) fn span(&self, range: &Range<usize>) -> SourceSpan {
        let bytes = self.source.as_bytes();
        let start = range.start.min(bytes.len());
        let mut end = range.end.min(bytes.len());
        while end > start && bytes[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        let (start_line, start_column) = self.position(start);
        let (end_line, end_column) = if end > start {
            self.position(end - 1)
        } else {
            (start_line, start_column)
        };
        SourceSpan {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
