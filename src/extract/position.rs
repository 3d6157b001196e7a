//! Whole-line ranges for grammars that report no column.
//!
//! The text of the line comes from whatever currently holds the document,
//! injected as a [`LineLookup`], so extraction can be tested without an editor.

use std::borrow::Cow;

use crate::diagnostic::{Position, Range};
use crate::error::LintError;

/// Read-only, 0-based line access to an open document.
pub trait LineLookup {
    /// Text of line `index` without its terminator, or `None` when the line
    /// (or the document) is unavailable.
    fn line_text(&self, index: usize) -> Option<Cow<'_, str>>;
}

impl<F> LineLookup for F
where
    F: Fn(usize) -> Option<String>,
{
    fn line_text(&self, index: usize) -> Option<Cow<'_, str>> {
        self(index).map(Cow::Owned)
    }
}

impl LineLookup for [String] {
    fn line_text(&self, index: usize) -> Option<Cow<'_, str>> {
        self.get(index).map(|line| Cow::Borrowed(line.as_str()))
    }
}

impl LineLookup for [&str] {
    fn line_text(&self, index: usize) -> Option<Cow<'_, str>> {
        self.get(index).map(|line| Cow::Borrowed(*line))
    }
}

/// Range covering line `line` from column 0 to its last character.
pub fn resolve_line_range<L>(lookup: &L, line: usize) -> Result<Range, LintError>
where
    L: LineLookup + ?Sized,
{
    let text = lookup
        .line_text(line)
        .ok_or(LintError::DocumentUnavailable { line })?;
    let text = text.trim_end_matches(['\r', '\n']);
    Ok(Range::new(
        Position::new(line, 0),
        Position::new(line, text.chars().count()),
    ))
}
