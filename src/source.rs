//! Source documents handed to the linter.
//!
//! A [`SourceDocument`] stands in for an open editor buffer: it knows its path,
//! its source form and the text of each line, which is all the line-only
//! grammars need to place a diagnostic.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::extract::LineLookup;
use crate::Result;

/// Free-form Fortran extensions (case-insensitive)
pub const FREE_FORM_EXTENSIONS: &[&str] = &["f90", "f95", "f03", "f08", "f18", "fpp", "pf"];

/// Fixed-form Fortran extensions (case-insensitive)
pub const FIXED_FORM_EXTENSIONS: &[&str] = &["f", "f77", "for", "ftn"];

/// Files larger than this are not linted (100 MB)
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceForm {
    Free,
    Fixed,
}

impl SourceForm {
    /// Source form implied by the file extension. Unknown extensions are
    /// treated as free form.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let is_fixed = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                FIXED_FORM_EXTENSIONS
                    .iter()
                    .any(|fixed| fixed.eq_ignore_ascii_case(ext))
            });
        if is_fixed {
            SourceForm::Fixed
        } else {
            SourceForm::Free
        }
    }
}

/// Check if a path has a Fortran extension, either a built-in one or one of
/// `custom_extensions` (given with or without a leading dot).
#[must_use]
pub fn is_fortran_file(path: &Path, custom_extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let builtin = FREE_FORM_EXTENSIONS
                .iter()
                .chain(FIXED_FORM_EXTENSIONS)
                .any(|known| known.eq_ignore_ascii_case(ext));
            builtin
                || custom_extensions
                    .iter()
                    .any(|custom| custom.strip_prefix('.').unwrap_or(custom) == ext)
        })
}

#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    form: SourceForm,
    lines: Vec<String>,
}

impl SourceDocument {
    /// Read a document from disk. The stored path is made absolute so the
    /// compiler can be run from the document's own directory.
    pub fn open(path: &Path) -> Result<Self> {
        let path = &std::path::absolute(path)?;
        let size = std::fs::metadata(path)?.len();
        if size > MAX_FILE_SIZE {
            anyhow::bail!(
                "{} is too large to lint ({} MB exceeds limit of {} MB)",
                path.display(),
                size / (1024 * 1024),
                MAX_FILE_SIZE / (1024 * 1024)
            );
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_text(path, &text))
    }

    /// Build a document from in-memory text.
    #[must_use]
    pub fn from_text(path: &Path, text: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            form: SourceForm::from_path(path),
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn form(&self) -> SourceForm {
        self.form
    }

    #[must_use]
    pub fn is_free_form(&self) -> bool {
        self.form == SourceForm::Free
    }
}

impl LineLookup for SourceDocument {
    fn line_text(&self, index: usize) -> Option<Cow<'_, str>> {
        self.lines.get(index).map(|line| Cow::Borrowed(line.as_str()))
    }
}
