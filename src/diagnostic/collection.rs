//! Per-document diagnostic store.
//!
//! Each lint pass produces a complete batch for one document; storing it
//! replaces whatever the previous pass left behind. Nothing is patched
//! incrementally.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{Diagnostic, Severity};

#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollection {
    entries: BTreeMap<PathBuf, Vec<Diagnostic>>,
}

impl DiagnosticCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the batch for `document`. An empty batch removes the entry.
    pub fn set(&mut self, document: impl Into<PathBuf>, diagnostics: Vec<Diagnostic>) {
        let document = document.into();
        if diagnostics.is_empty() {
            self.entries.remove(&document);
        } else {
            self.entries.insert(document, diagnostics);
        }
    }

    /// Documents in path order with their batches.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[Diagnostic])> {
        self.entries
            .iter()
            .map(|(path, diagnostics)| (path.as_path(), diagnostics.as_slice()))
    }

    /// Number of stored diagnostics with the given severity, over all documents.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .values()
            .flatten()
            .filter(|d| d.severity == severity)
            .count()
    }
}
