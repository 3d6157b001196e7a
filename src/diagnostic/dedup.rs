//! Removal of repeated diagnostics.
//!
//! Some invocation strategies re-emit byte-identical messages (for example a
//! syntax-only pass that visits the same include twice). Two diagnostics are
//! duplicates when range, message and severity are all equal.

use std::collections::HashSet;

use super::Diagnostic;

/// Drop structurally identical diagnostics, keeping the first occurrence of each
/// in its original position.
#[must_use]
pub fn dedup(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = HashSet::with_capacity(diagnostics.len());
    let mut unique = Vec::with_capacity(diagnostics.len());
    for diagnostic in diagnostics {
        if !seen.contains(&diagnostic) {
            seen.insert(diagnostic.clone());
            unique.push(diagnostic);
        }
    }
    unique
}
