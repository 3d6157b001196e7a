//! Removal of build artifacts left in the module output directory.

use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::Result;

/// Extensions of files the compilers drop next to their module output.
pub const ARTIFACT_EXTENSIONS: &[&str] = &["mod", "smod", "o"];

/// Delete every module, submodule and object file below `dir`.
///
/// Returns the number of files removed. A missing directory is not an error.
pub fn clean(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in WalkDir::new(dir)
        .max_depth(256)
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        let path = entry.path();
        let is_artifact = entry.file_type().is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ARTIFACT_EXTENSIONS.contains(&ext));
        if is_artifact {
            std::fs::remove_file(path)?;
            debug!("[lint] removed {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}
