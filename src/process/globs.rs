//! Include-path globs resolved to directories.

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::debug;

use super::variables::{resolve_variables, VariableContext};
use crate::Result;

/// A list of glob patterns and the directories they currently resolve to.
///
/// Resolution walks the filesystem, so the result is kept until the pattern
/// list changes.
#[derive(Debug, Clone, Default)]
pub struct GlobPaths {
    globs: Vec<String>,
    paths: Vec<PathBuf>,
}

impl GlobPaths {
    /// Replace the pattern list. Returns `false` without touching the
    /// filesystem when the list is unchanged.
    pub fn update(&mut self, globs: &[String], context: &VariableContext) -> Result<bool> {
        if self.globs == globs {
            return Ok(false);
        }
        self.resolve_into(globs, context)?;
        debug!("[lint] include globs changed, resolved {} directories", self.paths.len());
        Ok(true)
    }

    #[must_use]
    pub fn globs(&self) -> &[String] {
        &self.globs
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn resolve_into(&mut self, globs: &[String], context: &VariableContext) -> Result<()> {
        self.paths = resolve_globs(globs, context)?;
        self.globs = globs.to_vec();
        Ok(())
    }
}

/// Compiler and fypp include caches, carried from one settings resolution to
/// the next so configurations sharing a pattern list glob only once.
#[derive(Debug, Default)]
pub struct IncludeCache {
    pub compiler: GlobPaths,
    pub fypp: GlobPaths,
}

/// Expand variables in each pattern, then glob for directories.
///
/// Relative patterns are anchored at the first workspace root.
fn resolve_globs(globs: &[String], context: &VariableContext) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for raw in globs {
        let resolved = resolve_variables(raw, context).replace('\\', "/");
        let pattern = match context.root() {
            Some(root) if !Path::new(&resolved).is_absolute() => {
                format!("{}/{resolved}", root.display())
            }
            _ => resolved,
        };
        let entries = glob::glob(&pattern)
            .with_context(|| format!("invalid include glob '{raw}'"))?;
        dirs.extend(
            entries
                .filter_map(std::result::Result::ok)
                .filter(|p| p.is_dir()),
        );
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("build/a/mod")).unwrap();
        std::fs::create_dir_all(dir.path().join("build/b")).unwrap();
        std::fs::write(dir.path().join("build/readme.txt"), "x").unwrap();
        dir
    }

    fn resolved(globs: &[&str], ctx: &VariableContext) -> GlobPaths {
        let mut cache = GlobPaths::default();
        let globs: Vec<String> = globs.iter().map(|g| (*g).to_string()).collect();
        cache.update(&globs, ctx).unwrap();
        cache
    }

    #[test]
    fn test_only_directories() {
        let dir = tree();
        let ctx = VariableContext::with_root(dir.path());
        let cache = resolved(&["build/*"], &ctx);
        let mut names: Vec<_> = cache
            .paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_workspace_variable_and_recursive() {
        let dir = tree();
        let ctx = VariableContext::with_root(dir.path());
        let cache = resolved(&["${workspaceFolder}/build/**"], &ctx);
        assert!(cache.paths().iter().any(|p| p.ends_with("a/mod")));
        assert!(cache.paths().iter().all(|p| p.is_dir()));
    }

    #[test]
    fn test_update_only_on_change() {
        let dir = tree();
        let ctx = VariableContext::with_root(dir.path());
        let globs = vec!["build/a".to_string()];
        let mut cache = resolved(&["build/a"], &ctx);
        assert!(!cache.update(&globs, &ctx).unwrap());
        assert!(cache.update(&["build/b".to_string()], &ctx).unwrap());
        assert_eq!(cache.globs(), &["build/b".to_string()]);
        assert!(cache.paths()[0].ends_with("build/b"));
    }

    #[test]
    fn test_invalid_glob() {
        let ctx = VariableContext::default();
        assert!(GlobPaths::default().update(&["[".to_string()], &ctx).is_err());
    }

    #[test]
    fn test_empty() {
        let mut cache = GlobPaths::default();
        assert!(!cache.update(&[], &VariableContext::default()).unwrap());
        assert!(cache.paths().is_empty());
    }
}
