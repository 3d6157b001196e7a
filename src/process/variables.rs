//! `${...}` variable substitution for configured paths and arguments.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::dirs_home;

/// Upper bound on substitution rounds for self-growing definitions.
const MAX_ROUNDS: usize = 64;

static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$\{(?:(?<kind>env|config|workspaceFolder|file|fileDirname|fileBasenameNoExtension)[.:])?(?<name>[^}]*)\}",
    )
    .unwrap_or_else(|e| panic!("invalid variable pattern: {e}"))
});

/// Values available to variable substitution.
#[derive(Debug, Clone, Default)]
pub struct VariableContext {
    /// Named workspace roots; the first one is the default `${workspaceFolder}`
    pub workspace_folders: Vec<(String, PathBuf)>,
    /// Document being linted, for the `${file*}` family
    pub file: Option<PathBuf>,
}

impl VariableContext {
    /// Context with a single workspace root named after its last component.
    #[must_use]
    pub fn with_root(root: &Path) -> Self {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            workspace_folders: vec![(name, root.to_path_buf())],
            file: None,
        }
    }

    /// Same context, bound to a document.
    #[must_use]
    pub fn for_file(&self, file: &Path) -> Self {
        Self {
            workspace_folders: self.workspace_folders.clone(),
            file: Some(file.to_path_buf()),
        }
    }

    /// First workspace root, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.workspace_folders.first().map(|(_, p)| p.as_path())
    }

    fn workspace_folder(&self, name: &str) -> Option<String> {
        self.workspace_folders
            .iter()
            .find(|(folder, _)| folder.eq_ignore_ascii_case(name))
            .or_else(|| self.workspace_folders.first())
            .map(|(_, p)| p.display().to_string())
    }

    fn file_variable(&self, kind: &str) -> Option<String> {
        let file = self.file.as_deref()?;
        match kind {
            "file" => Some(file.display().to_string()),
            "fileDirname" => file.parent().map(|p| p.display().to_string()),
            "fileBasenameNoExtension" => {
                file.file_stem().map(|s| s.to_string_lossy().into_owned())
            }
            _ => None,
        }
    }

    fn lookup(&self, caps: &Captures<'_>) -> Option<String> {
        let name = caps.name("name").map_or("", |m| m.as_str());
        match caps.name("kind").map(|m| m.as_str()) {
            Some("env") => std::env::var(name).ok(),
            Some("workspaceFolder") => self.workspace_folder(name),
            Some(kind @ ("file" | "fileDirname" | "fileBasenameNoExtension")) => {
                // `${file:x}` is not a thing; only the bare forms resolve
                if name.is_empty() {
                    self.file_variable(kind)
                } else {
                    None
                }
            }
            // Bare `${name}`: builtin names only
            None => match name {
                "workspaceFolder" => self.workspace_folder(""),
                "file" | "fileDirname" | "fileBasenameNoExtension" => self.file_variable(name),
                _ => None,
            },
            // `config` has no backing store outside an editor
            Some(_) => None,
        }
    }
}

/// Substitute variables in `input` until nothing changes, then expand a
/// leading `~` to the home directory. Unresolvable variables are kept
/// verbatim.
#[must_use]
pub fn resolve_variables(input: &str, context: &VariableContext) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut resolved = input.to_string();
    let mut seen: HashSet<String> = HashSet::new();
    while seen.len() < MAX_ROUNDS && seen.insert(resolved.clone()) {
        resolved = VARIABLE_RE
            .replace_all(&resolved, |caps: &Captures<'_>| {
                context
                    .lookup(caps)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
    }

    if let Some(rest) = resolved.strip_prefix('~') {
        if let Some(home) = dirs_home() {
            return format!("{}{rest}", home.display());
        }
    }
    resolved
}
