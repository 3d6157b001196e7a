//! Lint pipeline
//!
//! Runs the configured compiler (optionally behind fypp) on one document and
//! turns its output into a deduplicated diagnostic batch:
//! - Resolve settings once per configuration
//! - Build the command line and spawn the tool(s)
//! - Extract diagnostics with the document as line source
//! - Remove duplicates, keeping first-occurrence order

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, info, warn};

use super::globs::{GlobPaths, IncludeCache};
use super::invoke::{
    compiler_arguments, fypp_arguments, gfortran_version, locate, run_tool, MODERN_GNU,
};
use super::variables::{resolve_variables, VariableContext};
use crate::config::{Config, GnuDiagnostics};
use crate::diagnostic::{dedup, Diagnostic};
use crate::error::LintError;
use crate::extract::{extract_each, LineLookup};
use crate::grammar::{Compiler, Grammar};
use crate::source::SourceDocument;
use crate::Result;

/// Pick the grammar for `config`. gfortran in `auto` mode asks `program` for
/// its version; with no program to ask the legacy grammar is used.
#[must_use]
pub fn select_grammar(config: &Config, program: Option<&Path>) -> &'static Grammar {
    let modern = match config.gnu_diagnostics {
        GnuDiagnostics::Modern => true,
        GnuDiagnostics::Legacy => false,
        GnuDiagnostics::Auto => {
            config.compiler == Compiler::Gfortran
                && program
                    .and_then(gfortran_version)
                    .is_some_and(|v| v >= MODERN_GNU)
        }
    };
    debug!("[lint] using modern GNU Fortran diagnostics: {modern}");
    config.compiler.grammar(modern)
}

/// Default module output directory under the system temp dir.
#[must_use]
pub fn default_mod_output() -> PathBuf {
    std::env::temp_dir().join("flinter").join("modules")
}

/// Module output directory for `config`; relative paths are anchored at the
/// first workspace root.
#[must_use]
pub fn resolve_mod_output(config: &Config, variables: &VariableContext) -> PathBuf {
    if config.mod_output.is_empty() {
        return default_mod_output();
    }
    let dir = PathBuf::from(resolve_variables(&config.mod_output, variables));
    match variables.root() {
        Some(root) if dir.is_relative() => root.join(dir),
        _ => dir,
    }
}

/// Everything needed to lint documents under one configuration.
#[derive(Debug)]
pub struct LintSettings {
    pub config: Config,
    pub grammar: &'static Grammar,
    /// Resolved compiler executable
    pub compiler: PathBuf,
    pub variables: VariableContext,
    pub include_dirs: GlobPaths,
    /// Resolved fypp executable when preprocessing is on
    pub fypp: Option<PathBuf>,
    pub fypp_include_dirs: GlobPaths,
    pub mod_output: PathBuf,
}

impl LintSettings {
    /// Resolve executables, include globs and the module directory for
    /// `config`, with `workspace_root` as `${workspaceFolder}`.
    ///
    /// Include globs are only re-walked when `includes` last saw a different
    /// pattern list.
    pub fn new(config: Config, workspace_root: &Path, includes: &mut IncludeCache) -> Result<Self> {
        let variables = VariableContext::with_root(workspace_root);

        let program = match &config.compiler_path {
            Some(path) => resolve_variables(path, &variables),
            None => config.compiler.executable().to_string(),
        };
        let compiler = locate(&program)?;
        debug!(
            "[build.single] compiler: \"{}\" located in: \"{}\"",
            config.compiler,
            compiler.display()
        );
        let grammar = select_grammar(&config, Some(&compiler));

        let fypp = if config.fypp_active() {
            Some(locate(&resolve_variables(&config.fypp_path, &variables))?)
        } else {
            None
        };

        includes.compiler.update(&config.include_paths, &variables)?;
        let include_dirs = includes.compiler.clone();
        debug!("[lint] glob paths: {:?}", include_dirs.globs());
        debug!("[lint] resolved paths: {:?}", include_dirs.paths());
        includes.fypp.update(&config.fypp_includes, &variables)?;
        let fypp_include_dirs = includes.fypp.clone();

        let mod_output = resolve_mod_output(&config, &variables);
        std::fs::create_dir_all(&mod_output).with_context(|| {
            format!("cannot create module output directory {}", mod_output.display())
        })?;
        debug!(
            "[lint] moduleOutput: {} {}",
            grammar.module_output_flag,
            mod_output.display()
        );

        Ok(Self {
            config,
            grammar,
            compiler,
            variables,
            include_dirs,
            fypp,
            fypp_include_dirs,
            mod_output,
        })
    }

    /// Compiler command line for `document`.
    #[must_use]
    pub fn arguments(&self, document: &SourceDocument) -> Vec<String> {
        compiler_arguments(
            self.grammar,
            &self.config,
            &self.variables.for_file(document.path()),
            self.include_dirs.paths(),
            Some(&self.mod_output),
            document,
            self.fypp.is_some(),
        )
    }
}

/// Lint one document: run the compiler and extract its diagnostics.
pub fn lint_document(settings: &LintSettings, document: &SourceDocument) -> Result<Vec<Diagnostic>> {
    let cwd = match document.path().parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let input = match &settings.fypp {
        Some(fypp) => {
            let args = fypp_arguments(
                &settings.config,
                settings.fypp_include_dirs.paths(),
                document,
            );
            let output = run_tool(fypp, &args, cwd, None)?;
            if !output.success {
                return Err(LintError::Preprocessor {
                    file: document.path().to_path_buf(),
                    message: output.stderr.trim().to_string(),
                }
                .into());
            }
            Some(output.stdout.into_bytes())
        }
        None => None,
    };

    let args = settings.arguments(document);
    info!(
        "[build.single] compiler query command line: {} {}",
        settings.compiler.display(),
        args.join(" ")
    );
    let output = run_tool(&settings.compiler, &args, cwd, input)?.combined();
    debug!("[build.single] compiler output:\n{output}");

    Ok(lint_output(settings.grammar, &output, document))
}

/// Turn captured compiler output for `document` into a diagnostic batch.
///
/// Empty output means a clean compile. Messages whose position cannot be
/// resolved against `document` are logged and dropped; the rest are kept.
#[must_use]
pub fn lint_output(
    grammar: &Grammar,
    output: &str,
    document: &SourceDocument,
) -> Vec<Diagnostic> {
    if output.trim().is_empty() {
        debug!("[lint] no linting diagnostics for {}", document.path().display());
        return Vec::new();
    }
    let diagnostics = extract_each(grammar, output, Some(document as &dyn LineLookup))
        .filter_map(|diagnostic| match diagnostic {
            Ok(diagnostic) => Some(diagnostic),
            // already reported by the grammar
            Err(LintError::MalformedGroupState { .. }) => None,
            Err(e) => {
                warn!("[lint] {}: skipping message: {e}", document.path().display());
                None
            }
        })
        .collect();
    let diagnostics = dedup(diagnostics);
    debug!(
        "[lint] {} diagnostics for {} after removing duplicates",
        diagnostics.len(),
        document.path().display()
    );
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Position, Range, Severity};
    use crate::grammar::{GNU, NAG};

    #[test]
    fn test_lint_output_empty_is_clean() {
        let doc = SourceDocument::from_text(Path::new("a.f90"), "end\n");
        assert!(lint_output(&GNU, "", &doc).is_empty());
        assert!(lint_output(&GNU, "  \n", &doc).is_empty());
    }

    #[test]
    fn test_lint_output_dedups() {
        let doc = SourceDocument::from_text(Path::new("a.f90"), "end\n");
        let output = "a.f90:2:10:\n\n   2 | x\n     |   1\nError: bad\n\
                      a.f90:2:10:\n\n   2 | x\n     |   1\nError: bad\n";
        let diags = lint_output(&GNU, output, &doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].range,
            Range::point(Position::new(1, 10))
        );
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn test_lint_output_uses_document_lines() {
        let doc = SourceDocument::from_text(
            Path::new("t.f90"),
            "program t\n  integer :: i\n  i = 1.0\nend\n",
        );
        let output = "Warning: t.f90, line 3: Change of value in conversion from REAL to INTEGER\n";
        let diags = lint_output(&NAG, output, &doc);
        assert_eq!(
            diags[0].range,
            Range::new(Position::new(2, 0), Position::new(2, 9))
        );
        assert_eq!(diags[0].severity, Severity::Warning);
    }

    #[test]
    fn test_select_grammar_forced() {
        let config = Config {
            gnu_diagnostics: GnuDiagnostics::Modern,
            ..Default::default()
        };
        assert_eq!(select_grammar(&config, None).mandatory_args.len(), 3);
        let config = Config::default();
        // no program to ask for a version
        assert_eq!(select_grammar(&config, None).mandatory_args.len(), 2);
        let config = Config {
            compiler: Compiler::Nagfor,
            ..Default::default()
        };
        assert_eq!(select_grammar(&config, None).name, "nagfor");
    }

    #[test]
    fn test_mod_output_resolution() {
        let ctx = VariableContext::with_root(Path::new("/proj"));
        assert_eq!(resolve_mod_output(&Config::default(), &ctx), default_mod_output());
        let config = Config {
            mod_output: "build/mod".to_string(),
            ..Default::default()
        };
        assert_eq!(resolve_mod_output(&config, &ctx), PathBuf::from("/proj/build/mod"));
        let config = Config {
            mod_output: "${workspaceFolder}/out".to_string(),
            ..Default::default()
        };
        assert_eq!(resolve_mod_output(&config, &ctx), PathBuf::from("/proj/out"));
    }

    #[test]
    fn test_settings_missing_compiler() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            compiler_path: Some("flinter-missing-compiler".to_string()),
            ..Default::default()
        };
        let err = LintSettings::new(config, dir.path(), &mut IncludeCache::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LintError>(),
            Some(LintError::ToolNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_settings_share_include_globs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("inc")).unwrap();
        let config = Config {
            compiler_path: Some("sh".to_string()),
            gnu_diagnostics: GnuDiagnostics::Modern,
            include_paths: vec!["inc".to_string()],
            mod_output: "mods".to_string(),
            ..Default::default()
        };
        let mut includes = IncludeCache::default();
        let first = LintSettings::new(config.clone(), dir.path(), &mut includes).unwrap();
        assert!(first.include_dirs.paths()[0].ends_with("inc"));

        // same patterns: the cached directories are reused without globbing
        std::fs::remove_dir(dir.path().join("inc")).unwrap();
        let second = LintSettings::new(config.clone(), dir.path(), &mut includes).unwrap();
        assert_eq!(second.include_dirs.paths(), first.include_dirs.paths());

        let config = Config {
            include_paths: vec!["inc/*".to_string()],
            ..config
        };
        let third = LintSettings::new(config, dir.path(), &mut includes).unwrap();
        assert!(third.include_dirs.paths().is_empty());
    }
}
