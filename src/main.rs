//! flinter - Fortran linter driven by real compilers

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};

use flinter::process::{
    clean, resolve_mod_output, select_grammar, IncludeCache, VariableContext,
};
use flinter::source::is_fortran_file;
use flinter::{
    lint_document, lint_output, parse_args, CliArgs, Config, Diagnostic, DiagnosticCollection,
    LintSettings, OutputFormat, Result, Severity, SourceDocument,
};
use glob::Pattern;
use log::{debug, error, warn};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

/// Exit status when at least one document could not be linted
const EXIT_LINT_FAILURE: u8 = 2;

fn main() -> Result<ExitCode> {
    // Parse CLI arguments
    let args = parse_args();
    init_logging(&args);

    if args.inputs.is_empty() && !args.clean {
        if io::stdin().is_terminal() {
            print_usage();
        }
        return Ok(ExitCode::SUCCESS);
    }

    // Configure thread pool if --jobs specified
    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                warn!("failed to configure thread pool: {e}");
            }
        }
    }

    let workspace_root = std::env::current_dir()?;

    if args.clean {
        let config = build_config(&args, None)?;
        let dir = resolve_mod_output(&config, &VariableContext::with_root(&workspace_root));
        let removed = clean(&dir)?;
        if !args.silent {
            eprintln!("Removed {removed} build artifacts from {}.", dir.display());
        }
        if args.inputs.is_empty() {
            return Ok(ExitCode::SUCCESS);
        }
    }

    if let Some(transcript) = &args.from_output {
        return match lint_transcript(&args, transcript) {
            Ok(collection) => report(&args, &collection, 0),
            Err(e) => {
                error!("{}: {e:#}", transcript.display());
                report(&args, &DiagnosticCollection::new(), 1)
            }
        };
    }

    // Collect all files to process
    let files = collect_files(&args);
    if files.is_empty() {
        if !args.silent {
            eprintln!("No Fortran files found to lint.");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let groups = resolve_settings(&args, &files, &workspace_root)?;
    let failures = AtomicUsize::new(0);
    let failed = &failures;

    let results: Vec<(PathBuf, Vec<Diagnostic>)> = groups
        .par_iter()
        .flat_map(|(settings, files)| {
            files.par_iter().filter_map(move |path| {
                match lint_file(settings, path) {
                    Ok(diagnostics) => Some((path.clone(), diagnostics)),
                    Err(e) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        error!("[lint] {}: {e:#}", path.display());
                        None
                    }
                }
            })
        })
        .collect();

    let mut collection = DiagnosticCollection::new();
    for (path, diagnostics) in results {
        collection.set(path, diagnostics);
    }

    report(&args, &collection, failures.load(Ordering::Relaxed))
}

/// Route `log` output to stderr; `--debug` raises the default level and
/// `RUST_LOG` overrides both.
fn init_logging(args: &CliArgs) {
    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Build configuration from CLI args and optional config file
///
/// If `for_path` is provided and no explicit config file is specified,
/// uses auto-discovery to find config files in parent directories.
fn build_config(args: &CliArgs, for_path: Option<&Path>) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        debug!("using explicit config file: {}", config_path.display());
        Config::from_toml_file(config_path)?
    } else {
        let start = match for_path {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let discovered = Config::discover_config_files(&start);
        if discovered.is_empty() {
            debug!("no config files discovered for: {}", start.display());
        }
        for f in &discovered {
            debug!("discovered config file: {}", f.display());
        }
        Config::from_discovered_files(&start)
    };

    // Override with CLI arguments
    if let Some(compiler) = args.compiler {
        config.compiler = compiler;
    }
    if let Some(path) = &args.compiler_path {
        config.compiler_path = Some(path.clone());
    }
    config.include_paths.extend(args.include_paths.iter().cloned());
    if !args.extra_args.is_empty() {
        config.extra_args.clone_from(&args.extra_args);
    }
    if let Some(dir) = &args.mod_output {
        config.mod_output.clone_from(dir);
    }
    if let Some(length) = args.max_line_length {
        config.max_line_length = length;
    }
    if let Some(mode) = args.gnu_diagnostics {
        config.gnu_diagnostics = mode;
    }
    if args.fypp {
        config.fypp_enabled = true;
    }

    debug!("configuration: {config:?}");

    // Validate configuration
    if let Some(error) = config.validate() {
        anyhow::bail!("Invalid configuration: {error}");
    }

    Ok(config)
}

/// Resolve one set of lint settings per distinct configuration and group the
/// files that share it.
fn resolve_settings(
    args: &CliArgs,
    files: &[PathBuf],
    workspace_root: &Path,
) -> Result<Vec<(LintSettings, Vec<PathBuf>)>> {
    let mut by_config: BTreeMap<Vec<PathBuf>, Vec<PathBuf>> = BTreeMap::new();
    for path in files {
        let key = if args.config.is_some() {
            Vec::new()
        } else {
            Config::discover_config_files(path)
        };
        by_config.entry(key).or_default().push(path.clone());
    }

    let mut includes = IncludeCache::default();
    let mut groups = Vec::with_capacity(by_config.len());
    for files in by_config.into_values() {
        let config = build_config(args, Some(&files[0]))?;
        if !config.enabled() {
            debug!("[lint] linting disabled for {} files", files.len());
            continue;
        }
        groups.push((LintSettings::new(config, workspace_root, &mut includes)?, files));
    }
    Ok(groups)
}

fn lint_file(settings: &LintSettings, path: &Path) -> Result<Vec<Diagnostic>> {
    let document = SourceDocument::open(path)?;
    lint_document(settings, &document)
}

/// Parse a saved compiler transcript against the single input document.
fn lint_transcript(args: &CliArgs, transcript: &Path) -> Result<DiagnosticCollection> {
    let [input] = args.inputs.as_slice() else {
        anyhow::bail!("--from-output needs exactly one source file");
    };
    let config = build_config(args, Some(input))?;
    let program = config
        .compiler_path
        .clone()
        .unwrap_or_else(|| config.compiler.executable().to_string());
    let program = which::which(program).ok();
    let grammar = select_grammar(&config, program.as_deref());

    let output = std::fs::read_to_string(transcript)?;
    let document = SourceDocument::open(input)?;
    let diagnostics = lint_output(grammar, &output, &document);

    let mut collection = DiagnosticCollection::new();
    collection.set(input.clone(), diagnostics);
    Ok(collection)
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    diagnostics: &'a [Diagnostic],
}

/// Print the collection and turn it into an exit status.
fn report(args: &CliArgs, collection: &DiagnosticCollection, failures: usize) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => {
            for (path, diagnostics) in collection.iter() {
                for d in diagnostics {
                    writeln!(
                        out,
                        "{}:{}:{}: {}: {}",
                        path.display(),
                        d.range.start.line + 1,
                        d.range.start.column + 1,
                        d.severity,
                        d.message
                    )?;
                }
            }
        }
        OutputFormat::Json => {
            let reports: Vec<FileReport<'_>> = collection
                .iter()
                .map(|(file, diagnostics)| FileReport { file, diagnostics })
                .collect();
            serde_json::to_writer_pretty(&mut out, &reports)?;
            writeln!(out)?;
        }
    }

    let errors = collection.count(Severity::Error);
    if !args.silent {
        let warnings = collection.count(Severity::Warning);
        if failures == 0 {
            eprintln!("{errors} errors, {warnings} warnings.");
        } else {
            eprintln!("{errors} errors, {warnings} warnings, {failures} files failed to lint.");
        }
    }

    Ok(if failures > 0 {
        ExitCode::from(EXIT_LINT_FAILURE)
    } else if errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Collect all files to process, handling directories and recursive flag
fn collect_files(args: &CliArgs) -> Vec<PathBuf> {
    // Compile exclude patterns
    let exclude_patterns: Vec<Pattern> = args
        .exclude
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();
    let custom_extensions = &args.fortran_extensions;
    let wanted = |path: &Path| {
        path.is_file()
            && is_fortran_file(path, custom_extensions)
            && !is_excluded(path, &exclude_patterns)
    };

    let mut files = Vec::new();
    for input in &args.inputs {
        if input.is_file() {
            // Explicit files are linted whatever their extension
            if !is_excluded(input, &exclude_patterns) {
                files.push(input.clone());
            }
        } else if input.is_dir() {
            let depth = if args.recursive { 256 } else { 1 };
            // WalkDir reports symlink loops as errors, which are skipped
            for entry in WalkDir::new(input)
                .follow_links(true)
                .max_depth(depth)
                .into_iter()
                .filter_map(std::result::Result::ok)
            {
                if wanted(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            warn!("{}: no such file or directory", input.display());
        }
    }

    files.sort();
    files.dedup();
    files
}

/// Check if a path matches any exclusion pattern
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();
    patterns.iter().any(|pattern| {
        // Full path, then each component (covers file and directory names)
        pattern.matches(&path_str)
            || path.components().any(|component| match component {
                std::path::Component::Normal(c) => pattern.matches(&c.to_string_lossy()),
                _ => false,
            })
    })
}

fn print_usage() {
    println!(
        "flinter v{} - Fortran linter driven by real compilers",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("Usage:");
    println!("  flinter [OPTIONS] <FILE>...");
    println!("  flinter [OPTIONS] -r <DIRECTORY>");
    println!("  flinter [OPTIONS] --from-output <LOG> <FILE>");
    println!();
    println!("Examples:");
    println!("  flinter src/solver.f90                    # Lint with gfortran");
    println!("  flinter -c nagfor -r src/                 # Lint a tree with nagfor");
    println!("  flinter -I 'build/**' -a -Wextra a.f90    # Custom includes and flags");
    println!("  flinter --format json -r src/             # Machine-readable output");
    println!("  flinter -c ifx --from-output build.log a.f90");
    println!();
    println!("Run `flinter --help` for all options.");
    println!();
    println!("Config file auto-discovery:");
    println!("  Searches for flinter.toml in parent directories");
    println!("  starting from the file being linted up to the root directory.");
    println!("  Also checks flinter.toml in the home directory.");
    println!("  More specific configs (closer to file) override less specific ones.");
}
