//! Compiler and fypp command lines, and running them.
//!
//! Compilers report problems through a non-zero exit status, so the status of
//! the compiler run is never treated as a failure; only failing to spawn is.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info, warn};
use semver::Version;

use super::variables::{resolve_variables, VariableContext};
use crate::config::Config;
use crate::error::LintError;
use crate::grammar::patterns::GNU_VERSION_RE;
use crate::grammar::{Family, Grammar};
use crate::source::SourceDocument;

/// First gfortran release with `-fdiagnostics-plain-output`.
pub const MODERN_GNU: Version = Version::new(11, 0, 0);

/// Captured output of a finished tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// stdout followed by stderr.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }
}

/// Find an executable by name or path.
pub fn locate(tool: &str) -> Result<PathBuf, LintError> {
    which::which(tool).map_err(|_| LintError::ToolNotFound {
        tool: tool.to_string(),
    })
}

/// Query `gfortran --version`. `None` when the tool cannot run or the banner
/// carries no semantic version.
#[must_use]
pub fn gfortran_version(program: &Path) -> Option<Version> {
    let output = match Command::new(program).arg("--version").output() {
        Ok(output) => output,
        Err(e) => {
            warn!("[lint] could not spawn {} to check version: {e}", program.display());
            return None;
        }
    };
    let banner = String::from_utf8_lossy(&output.stdout);
    let caps = GNU_VERSION_RE.captures(&banner)?;
    match Version::parse(&caps["version"]) {
        Ok(version) => {
            info!("[lint] found GNU Fortran version {version}");
            Some(version)
        }
        Err(_) => {
            warn!("[lint] unable to extract a version from {:?}", &caps["msg"]);
            None
        }
    }
}

/// Arguments that stand in for the grammar defaults: the user's extra args if
/// any, with gfortran line-length limits in front so user flags win.
#[must_use]
pub fn extra_arguments(grammar: &Grammar, config: &Config, context: &VariableContext) -> Vec<String> {
    let mut args: Vec<String> = if config.extra_args.is_empty() {
        grammar.default_args.iter().map(|a| (*a).to_string()).collect()
    } else {
        config.extra_args.clone()
    };
    if matches!(grammar.family, Family::GnuLegacy | Family::GnuModern) {
        let length = if config.max_line_length == -1 {
            "none".to_string()
        } else {
            config.max_line_length.to_string()
        };
        args.splice(
            0..0,
            [
                format!("-ffree-line-length-{length}"),
                format!("-ffixed-line-length-{length}"),
            ],
        );
    }
    args.iter().map(|a| resolve_variables(a, context)).collect()
}

/// Full compiler command line for `document`.
///
/// `from_stdin` replaces the file operand with `-xf95 -` so preprocessed text
/// can be piped in.
#[must_use]
pub fn compiler_arguments(
    grammar: &Grammar,
    config: &Config,
    context: &VariableContext,
    include_dirs: &[PathBuf],
    mod_output: Option<&Path>,
    document: &SourceDocument,
    from_stdin: bool,
) -> Vec<String> {
    let file = document.path().display().to_string();
    let mut args: Vec<String> = grammar.mandatory_args.iter().map(|a| (*a).to_string()).collect();
    args.extend(extra_arguments(grammar, config, context));
    if let Some(dir) = mod_output {
        args.push(grammar.module_output_flag.to_string());
        args.push(dir.display().to_string());
    }
    args.extend(include_dirs.iter().map(|dir| format!("-I{}", dir.display())));
    args.push(
        if document.is_free_form() {
            grammar.free_form_flag
        } else {
            grammar.fixed_form_flag
        }
        .to_string(),
    );
    args.push("-o".to_string());
    args.push(format!("{file}.o"));
    if from_stdin {
        args.push("-xf95".to_string());
        args.push("-".to_string());
    } else {
        args.push(file);
    }

    args.into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

/// fypp command line for `document`.
#[must_use]
pub fn fypp_arguments(
    config: &Config,
    include_dirs: &[PathBuf],
    document: &SourceDocument,
) -> Vec<String> {
    let mut args = vec!["--line-numbering".to_string()];
    args.extend(include_dirs.iter().map(|dir| format!("-I{}", dir.display())));
    if !document.is_free_form() {
        args.push("--fixed-format".to_string());
    }
    let mut definitions: Vec<_> = config.fypp_definitions.iter().collect();
    definitions.sort();
    for (key, value) in definitions {
        if value.is_empty() {
            args.push(format!("-D{key}"));
        } else {
            args.push(format!("-D{key}={value}"));
        }
    }
    args.push(format!(
        "--line-numbering-mode={}",
        config.fypp_line_numbering_mode
    ));
    args.push(format!(
        "--line-marker-format={}",
        config.fypp_line_marker_format
    ));
    args.extend(config.fypp_extra_args.iter().cloned());
    args.push(document.path().display().to_string());
    args
}

/// Run `program` in `cwd` with the C locale, optionally feeding `input` on
/// stdin, and capture both output streams.
pub fn run_tool(
    program: &Path,
    args: &[String],
    cwd: &Path,
    input: Option<Vec<u8>>,
) -> Result<ToolOutput, LintError> {
    let tool = program.display().to_string();
    let spawn_error = |source| LintError::Spawn {
        tool: tool.clone(),
        source,
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        // Keep messages in English so the grammars match
        .env("LC_ALL", "C")
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(windows)]
    prepend_tool_dir(&mut command, program);

    debug!("[build.single] {} {}", tool, args.join(" "));
    let mut child = command.spawn().map_err(spawn_error)?;

    // Feed stdin from a separate thread so a chatty child cannot deadlock us
    let writer = match (input, child.stdin.take()) {
        (Some(bytes), Some(mut stdin)) => {
            Some(std::thread::spawn(move || stdin.write_all(&bytes)))
        }
        _ => None,
    };
    let output = child.wait_with_output().map_err(spawn_error)?;
    if let Some(writer) = writer {
        // A compiler that bails out early closes its stdin; not our problem
        if let Ok(Err(e)) = writer.join() {
            debug!("[build.single] stdin of {tool} closed early: {e}");
        }
    }

    Ok(ToolOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Windows compilers locate their helper tools through `PATH`.
#[cfg(windows)]
fn prepend_tool_dir(command: &mut Command, program: &Path) {
    let Some(dir) = program.parent() else {
        return;
    };
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut paths: Vec<PathBuf> = std::env::split_paths(&current).collect();
    if paths.iter().any(|p| p == dir) {
        return;
    }
    paths.insert(0, dir.to_path_buf());
    if let Ok(joined) = std::env::join_paths(paths) {
        command.env("PATH", joined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GNU, GNU_MODERN, INTEL, LFORTRAN, NAG};

    fn doc(name: &str) -> SourceDocument {
        SourceDocument::from_text(Path::new(name), "program p\nend program\n")
    }

    #[test]
    fn test_gfortran_arguments_order() {
        let config = Config::default();
        let ctx = VariableContext::default();
        let args = compiler_arguments(
            &GNU,
            &config,
            &ctx,
            &[PathBuf::from("/inc/a")],
            Some(Path::new("/tmp/mods")),
            &doc("/src/main.f90"),
            false,
        );
        assert_eq!(
            args,
            vec![
                "-fsyntax-only",
                "-cpp",
                "-ffree-line-length-none",
                "-ffixed-line-length-none",
                "-Wall",
                "-J",
                "/tmp/mods",
                "-I/inc/a",
                "-ffree-form",
                "-o",
                "/src/main.f90.o",
                "/src/main.f90",
            ]
        );
    }

    #[test]
    fn test_modern_gfortran_mandatory_args() {
        let args = compiler_arguments(
            &GNU_MODERN,
            &Config::default(),
            &VariableContext::default(),
            &[],
            None,
            &doc("a.f90"),
            false,
        );
        assert!(args.contains(&"-fdiagnostics-plain-output".to_string()));
        assert!(!args.contains(&"-J".to_string()));
    }

    #[test]
    fn test_extra_args_replace_defaults() {
        let config = Config {
            extra_args: vec!["-Wextra".to_string(), "  ".to_string()],
            max_line_length: 132,
            ..Default::default()
        };
        let args = compiler_arguments(
            &GNU,
            &config,
            &VariableContext::default(),
            &[],
            None,
            &doc("legacy.f"),
            false,
        );
        assert!(!args.contains(&"-Wall".to_string()));
        assert!(args.contains(&"-Wextra".to_string()));
        assert!(args.contains(&"-ffree-line-length-132".to_string()));
        assert!(args.contains(&"-ffixed-form".to_string()));
        // blank extra arg dropped
        assert!(args.iter().all(|a| !a.is_empty()));
    }

    #[test]
    fn test_intel_and_nag_flags() {
        let ctx = VariableContext::default();
        let config = Config::default();
        let intel = compiler_arguments(&INTEL, &config, &ctx, &[], Some(Path::new("m")), &doc("x.f"), false);
        assert_eq!(&intel[..4], &["-syntax-only", "-fpp", "-warn", "all"]);
        assert!(intel.contains(&"-module".to_string()));
        assert!(intel.contains(&"-fixed".to_string()));
        assert!(!intel.iter().any(|a| a.starts_with("-ffree-line-length")));

        let nag = compiler_arguments(&NAG, &config, &ctx, &[], Some(Path::new("m")), &doc("x.f90"), false);
        assert_eq!(&nag[..4], &["-M", "-quiet", "-mdir", "m"]);
        assert!(nag.contains(&"-free".to_string()));
    }

    #[test]
    fn test_lfortran_free_form_flag_is_dropped() {
        let args = compiler_arguments(
            &LFORTRAN,
            &Config::default(),
            &VariableContext::default(),
            &[],
            None,
            &doc("x.f90"),
            false,
        );
        assert_eq!(args, vec!["--error-format=short", "-o", "x.f90.o", "x.f90"]);
    }

    #[test]
    fn test_stdin_operand() {
        let args = compiler_arguments(
            &GNU,
            &Config::default(),
            &VariableContext::default(),
            &[],
            None,
            &doc("x.fpp"),
            true,
        );
        assert_eq!(&args[args.len() - 2..], &["-xf95", "-"]);
    }

    #[test]
    fn test_extra_args_resolve_variables() {
        let config = Config {
            extra_args: vec!["-I${workspaceFolder}/include".to_string()],
            ..Default::default()
        };
        let ctx = VariableContext::with_root(Path::new("/proj"));
        let args = extra_arguments(&INTEL, &config, &ctx);
        assert_eq!(args, vec!["-I/proj/include"]);
    }

    #[test]
    fn test_fypp_arguments() {
        let mut config = Config::default();
        config.fypp_definitions.insert("DEBUG".to_string(), String::new());
        config.fypp_definitions.insert("N".to_string(), "3".to_string());
        config.fypp_extra_args = vec!["--no-folding".to_string()];
        let args = fypp_arguments(&config, &[PathBuf::from("/inc")], &doc("/src/old.f"));
        assert_eq!(
            args,
            vec![
                "--line-numbering",
                "-I/inc",
                "--fixed-format",
                "-DDEBUG",
                "-DN=3",
                "--line-numbering-mode=nocontlines",
                "--line-marker-format=cpp",
                "--no-folding",
                "/src/old.f",
            ]
        );
    }

    #[test]
    fn test_locate_missing_tool() {
        let err = locate("flinter-no-such-compiler").unwrap_err();
        assert!(matches!(err, LintError::ToolNotFound { .. }));
    }

    #[test]
    fn test_modern_threshold() {
        assert!(Version::new(11, 4, 0) >= MODERN_GNU);
        assert!(Version::new(10, 5, 0) < MODERN_GNU);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_tool_captures_both_streams() {
        let sh = locate("sh").unwrap();
        let out = run_tool(
            &sh,
            &["-c".to_string(), "cat; echo oops >&2; exit 1".to_string()],
            Path::new("."),
            Some(b"hello\n".to_vec()),
        )
        .unwrap();
        assert!(!out.success);
        assert_eq!(out.combined(), "hello\noops\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_tool_sets_c_locale() {
        let sh = locate("sh").unwrap();
        let out = run_tool(
            &sh,
            &["-c".to_string(), "printf %s \"$LC_ALL\"".to_string()],
            Path::new("."),
            None,
        )
        .unwrap();
        assert_eq!(out.stdout, "C");
    }
}
