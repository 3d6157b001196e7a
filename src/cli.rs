//! Command-line interface for flinter.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Arg, ArgAction, Command};

use crate::config::GnuDiagnostics;
use crate::grammar::Compiler;

/// How diagnostics are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `path:line:col: severity: message`
    #[default]
    Text,
    /// One JSON array of `{ file, diagnostics }` objects
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format '{s}' (expected text or json)")),
        }
    }
}

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to lint
    pub inputs: Vec<PathBuf>,

    /// Compiler used for linting
    pub compiler: Option<Compiler>,

    /// Explicit compiler executable
    pub compiler_path: Option<String>,

    /// Include directory globs (added to configured ones)
    pub include_paths: Vec<String>,

    /// Extra compiler arguments (replace configured ones)
    pub extra_args: Vec<String>,

    /// Module output directory
    pub mod_output: Option<String>,

    /// gfortran line length limit (-1 = none)
    pub max_line_length: Option<i64>,

    /// gfortran diagnostics grammar
    pub gnu_diagnostics: Option<GnuDiagnostics>,

    /// Preprocess with fypp
    pub fypp: bool,

    /// Recursive directory processing
    pub recursive: bool,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Custom Fortran file extensions (in addition to defaults)
    pub fortran_extensions: Vec<String>,

    /// Config file path
    pub config: Option<PathBuf>,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    pub jobs: Option<usize>,

    /// Output format
    pub format: OutputFormat,

    /// Saved compiler output to parse instead of running the compiler
    pub from_output: Option<PathBuf>,

    /// Remove build artifacts from the module output directory
    pub clean: bool,

    /// Enable debug output
    pub debug: bool,

    /// Silent mode (no summary)
    pub silent: bool,
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("flinter")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lint Fortran sources with gfortran, ifort/ifx, nagfor or lfortran")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to lint")
                .value_name("FILE")
                .num_args(1..)
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("compiler")
                .short('c')
                .long("compiler")
                .help("Compiler: gfortran, ifort, ifx, nagfor, lfortran or disabled [default: gfortran]")
                .value_name("NAME")
                .value_parser(clap::value_parser!(Compiler)),
        )
        .arg(
            Arg::new("compiler-path")
                .long("compiler-path")
                .help("Compiler executable (default: looked up on PATH)")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("include")
                .short('I')
                .long("include")
                .help("Include directory glob, resolved to directories (can be repeated)")
                .value_name("GLOB")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("extra-arg")
                .short('a')
                .long("extra-arg")
                .help("Extra compiler argument, replaces the compiler defaults (can be repeated, e.g., -a=-Wextra)")
                .value_name("ARG")
                .allow_hyphen_values(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("mod-output")
                .long("mod-output")
                .help("Directory for .mod/.smod files [default: temporary cache]")
                .value_name("DIR"),
        )
        .arg(
            Arg::new("max-line-length")
                .long("max-line-length")
                .help("gfortran line length limit, -1 for none [default: -1]")
                .value_name("NUM")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("gnu-diagnostics")
                .long("gnu-diagnostics")
                .help("gfortran diagnostics format: auto, modern or legacy [default: auto]")
                .value_name("MODE")
                .value_parser(clap::value_parser!(GnuDiagnostics)),
        )
        .arg(
            Arg::new("fypp")
                .long("fypp")
                .help("Preprocess sources with fypp (gfortran only)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Recursively lint directories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/directories matching pattern (glob syntax, can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("fortran")
                .short('f')
                .long("fortran")
                .help("Additional Fortran file extension (can be repeated, e.g., -f f03 -f inc)")
                .value_name("EXT")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to configuration file (overrides auto-discovery)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs (0=auto, 1=sequential)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("Output format: text or json [default: text]")
                .value_name("FORMAT")
                .value_parser(clap::value_parser!(OutputFormat)),
        )
        .arg(
            Arg::new("from-output")
                .long("from-output")
                .help("Parse a saved compiler transcript for the single input file instead of compiling")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("clean")
                .long("clean")
                .help("Remove .mod, .smod and .o files from the module output directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output (shows config, command lines, compiler output)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('S')
                .long("silent")
                .help("Silent mode (no summary, for editor integration)")
                .action(ArgAction::SetTrue),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

fn strings(matches: &clap::ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default()
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        compiler: matches.get_one::<Compiler>("compiler").copied(),
        compiler_path: matches.get_one::<String>("compiler-path").cloned(),
        include_paths: strings(matches, "include"),
        extra_args: strings(matches, "extra-arg"),
        mod_output: matches.get_one::<String>("mod-output").cloned(),
        max_line_length: matches.get_one::<i64>("max-line-length").copied(),
        gnu_diagnostics: matches.get_one::<GnuDiagnostics>("gnu-diagnostics").copied(),
        fypp: matches.get_flag("fypp"),
        recursive: matches.get_flag("recursive"),
        exclude: strings(matches, "exclude"),
        fortran_extensions: strings(matches, "fortran"),
        config: matches.get_one::<PathBuf>("config").cloned(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        format: matches
            .get_one::<OutputFormat>("format")
            .copied()
            .unwrap_or_default(),
        from_output: matches.get_one::<PathBuf>("from-output").cloned(),
        clean: matches.get_flag("clean"),
        debug: matches.get_flag("debug"),
        silent: matches.get_flag("silent"),
    }
}
