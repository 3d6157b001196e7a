//! flinter - Fortran linter driven by real compilers
//!
//! Runs gfortran, ifort/ifx, nagfor or lfortran over Fortran sources and
//! normalizes their diagnostics into editor-style ranges and severities.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod extract;
pub mod grammar;
pub mod process;
pub mod source;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs, OutputFormat};
pub use config::{Config, GnuDiagnostics};
pub use diagnostic::{dedup, Diagnostic, DiagnosticCollection, Position, Range, Severity};
pub use error::{LintError, Result};
pub use extract::{extract, extract_each, LineLookup};
pub use grammar::{classify_severity, Compiler, Grammar};
pub use process::{lint_document, lint_output, LintSettings};
pub use source::SourceDocument;
