//! Compiler invocation and the lint pipeline.
//!
//! **Settings:** a [`Config`](crate::config::Config) is resolved once into
//! [`LintSettings`]: compiler executable, diagnostics grammar, include
//! directories and the module output directory.
//!
//! **Per document:**
//! - Optionally run fypp and keep its stdout
//! - Run the compiler with the C locale in the document's directory
//! - Extract diagnostics from stdout + stderr and drop duplicates
//!
//! The main entry point is [`lint_document`]; [`lint_output`] handles output
//! that was captured elsewhere.

pub mod clean;
pub mod globs;
pub mod invoke;
pub mod pipeline;
pub mod variables;

pub use clean::clean;
pub use globs::{GlobPaths, IncludeCache};
pub use pipeline::{
    default_mod_output, lint_document, lint_output, resolve_mod_output, select_grammar,
    LintSettings,
};
pub use variables::{resolve_variables, VariableContext};
