//! Error types and result aliases for flinter.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used by the application layers
//! - [`LintError`]: Typed conditions raised by diagnostic extraction and compiler invocation

use std::io;
use std::path::PathBuf;

use anyhow::Result as AnyhowResult;
use thiserror::Error;

pub type Result<T> = AnyhowResult<T>;

/// Conditions raised while turning compiler output into diagnostics.
///
/// A clean compile is not an error: extraction over output with no matches
/// returns an empty batch.
#[derive(Debug, Error)]
pub enum LintError {
    /// A grammar needs the text of a source line (NAG reports no column) but no
    /// document line could be read.
    #[error("{grammar}: no open document to resolve line {line}")]
    MissingPositionContext { grammar: &'static str, line: usize },

    /// The line lookup could not provide the requested line.
    #[error("document line {line} is not available")]
    DocumentUnavailable { line: usize },

    /// A pattern matched but none of its alternatives captured a message.
    /// Always a grammar bug.
    #[error("{grammar}: match without a recognizable message form: {text:?}")]
    MalformedGroupState { grammar: &'static str, text: String },

    #[error("{tool}: executable not found")]
    ToolNotFound { tool: String },

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("fypp failed on {}: {message}", file.display())]
    Preprocessor { file: PathBuf, message: String },
}
