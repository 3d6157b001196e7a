//! Decoding of one pattern match into a tagged compiler message.
//!
//! Several patterns carry alternative branches (a source-located form and a
//! driver/preprocessor form). Which branch fired is settled here, once, so
//! later stages only ever see a [`CompilerMessage`] variant.

use log::error;
use regex::Captures;

use super::{Family, Grammar};
use crate::error::LintError;

/// Location as reported by the compiler, before conversion to document
/// coordinates. Lines are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// A single point. The column is kept exactly as the grammar derives it:
    /// the number printed by gfortran, or the rendered caret offset for Intel.
    Point { line: usize, column: usize },
    /// Only a line is known (nagfor).
    Line { line: usize },
    /// 1-based span with an inclusive end column (lfortran).
    Span {
        start_line: usize,
        end_line: usize,
        start_column: usize,
        end_column: usize,
    },
}

/// One message found in compiler output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerMessage<'t> {
    /// A message tied to a source file position.
    Located {
        file: &'t str,
        location: Location,
        severity: &'t str,
        message: &'t str,
    },
    /// A driver or preprocessor message naming only the tool, e.g.
    /// `gfortran: fatal error: ...`.
    ToolLevel {
        tool: &'t str,
        severity: &'t str,
        message: &'t str,
    },
}

impl CompilerMessage<'_> {
    #[must_use]
    pub fn severity(&self) -> &str {
        match self {
            CompilerMessage::Located { severity, .. } | CompilerMessage::ToolLevel { severity, .. } => {
                severity
            }
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            CompilerMessage::Located { message, .. } | CompilerMessage::ToolLevel { message, .. } => {
                message
            }
        }
    }
}

impl Grammar {
    /// Every message in `text`, in the order the compiler emitted them.
    ///
    /// Each call scans with a fresh cursor over the shared compiled pattern.
    pub fn messages<'t>(
        &'t self,
        text: &'t str,
    ) -> impl Iterator<Item = Result<CompilerMessage<'t>, LintError>> + 't {
        self.pattern()
            .captures_iter(text)
            .map(move |caps| self.decode(&caps))
    }

    /// Decode a single match into its message variant.
    pub fn decode<'t>(&self, caps: &Captures<'t>) -> Result<CompilerMessage<'t>, LintError> {
        match self.family {
            Family::GnuLegacy => self.decode_gnu(caps),
            Family::GnuModern => Ok(CompilerMessage::Located {
                file: self.text(caps, "fname")?,
                location: Location::Point {
                    line: self.number(caps, "ln")?,
                    column: self.number(caps, "cn")?,
                },
                severity: self.text(caps, "sev")?,
                message: self.text(caps, "msg")?,
            }),
            Family::Intel => self.decode_intel(caps),
            Family::Nag => Ok(CompilerMessage::Located {
                file: self.text(caps, "fname")?,
                location: Location::Line {
                    line: self.number(caps, "ln")?,
                },
                severity: self.text(caps, "sev1")?,
                message: self.text(caps, "msg1")?,
            }),
            Family::LFortran => Ok(CompilerMessage::Located {
                file: self.text(caps, "fname")?,
                location: Location::Span {
                    start_line: self.number(caps, "ls")?,
                    end_line: self.number(caps, "le")?,
                    start_column: self.number(caps, "cs")?,
                    end_column: self.number(caps, "ce")?,
                },
                severity: self.text(caps, "sev")?,
                message: self.text(caps, "msg")?,
            }),
        }
    }

    fn decode_gnu<'t>(&self, caps: &Captures<'t>) -> Result<CompilerMessage<'t>, LintError> {
        if let Some(file) = caps.name("fname") {
            return Ok(CompilerMessage::Located {
                file: file.as_str(),
                location: Location::Point {
                    line: self.number(caps, "ln")?,
                    column: self.number(caps, "cn")?,
                },
                severity: self.text(caps, "sev1")?,
                message: self.text(caps, "msg1")?,
            });
        }
        if let Some(tool) = caps.name("bin") {
            return Ok(CompilerMessage::ToolLevel {
                tool: tool.as_str(),
                severity: self.text(caps, "sev2")?,
                message: self.text(caps, "msg2")?,
            });
        }
        Err(self.malformed(caps))
    }

    fn decode_intel<'t>(&self, caps: &Captures<'t>) -> Result<CompilerMessage<'t>, LintError> {
        let file = self.text(caps, "fname")?;
        let line = self.number(caps, "ln")?;
        // Column is the 1-based offset of `^` in the marker line, i.e. its length
        let column = caps.name("cn").map_or(1, |marker| marker.as_str().len());
        let (severity, message) = match (caps.name("sev1"), caps.name("msg1")) {
            (Some(severity), Some(message)) => (severity.as_str(), message.as_str()),
            _ => (self.text(caps, "sev2")?, self.text(caps, "msg2")?),
        };
        Ok(CompilerMessage::Located {
            file,
            location: Location::Point { line, column },
            severity,
            message,
        })
    }

    fn text<'t>(&self, caps: &Captures<'t>, group: &str) -> Result<&'t str, LintError> {
        caps.name(group)
            .map(|m| m.as_str())
            .ok_or_else(|| self.malformed(caps))
    }

    fn number(&self, caps: &Captures<'_>, group: &str) -> Result<usize, LintError> {
        caps.name(group)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| self.malformed(caps))
    }

    fn malformed(&self, caps: &Captures<'_>) -> LintError {
        let text = caps.get(0).map_or("", |m| m.as_str()).to_string();
        error!("[lint] {} pattern matched without a usable message: {text:?}", self.name);
        LintError::MalformedGroupState {
            grammar: self.name,
            text,
        }
    }
}
