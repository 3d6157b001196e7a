//! Conversion of raw compiler output into normalized diagnostics.
//!
//! [`extract`] walks every match of a grammar's pattern in emission order and
//! maps compiler coordinates onto 0-based document coordinates:
//! - lines are always decremented
//! - gfortran and Intel point columns are taken as derived (gfortran's printed
//!   column, Intel's caret offset)
//! - lfortran spans decrement the start column and keep the inclusive end
//!   column, which is exactly the exclusive end in document coordinates
//! - nagfor has no column, so the whole source line is resolved through a
//!   [`LineLookup`]
//! - driver-level messages with no file are pinned to line 0, column 1

pub mod position;

pub use position::{resolve_line_range, LineLookup};

use log::debug;

use crate::diagnostic::{Diagnostic, Position, Range};
use crate::error::LintError;
use crate::grammar::{CompilerMessage, Grammar, Location};

/// Column given to messages that carry no usable column.
const DEFAULT_COLUMN: usize = 1;

/// Extract all diagnostics from `output` using `grammar`.
///
/// `document` is the currently open source for grammars that need line text
/// (nagfor). Output with no matches yields an empty vector.
///
/// # Errors
///
/// [`LintError::MissingPositionContext`] when a line-only message cannot be
/// resolved, and [`LintError::MalformedGroupState`] when a match decodes to
/// no known message form.
pub fn extract(
    grammar: &Grammar,
    output: &str,
    document: Option<&dyn LineLookup>,
) -> Result<Vec<Diagnostic>, LintError> {
    let diagnostics = extract_each(grammar, output, document).collect::<Result<Vec<_>, _>>()?;
    debug!(
        "[lint] {} produced {} diagnostics",
        grammar.name,
        diagnostics.len()
    );
    Ok(diagnostics)
}

/// Like [`extract`], but yields one result per matched message so callers
/// can drop the messages that fail and keep the rest.
pub fn extract_each<'a>(
    grammar: &'a Grammar,
    output: &'a str,
    document: Option<&'a dyn LineLookup>,
) -> impl Iterator<Item = Result<Diagnostic, LintError>> + 'a {
    grammar.messages(output).map(move |message| {
        let message = message?;
        let range = resolve_range(grammar, &message, document)?;
        let severity = grammar.classify(message.severity());
        Ok(Diagnostic::new(range, message.message(), severity))
    })
}

fn resolve_range(
    grammar: &Grammar,
    message: &CompilerMessage<'_>,
    document: Option<&dyn LineLookup>,
) -> Result<Range, LintError> {
    let location = match message {
        CompilerMessage::ToolLevel { .. } => {
            return Ok(Range::point(Position::new(0, DEFAULT_COLUMN)));
        }
        CompilerMessage::Located { location, .. } => *location,
    };
    match location {
        Location::Point { line, column } => Ok(Range::point(Position::new(
            line.saturating_sub(1),
            column,
        ))),
        Location::Line { line } => {
            let index = line.saturating_sub(1);
            let missing = || LintError::MissingPositionContext {
                grammar: grammar.name,
                line: index,
            };
            let document = document.ok_or_else(missing)?;
            resolve_line_range(document, index).map_err(|_| missing())
        }
        Location::Span {
            start_line,
            end_line,
            start_column,
            end_column,
        } => Ok(Range::new(
            Position::new(start_line.saturating_sub(1), start_column.saturating_sub(1)),
            Position::new(end_line.saturating_sub(1), end_column),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use crate::grammar::{GNU, GNU_MODERN, INTEL, LFORTRAN, NAG};

    fn point(line: usize, column: usize) -> Range {
        Range::point(Position::new(line, column))
    }

    #[test]
    fn test_empty_output_for_every_grammar() {
        for grammar in [&GNU, &GNU_MODERN, &INTEL, &NAG, &LFORTRAN] {
            assert!(extract(grammar, "", None).unwrap().is_empty());
        }
    }

    #[test]
    fn test_gnu_binary_level_position() {
        let output = "gfortran: fatal error: cannot execute '/usr/lib/gcc/x86_64-linux-gnu/9/f951': execv: Argument list too long\ncompilation terminated.\n";
        let diagnostics = extract(&GNU, output, None).unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::new(
                point(0, 1),
                "cannot execute '/usr/lib/gcc/x86_64-linux-gnu/9/f951': execv: Argument list too long",
                Severity::Error,
            )]
        );
    }

    #[test]
    fn test_gnu_modern_point() {
        let diagnostics = extract(&GNU_MODERN, "err-mod.f90:3:17: Error: (1)", None).unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::new(point(2, 17), "(1)", Severity::Error)]
        );
    }

    #[test]
    fn test_intel_caret_column() {
        let output = "sample.f90(4): error #6631: A non-optional actual argument must be present when invoking a procedure with an explicit interface.   [A]\n  call say_hello()\n-------^\n";
        let diagnostics = extract(&INTEL, output, None).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range, point(3, 8));
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_nag_resolves_whole_line() {
        let lines = [
            "module err_mod",
            "  private",
            "  implicit none",
            "contains",
        ];
        let output = "Sequence Error: lint/err-mod.f90, line 3: The IMPLICIT statement cannot occur here\n";
        let owned: Vec<String> = lines.iter().map(ToString::to_string).collect();
        let lookup = move |index: usize| owned.get(index).cloned();
        let diagnostics = extract(&NAG, output, Some(&lookup)).unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::new(
                Range::new(Position::new(2, 0), Position::new(2, 15)),
                "The IMPLICIT statement cannot occur here",
                Severity::Error,
            )]
        );
    }

    #[test]
    fn test_nag_without_document() {
        let output = "Warning: a.f90, line 9: Unused local variable Y\n";
        let result = extract(&NAG, output, None);
        assert!(matches!(
            result,
            Err(LintError::MissingPositionContext {
                grammar: "nagfor",
                line: 8
            })
        ));
    }

    #[test]
    fn test_nag_line_past_end_of_document() {
        let lookup = |index: usize| (index < 2).then(String::new);
        let output = "Error: a.f90, line 40: Missing END statement\n";
        let result = extract(&NAG, output, Some(&lookup));
        assert!(matches!(
            result,
            Err(LintError::MissingPositionContext { line: 39, .. })
        ));
    }

    #[test]
    fn test_lfortran_span_columns() {
        let output = "lint/err-mod.f90:3-3:5-12: syntax error: Token 'implicit' is unexpected here\n";
        let diagnostics = extract(&LFORTRAN, output, None).unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::new(
                Range::new(Position::new(2, 4), Position::new(2, 12)),
                "Token 'implicit' is unexpected here",
                Severity::Error,
            )]
        );
    }

    #[test]
    fn test_lfortran_hint_and_multiline_span() {
        let output = "src/m.f90:4-6:1-10: style suggestion: Use 'end subroutine' instead\n";
        let diagnostics = extract(&LFORTRAN, output, None).unwrap();
        assert_eq!(diagnostics[0].severity, Severity::Hint);
        assert_eq!(
            diagnostics[0].range,
            Range::new(Position::new(3, 0), Position::new(5, 10))
        );
    }

    #[test]
    fn test_repeated_extraction_is_identical() {
        let output = "a.f90:1:2: Warning: one\na.f90:7:3: Error: two\n";
        let first = extract(&GNU_MODERN, output, None).unwrap();
        let second = extract(&GNU_MODERN, output, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
