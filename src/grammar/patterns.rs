/// Regex patterns for compiler diagnostic output
///
/// All patterns are compiled once at first use via `LazyLock`. A compiled
/// `Regex` holds no scan position, so every `captures_iter` call walks the
/// text with its own cursor and concurrent extractions never interfere.
///
/// All patterns run in multi-line CRLF mode: `^`/`$` anchor at line
/// boundaries and `.` never crosses a line terminator. Numeric groups use
/// `[0-9]` rather than `\d` so only ASCII digits reach the integer parser.
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Build a multi-line regex from a compile-time constant pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid. All patterns in this module are
/// compile-time constants that are exercised by tests, so the panic can only
/// fire on a pattern typo, at first access of the `LazyLock` static.
fn build_re(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .crlf(true)
        .build()
        .unwrap_or_else(|e| panic!("Invalid regex pattern {pattern}: {e}"))
}

// Windows drive prefix followed by the rest of a path, e.g. `C:\src\a.f90`
const FNAME_STR: &str = r"(?<fname>(?:\w:\\)?.*)";

// ===== GNU (gfortran < 11) =====

// Two alternatives in one pass:
//   file:line:col:            (followed by a source excerpt and a caret line)
//   Severity: message
// or a driver/preprocessor level message:
//   binary: severity: message
pub static GNU_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(&format!(
        r"(?:^{FNAME_STR}:(?<ln>[0-9]+):(?<cn>[0-9]+)[:.](?:\s+.*\s+.*?\s+)(?<sev1>Error|Warning|Fatal Error):\s(?<msg1>.*)$)|(?:^(?<bin>\w+):\s*(?<sev2>\w+\s*\w*):\s*(?<msg2>.*)$)"
    ))
});

// ===== GNU (gfortran >= 11, -fdiagnostics-plain-output) =====

// file:line:col: Severity: message
pub static GNU_MODERN_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(&format!(
        r"{FNAME_STR}:(?<ln>[0-9]+):(?<cn>[0-9]+): (?<sev>Error|Warning|Fatal Error): (?<msg>.*)"
    ))
});

// ===== Intel (ifort / ifx) =====

// file(line): severity #code: message
// <echoed source line>
// ------^
// or a preprocessor message without a caret line:
// file(line): #severity: message
pub static INTEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(&format!(
        r"^{FNAME_STR}\((?<ln>[0-9]+)\):\s*(?:#(?:(?<sev2>\w*):\s*(?<msg2>.*$))|(?<sev1>\w*)\s*(?<msg1>.*$)(?:\s*.*\s*)(?<cn>-*\^))"
    ))
});

// ===== NAG (nagfor) =====

// Severity[(code)]: file, line N: message
// Severity may be several words, e.g. `Sequence Error`, `Deleted feature used`
pub static NAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r"^(?<sev1>Remark|Info|Note|Warning|Questionable|Extension|Obsolescent|Deleted feature used|(?:\w+ )?Error|Fatal|Panic)(?:\(\w+\))?: (?<fname>[\S ]+), line (?<ln>[0-9]+): (?<msg1>.+)$",
    )
});

// ===== LFortran (--error-format=short) =====

// file:lineStart-lineEnd:colStart-colEnd: severity: message
pub static LFORTRAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(&format!(
        r"{FNAME_STR}:(?<ls>[0-9]+)-(?<le>[0-9]+):(?<cs>[0-9]+)-(?<ce>[0-9]+): (?<sev>.+): (?<msg>.+)"
    ))
});

// ===== COMPILER VERSION =====

// `gfortran --version` banner, e.g. `GNU Fortran (Ubuntu 11.4.0-1ubuntu1~22.04) 11.4.0`
pub static GNU_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^GNU Fortran \([\S ]+\) (?<msg>(?<version>[0-9]+\.[0-9]+\.[0-9]+).*)$")
});
