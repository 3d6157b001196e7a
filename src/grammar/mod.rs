//! Per-compiler diagnostic grammars.
//!
//! Compilers do not share a diagnostic format. Each [`Grammar`] bundles:
//! - a compiled pattern with named groups ([`patterns`])
//! - the decoding of one match into a tagged [`CompilerMessage`] ([`message`])
//! - four severity keyword sets consumed by [`classify_severity`]
//! - invocation metadata (mandatory/default arguments, module-output and
//!   source-form flags) used by [`crate::process`]
//!
//! The five grammars are plain values; there is no trait hierarchy.

pub mod message;
pub mod patterns;

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagnostic::Severity;

pub use message::{CompilerMessage, Location};

/// Which compiler output layout a grammar decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    GnuLegacy,
    GnuModern,
    Intel,
    Nag,
    LFortran,
}

/// Keyword vocabularies for the four severity levels.
#[derive(Debug, Clone, Copy)]
pub struct SeverityKeywords {
    pub errors: &'static [&'static str],
    pub warnings: &'static [&'static str],
    pub infos: &'static [&'static str],
    pub hints: &'static [&'static str],
}

/// Map a compiler severity keyword to a [`Severity`].
///
/// Sets are checked in the order errors, warnings, infos, hints and the first
/// exact (case-insensitive) match wins. A keyword found in no set is an
/// [`Severity::Error`].
#[must_use]
pub fn classify_severity(keyword: &str, keywords: &SeverityKeywords) -> Severity {
    let keyword = keyword.trim();
    let levels = [
        (keywords.errors, Severity::Error),
        (keywords.warnings, Severity::Warning),
        (keywords.infos, Severity::Information),
        (keywords.hints, Severity::Hint),
    ];
    for (set, severity) in levels {
        if set.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            return severity;
        }
    }
    Severity::Error
}

/// Immutable description of one compiler's diagnostic output and invocation.
#[derive(Debug)]
pub struct Grammar {
    /// Compiler identifier, e.g. `gfortran`
    pub name: &'static str,
    pub family: Family,
    pub severity: SeverityKeywords,
    /// Always passed to the compiler when linting
    pub mandatory_args: &'static [&'static str],
    /// Passed unless the user supplies their own extra arguments
    pub default_args: &'static [&'static str],
    /// Flag that redirects `.mod` output, followed by the directory
    pub module_output_flag: &'static str,
    /// Flag forcing free-form source (empty when the compiler has none)
    pub free_form_flag: &'static str,
    /// Flag forcing fixed-form source
    pub fixed_form_flag: &'static str,
}

impl Grammar {
    /// The compiled pattern for this grammar.
    #[must_use]
    pub fn pattern(&self) -> &'static Regex {
        match self.family {
            Family::GnuLegacy => &*patterns::GNU_RE,
            Family::GnuModern => &*patterns::GNU_MODERN_RE,
            Family::Intel => &*patterns::INTEL_RE,
            Family::Nag => &*patterns::NAG_RE,
            Family::LFortran => &*patterns::LFORTRAN_RE,
        }
    }

    #[must_use]
    pub fn classify(&self, keyword: &str) -> Severity {
        classify_severity(keyword, &self.severity)
    }
}

const GNU_SEVERITY: SeverityKeywords = SeverityKeywords {
    errors: &["error", "fatal error"],
    warnings: &["warning"],
    infos: &["info"],
    hints: &["hint"],
};

pub static GNU: Grammar = Grammar {
    name: "gfortran",
    family: Family::GnuLegacy,
    severity: GNU_SEVERITY,
    mandatory_args: &["-fsyntax-only", "-cpp"],
    default_args: &["-Wall"],
    module_output_flag: "-J",
    free_form_flag: "-ffree-form",
    fixed_form_flag: "-ffixed-form",
};

pub static GNU_MODERN: Grammar = Grammar {
    name: "gfortran",
    family: Family::GnuModern,
    severity: GNU_SEVERITY,
    mandatory_args: &["-fsyntax-only", "-cpp", "-fdiagnostics-plain-output"],
    default_args: &["-Wall"],
    module_output_flag: "-J",
    free_form_flag: "-ffree-form",
    fixed_form_flag: "-ffixed-form",
};

pub static INTEL: Grammar = Grammar {
    name: "ifort",
    family: Family::Intel,
    severity: SeverityKeywords {
        errors: &["error", "fatal error"],
        warnings: &["warning", "remark"],
        infos: &["info", "note"],
        hints: &["hint"],
    },
    mandatory_args: &["-syntax-only", "-fpp"],
    default_args: &["-warn", "all"],
    module_output_flag: "-module",
    free_form_flag: "-free",
    fixed_form_flag: "-fixed",
};

pub static NAG: Grammar = Grammar {
    name: "nagfor",
    family: Family::Nag,
    severity: SeverityKeywords {
        errors: &["panic", "fatal", "error"],
        warnings: &["extension", "questionable", "deleted feature used", "warning"],
        infos: &["remark", "note", "info"],
        hints: &[],
    },
    mandatory_args: &["-M", "-quiet"],
    default_args: &[],
    module_output_flag: "-mdir",
    free_form_flag: "-free",
    fixed_form_flag: "-fixed",
};

pub static LFORTRAN: Grammar = Grammar {
    name: "lfortran",
    family: Family::LFortran,
    severity: SeverityKeywords {
        errors: &[
            "C preprocessor error",
            "prescanner error",
            "tokenizer error",
            "syntax error",
            "semantic error",
            "ASR pass error",
            "code generation error",
        ],
        warnings: &["warning"],
        infos: &["note"],
        hints: &["help", "style suggestion"],
    },
    mandatory_args: &["--error-format=short"],
    default_args: &[],
    module_output_flag: "-J",
    free_form_flag: "",
    fixed_form_flag: "--fixed-form",
};

/// Compilers the linter knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compiler {
    #[default]
    Gfortran,
    Ifort,
    Ifx,
    Nagfor,
    Lfortran,
    Disabled,
}

impl Compiler {
    /// Executable name looked up on `PATH` when no explicit path is configured.
    #[must_use]
    pub fn executable(self) -> &'static str {
        match self {
            Compiler::Gfortran | Compiler::Disabled => "gfortran",
            Compiler::Ifort => "ifort",
            Compiler::Ifx => "ifx",
            Compiler::Nagfor => "nagfor",
            Compiler::Lfortran => "lfortran",
        }
    }

    /// Grammar for this compiler. `modern_gnu` selects the plain-output
    /// gfortran grammar (gfortran 11 and later).
    #[must_use]
    pub fn grammar(self, modern_gnu: bool) -> &'static Grammar {
        match self {
            Compiler::Gfortran | Compiler::Disabled => {
                if modern_gnu {
                    &GNU_MODERN
                } else {
                    &GNU
                }
            }
            Compiler::Ifort | Compiler::Ifx => &INTEL,
            Compiler::Nagfor => &NAG,
            Compiler::Lfortran => &LFORTRAN,
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compiler::Disabled => f.write_str("disabled"),
            other => f.write_str(other.executable()),
        }
    }
}

impl FromStr for Compiler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gfortran" => Ok(Compiler::Gfortran),
            "ifort" => Ok(Compiler::Ifort),
            "ifx" => Ok(Compiler::Ifx),
            "nagfor" => Ok(Compiler::Nagfor),
            "lfortran" => Ok(Compiler::Lfortran),
            "disabled" => Ok(Compiler::Disabled),
            _ => Err(format!(
                "unknown compiler '{s}' (expected gfortran, ifort, ifx, nagfor, lfortran or disabled)"
            )),
        }
    }
}
