//! Configuration management for flinter.
//!
//! This module provides the [`Config`] struct which controls how the compiler
//! is chosen and invoked. Configuration can be loaded from:
//! - TOML files (`flinter.toml`)
//! - CLI arguments (which override file settings)
//!
//! Config files are auto-discovered by searching parent directories from the file
//! being linted up to the filesystem root, plus the user's home directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::grammar::Compiler;

/// Config file names to search for (in order of priority, later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["flinter.toml"];

/// Get the user's home directory
pub(crate) fn dirs_home() -> Option<PathBuf> {
    // Try HOME environment variable first (works on Unix and some Windows setups)
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    // Fallback for Windows
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

/// How gfortran output is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GnuDiagnostics {
    /// Probe `gfortran --version`; 11.0.0 and later use plain-output diagnostics
    #[default]
    Auto,
    Modern,
    Legacy,
}

impl std::str::FromStr for GnuDiagnostics {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(GnuDiagnostics::Auto),
            "modern" => Ok(GnuDiagnostics::Modern),
            "legacy" => Ok(GnuDiagnostics::Legacy),
            _ => Err(format!(
                "unknown gfortran diagnostics mode '{s}' (expected auto, modern or legacy)"
            )),
        }
    }
}

// Serde default functions
fn default_max_line_length() -> i64 {
    -1
}
fn default_fypp_path() -> String {
    "fypp".to_string()
}
fn default_line_numbering_mode() -> String {
    "nocontlines".to_string()
}
fn default_line_marker_format() -> String {
    "cpp".to_string()
}

/// Main configuration struct for flinter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Compiler used for linting (default: gfortran)
    #[serde(default)]
    pub compiler: Compiler,

    /// Explicit compiler executable; looked up on PATH when unset
    #[serde(default)]
    pub compiler_path: Option<String>,

    /// Glob patterns resolved to include directories (`-I<dir>`)
    #[serde(default)]
    pub include_paths: Vec<String>,

    /// Extra compiler arguments; replace the compiler's defaults when non-empty
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Directory for `.mod`/`.smod` output; empty uses a temporary cache directory
    #[serde(default)]
    pub mod_output: String,

    /// gfortran line length limit (-1 = none, default: -1)
    #[serde(default = "default_max_line_length")]
    pub max_line_length: i64,

    /// gfortran diagnostics grammar selection (default: auto)
    #[serde(default)]
    pub gnu_diagnostics: GnuDiagnostics,

    /// Preprocess sources with fypp before compiling (gfortran only, default: false)
    #[serde(default)]
    pub fypp_enabled: bool,

    /// fypp executable (default: fypp)
    #[serde(default = "default_fypp_path")]
    pub fypp_path: String,

    /// fypp preprocessor definitions (`-DKEY=VALUE`, or `-DKEY` for empty values)
    #[serde(default)]
    pub fypp_definitions: HashMap<String, String>,

    /// Glob patterns resolved to fypp include directories
    #[serde(default)]
    pub fypp_includes: Vec<String>,

    /// fypp `--line-numbering-mode` (default: nocontlines)
    #[serde(default = "default_line_numbering_mode")]
    pub fypp_line_numbering_mode: String,

    /// fypp `--line-marker-format` (default: cpp)
    #[serde(default = "default_line_marker_format")]
    pub fypp_line_marker_format: String,

    /// Extra fypp arguments
    #[serde(default)]
    pub fypp_extra_args: Vec<String>,
}

/// Partial configuration for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    pub compiler: Option<Compiler>,
    pub compiler_path: Option<String>,
    pub include_paths: Option<Vec<String>>,
    pub extra_args: Option<Vec<String>>,
    pub mod_output: Option<String>,
    pub max_line_length: Option<i64>,
    pub gnu_diagnostics: Option<GnuDiagnostics>,
    pub fypp_enabled: Option<bool>,
    pub fypp_path: Option<String>,
    #[serde(default)]
    pub fypp_definitions: HashMap<String, String>,
    pub fypp_includes: Option<Vec<String>>,
    pub fypp_line_numbering_mode: Option<String>,
    pub fypp_line_marker_format: Option<String>,
    pub fypp_extra_args: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            compiler: Compiler::Gfortran,
            compiler_path: None,
            include_paths: Vec::new(),
            extra_args: Vec::new(),
            mod_output: String::new(),
            max_line_length: -1,
            gnu_diagnostics: GnuDiagnostics::Auto,
            fypp_enabled: false,
            fypp_path: default_fypp_path(),
            fypp_definitions: HashMap::new(),
            fypp_includes: Vec::new(),
            fypp_line_numbering_mode: default_line_numbering_mode(),
            fypp_line_marker_format: default_line_marker_format(),
            fypp_extra_args: Vec::new(),
        }
    }
}

impl Config {
    /// Smallest explicit line length gfortran accepts
    const MIN_LINE_LENGTH: i64 = 1;

    /// Validate configuration values
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if self
            .compiler_path
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Some("compiler_path must not be empty".to_string());
        }
        if self.max_line_length != -1 && self.max_line_length < Self::MIN_LINE_LENGTH {
            return Some(format!(
                "max_line_length {} must be -1 (no limit) or at least {}",
                self.max_line_length,
                Self::MIN_LINE_LENGTH
            ));
        }
        if self.fypp_path.trim().is_empty() {
            return Some("fypp_path must not be empty".to_string());
        }
        None
    }

    /// Whether linting is switched on at all
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.compiler != Compiler::Disabled
    }

    /// Whether fypp preprocessing applies. fypp output is only understood by
    /// gfortran, so other compilers ignore the setting.
    #[must_use]
    pub fn fypp_active(&self) -> bool {
        if !self.fypp_enabled {
            return false;
        }
        if self.compiler != Compiler::Gfortran {
            warn!("[lint] fypp currently only supports gfortran, ignoring fypp_enabled");
            return false;
        }
        true
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let partial: PartialConfig = toml::from_str(&contents)?;
        let mut config = Self::default();
        config.apply_partial(partial);
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(v) = partial.compiler {
            self.compiler = v;
        }
        if let Some(v) = partial.compiler_path {
            self.compiler_path = Some(v);
        }
        if let Some(v) = partial.include_paths {
            self.include_paths = v;
        }
        if let Some(v) = partial.extra_args {
            self.extra_args = v;
        }
        if let Some(v) = partial.mod_output {
            self.mod_output = v;
        }
        if let Some(v) = partial.max_line_length {
            self.max_line_length = v;
        }
        if let Some(v) = partial.gnu_diagnostics {
            self.gnu_diagnostics = v;
        }
        if let Some(v) = partial.fypp_enabled {
            self.fypp_enabled = v;
        }
        if let Some(v) = partial.fypp_path {
            self.fypp_path = v;
        }
        if let Some(v) = partial.fypp_includes {
            self.fypp_includes = v;
        }
        if let Some(v) = partial.fypp_line_numbering_mode {
            self.fypp_line_numbering_mode = v;
        }
        if let Some(v) = partial.fypp_line_marker_format {
            self.fypp_line_marker_format = v;
        }
        if let Some(v) = partial.fypp_extra_args {
            self.fypp_extra_args = v;
        }
        // Merge definitions (partial values override)
        self.fypp_definitions.extend(partial.fypp_definitions);
    }

    /// Discover config files from parent directories of a given path
    ///
    /// Searches from the file's directory up to the root, then adds home directory config.
    /// Returns list of config file paths in order of priority (least specific first).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        // Add home directory config first (lowest priority)
        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        // Start from the file's parent directory (or the path itself if it's a directory)
        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            // Path doesn't exist, use current directory
            std::env::current_dir().ok()
        };

        // Collect config files from parent directories (from root to current)
        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            // Reverse so we go from root to current (less specific to more specific)
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Returns default config if no files found.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let mut config = Self::default();
        for path in &Self::discover_config_files(start_path) {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<PartialConfig>(&contents) {
                    Ok(partial) => config.apply_partial(partial),
                    Err(e) => warn!("failed to parse {}: {e}", path.display()),
                },
                Err(e) => warn!("failed to read {}: {e}", path.display()),
            }
        }
        config
    }
}
