//! Package metadata as reported by `list -json`
//!
//! Field names follow the lister's JSON output so the same types decode
//! the lister stream and round-trip through the metadata cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listed package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageMetadata {
    /// Import path of the package
    pub import_path: String,

    /// Package name
    pub name: String,

    /// Directory containing the package sources
    pub dir: String,

    /// Whether the package belongs to the standard library
    pub standard: bool,

    /// Own source files
    pub go_files: Vec<String>,

    /// C-interop source files
    pub cgo_files: Vec<String>,

    /// Direct imports
    pub imports: Vec<String>,

    /// Errors loading dependencies
    pub deps_errors: Vec<PackageError>,

    /// Error loading the package itself
    pub error: Option<PackageError>,

    /// Module providing the package (diagnostics only)
    pub module: Option<Module>,
}

impl PackageMetadata {
    /// A package is buildable when it has at least one own or interop source file
    pub fn is_buildable(&self) -> bool {
        !(self.go_files.is_empty() && self.cgo_files.is_empty())
    }

    /// First reported dependency error message, if any
    pub fn first_deps_error(&self) -> Option<&str> {
        self.deps_errors.first().map(|e| e.err.as_str())
    }
}

/// Error attached to a listed package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageError {
    /// Shortest import path chain leading to the error
    pub import_stack: Vec<String>,

    /// Source position, if known
    pub pos: String,

    /// The error itself
    pub err: String,
}

/// Module provenance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Module {
    /// Module path
    pub path: String,

    /// Module version
    pub version: String,

    /// Replaced by this module
    pub replace: Option<Box<Module>>,

    /// When the version was created
    pub time: Option<DateTime<Utc>>,

    /// Is this the main module?
    pub main: bool,

    /// Only indirectly needed by the main module
    pub indirect: bool,

    /// Directory holding the local copy, if any
    pub dir: String,

    /// Path to the module file
    pub go_mod: String,

    /// Language version declared by the module
    pub go_version: String,

    /// Error loading the module
    pub error: Option<ModuleError>,
}

/// Error loading a module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModuleError {
    pub err: String,
}
