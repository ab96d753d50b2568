//! Error types for loadkit
//!
//! All modules use `LoadkitResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for loadkit operations
pub type LoadkitResult<T> = Result<T, LoadkitError>;

/// All errors that can occur while building and linking a package
#[derive(Error, Debug)]
pub enum LoadkitError {
    // Configuration errors
    #[error("Invalid build configuration: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Path at {0} is not a directory")]
    NotADirectory(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Package listing errors
    #[error("Failed to list package {path}: {reason}\nstderr:\n{stderr}")]
    Listing {
        path: String,
        reason: String,
        stderr: String,
    },

    #[error("Failed to decode cached package metadata {path}: {source}")]
    CacheDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not resolve dependency errors: {0}")]
    DependencyResolution(String),

    #[error("No source files found for package {0}")]
    NotBuildable(String),

    // Compiler errors
    #[error("Could not build with command '{command}': {reason}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    Build {
        command: String,
        reason: String,
        stdout: String,
        stderr: String,
    },

    // Link errors
    #[error("Unresolved symbols: {}", .0.join(", "))]
    UnresolvedSymbols(Vec<String>),

    #[error("Loader failed while {context}: {reason}")]
    Loader { context: String, reason: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LoadkitError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a loader error with context
    pub fn loader(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Loader {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DependencyResolution(_) => {
                Some("Check the module file and network access, then run: go mod download")
            }
            Self::UnresolvedSymbols(_) => Some(
                "Register the symbols with the host executable (-e) or import the defining package",
            ),
            Self::NotBuildable(_) => Some("Point -f at a directory or file containing sources"),
            _ => None,
        }
    }
}
