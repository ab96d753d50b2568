//! Per-invocation build configuration

use crate::config::schema::BuildSettings;
use std::path::PathBuf;

/// Default toolchain binary name
pub const DEFAULT_TOOLCHAIN: &str = "go";

/// Configuration for building one package or set of files
///
/// Built by the caller, completed in place by the planner (absolute paths
/// and target archive), then consumed by the builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildConfig {
    /// Toolchain binary (defaults to `go`)
    pub toolchain: String,
    /// Extra compiler flags
    pub extra_flags: Vec<String>,
    /// Environment overrides for the compiler driver
    pub env: Vec<(String, String)>,
    /// Source files, a package directory, or a package identifier
    pub build_paths: Vec<String>,
    /// Package identifier
    pub pkg_path: String,
    /// Root of all target archives
    pub target_dir: PathBuf,
    /// Resolved archive path, filled in by the planner
    pub target_path: PathBuf,
    /// Working directory for the compiler driver
    pub work_dir: PathBuf,
    /// Toolchain search root; metadata of packages under it is never cached
    pub toolchain_root: Option<PathBuf>,
    /// Keep the working directory after the build
    pub keep_work_dir: bool,
    /// Echo compiler output
    pub verbose: bool,
    /// Enable position-independent code
    pub dynlink: bool,
    /// Reuse an existing dependency archive instead of rebuilding it
    pub reuse_artifacts: bool,
}

impl BuildConfig {
    /// Create a configuration from file/default settings
    pub fn from_settings(settings: &BuildSettings) -> Self {
        let mut env: Vec<(String, String)> = settings
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.sort();

        Self {
            toolchain: settings.toolchain.clone(),
            extra_flags: settings.flags.clone(),
            env,
            build_paths: Vec::new(),
            pkg_path: settings.pkg_path.clone(),
            target_dir: settings.target_dir.clone(),
            target_path: PathBuf::new(),
            work_dir: settings.work_dir.clone(),
            toolchain_root: None,
            keep_work_dir: settings.keep_work_dir,
            verbose: false,
            dynlink: settings.dynlink,
            reuse_artifacts: settings.reuse_artifacts,
        }
    }

    /// Derive the configuration for a dependency package.
    ///
    /// Only the package identifier and source path change; flags, env and
    /// toolchain are inherited so dependencies are built compatibly.
    pub fn for_dependency(&self, package: &str) -> Self {
        Self {
            pkg_path: package.to_string(),
            build_paths: vec![package.to_string()],
            target_path: PathBuf::new(),
            ..self.clone()
        }
    }
}
