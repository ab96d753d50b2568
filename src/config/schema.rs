//! Configuration schema for loadkit
//!
//! Configuration is stored at `~/.config/loadkit/config.toml` or in a
//! project-local `loadkit.toml`.

use crate::builder::DEFAULT_TOOLCHAIN;
use crate::link::{ClosureOptions, DEFAULT_JOBS, DEFAULT_MAX_ITERATIONS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build defaults
    pub build: BuildSettings,

    /// Dependency closure settings
    pub link: LinkSettings,
}

/// Defaults applied to every build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Toolchain binary
    pub toolchain: String,

    /// Extra compiler flags
    pub flags: Vec<String>,

    /// Scratch working directory
    pub work_dir: PathBuf,

    /// Root of all target archives
    pub target_dir: PathBuf,

    /// Package identifier of the entry package
    pub pkg_path: String,

    /// Keep the working directory after a build
    pub keep_work_dir: bool,

    /// Enable position-independent code
    pub dynlink: bool,

    /// Reuse existing dependency archives
    pub reuse_artifacts: bool,

    /// Environment for the compiler driver
    pub env: HashMap<String, String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            toolchain: DEFAULT_TOOLCHAIN.to_string(),
            flags: vec![],
            work_dir: PathBuf::from("./tmp"),
            target_dir: PathBuf::from("./target"),
            pkg_path: "main".to_string(),
            keep_work_dir: false,
            dynlink: default_dynlink(),
            reuse_artifacts: true,
            env: HashMap::new(),
        }
    }
}

/// Position-independent code is not needed on linux/amd64
fn default_dynlink() -> bool {
    !cfg!(all(target_os = "linux", target_arch = "x86_64"))
}

/// Dependency closure settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Rounds before giving up on unresolved symbols
    pub max_iterations: usize,

    /// Concurrent dependency builds per round
    pub jobs: usize,

    /// Host executable whose symbols are available at load time
    pub host_executable: Option<PathBuf>,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            jobs: DEFAULT_JOBS,
            host_executable: None,
        }
    }
}

impl LinkSettings {
    pub fn closure_options(&self) -> ClosureOptions {
        ClosureOptions {
            max_iterations: self.max_iterations,
            jobs: self.jobs.max(1),
        }
    }
}
