//! Single-package builds
//!
//! Plans target paths, resolves package metadata (with caching) and invokes
//! the compiler driver for one package at a time.

mod config;
mod package;
mod plan;
mod resolve;
mod workdir;

pub use config::{BuildConfig, DEFAULT_TOOLCHAIN};
pub use package::{build_args, build_dependency, build_entry, build_files, build_package};
pub use plan::{archive_dir, plan, ARCHIVE_EXTENSION, SOURCE_SUFFIX};
pub use resolve::{cache_path, list_package, resolve_package, CACHE_EXTENSION};
pub use workdir::WorkDirGuard;
