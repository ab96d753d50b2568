//! Single-package builds
//!
//! Each entry point plans the configuration, resolves package metadata and
//! runs the compiler driver, returning the metadata so callers can follow
//! the package's imports without listing it again.

use crate::builder::config::BuildConfig;
use crate::builder::plan::{plan, SOURCE_SUFFIX};
use crate::builder::resolve::resolve_package;
use crate::builder::workdir::WorkDirGuard;
use crate::error::{LoadkitError, LoadkitResult};
use crate::toolchain::{merge_build_flags, PackageMetadata, Toolchain};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Build the entry package, dispatching on whether sources are files or a directory
pub async fn build_entry(
    toolchain: &dyn Toolchain,
    config: &mut BuildConfig,
) -> LoadkitResult<PackageMetadata> {
    let is_files = match config.build_paths.first() {
        None => return Err(LoadkitError::Config("empty build path".to_string())),
        Some(first) => first.ends_with(SOURCE_SUFFIX),
    };
    if is_files {
        build_files(toolchain, config).await
    } else {
        build_package(toolchain, config).await
    }
}

/// Build one or more source files into a single archive.
///
/// The compiler runs in the directory of the first file, which is left in
/// place; only the configured scratch directory is cleaned up.
pub async fn build_files(
    toolchain: &dyn Toolchain,
    config: &mut BuildConfig,
) -> LoadkitResult<PackageMetadata> {
    let _guard = WorkDirGuard::new(&config.work_dir, config.keep_work_dir);
    plan(config, true).await?;

    let first = config.build_paths[0].clone();
    config.work_dir = Path::new(&first)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));

    let pkg = resolve_package(toolchain, config, &first).await?;
    exec_build(toolchain, config, false).await?;
    Ok(pkg)
}

/// Build a dependency given its package identifier
pub async fn build_dependency(
    toolchain: &dyn Toolchain,
    config: &mut BuildConfig,
) -> LoadkitResult<PackageMetadata> {
    if config.build_paths.len() != 1 {
        return Err(LoadkitError::Config(
            "invalid source package path: expected exactly one package".to_string(),
        ));
    }
    plan(config, false).await?;

    let path = config.build_paths[0].clone();
    let pkg = resolve_package(toolchain, config, &path).await?;
    exec_build(toolchain, config, config.reuse_artifacts).await?;
    Ok(pkg)
}

/// Build a whole package directory
pub async fn build_package(
    toolchain: &dyn Toolchain,
    config: &mut BuildConfig,
) -> LoadkitResult<PackageMetadata> {
    let _guard = WorkDirGuard::new(&config.work_dir, config.keep_work_dir);
    if config.build_paths.len() > 1 {
        return Err(LoadkitError::Config(
            "invalid source package path: expected exactly one directory".to_string(),
        ));
    }
    plan(config, true).await?;

    let path = config.build_paths[0].clone();
    let meta = fs::metadata(&path)
        .await
        .map_err(|e| LoadkitError::io(format!("could not stat path at {}", path), e))?;
    if !meta.is_dir() {
        return Err(LoadkitError::NotADirectory(PathBuf::from(path)));
    }

    let pkg = resolve_package(toolchain, config, &path).await?;
    exec_build(toolchain, config, false).await?;
    Ok(pkg)
}

/// Arguments for `<binary> build`
pub fn build_args(config: &BuildConfig) -> Vec<String> {
    let mut args = vec!["build".to_string()];
    args.extend(merge_build_flags(&config.extra_flags, config.dynlink));
    args.push("-o".to_string());
    args.push(config.target_path.display().to_string());
    args.extend(config.build_paths.iter().cloned());
    args
}

async fn exec_build(
    toolchain: &dyn Toolchain,
    config: &BuildConfig,
    reuse: bool,
) -> LoadkitResult<()> {
    if reuse && can_reuse(config).await {
        debug!("Reusing archive {}", config.target_path.display());
        return Ok(());
    }

    let args = build_args(config);
    let output = toolchain
        .build(&config.toolchain, &args, &config.work_dir, &config.env)
        .await?;

    if config.verbose && !output.stdout.is_empty() {
        info!("{}", output.stdout.trim_end());
    }
    debug!("Built {}", config.target_path.display());
    Ok(())
}

/// An archive is reused when it exists and the package lives outside the toolchain root
async fn can_reuse(config: &BuildConfig) -> bool {
    let [path] = config.build_paths.as_slice() else {
        return false;
    };
    let under_root = config
        .toolchain_root
        .as_ref()
        .is_some_and(|root| Path::new(path).starts_with(root));
    !under_root && fs::try_exists(&config.target_path).await.unwrap_or(false)
}
