//! Package metadata resolution with an on-disk cache
//!
//! Listing a package is expensive, so the decoded metadata is persisted next
//! to the target archive (`<archive>.json`) and read back on later runs.
//! Packages under the toolchain root are always listed fresh.

use crate::builder::config::BuildConfig;
use crate::error::{LoadkitError, LoadkitResult};
use crate::toolchain::{PackageMetadata, Toolchain};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Extension of metadata cache files
pub const CACHE_EXTENSION: &str = "json";

/// Cache file for a target archive
pub fn cache_path(target_path: &Path) -> PathBuf {
    target_path.with_extension(CACHE_EXTENSION)
}

/// Resolve metadata for `path`, remediating dependency errors once.
///
/// When the listing reports dependency errors, modules are downloaded and
/// tidied in the working directory and the package is listed again without
/// a working directory override. Errors that survive are fatal.
pub async fn resolve_package(
    toolchain: &dyn Toolchain,
    config: &BuildConfig,
    path: &str,
) -> LoadkitResult<PackageMetadata> {
    let pkg = list_package(toolchain, config, path, Some(&config.work_dir)).await?;
    let Some(first) = pkg.first_deps_error() else {
        return Ok(pkg);
    };

    warn!("Dependency errors in {}: {}", path, first);
    toolchain
        .mod_download(&config.toolchain, Some(&config.work_dir), &[])
        .await?;
    toolchain
        .mod_tidy(&config.toolchain, Some(&config.work_dir))
        .await?;

    let pkg = list_package(toolchain, config, path, None).await?;
    match pkg.first_deps_error() {
        Some(err) => Err(LoadkitError::DependencyResolution(err.to_string())),
        None => Ok(pkg),
    }
}

/// List a package, consulting the metadata cache first
pub async fn list_package(
    toolchain: &dyn Toolchain,
    config: &BuildConfig,
    path: &str,
    work_dir: Option<&Path>,
) -> LoadkitResult<PackageMetadata> {
    let cache = cache_path(&config.target_path);
    let cacheable = !under_toolchain_root(config, path);

    if cacheable {
        if let Some(pkg) = read_cache(&cache, path).await? {
            return Ok(pkg);
        }
    }

    let pkg = toolchain.list(&config.toolchain, path, work_dir).await?;
    if !pkg.is_buildable() {
        return Err(LoadkitError::NotBuildable(path.to_string()));
    }

    // Metadata with dependency errors is about to be remediated; caching it
    // would replay the errors on every later run.
    if cacheable && pkg.deps_errors.is_empty() {
        if let Err(e) = write_cache(&cache, &pkg).await {
            warn!("Failed to cache metadata for {}: {}", path, e);
        }
    }
    Ok(pkg)
}

fn under_toolchain_root(config: &BuildConfig, path: &str) -> bool {
    config
        .toolchain_root
        .as_ref()
        .is_some_and(|root| Path::new(path).starts_with(root))
}

async fn read_cache(cache: &Path, path: &str) -> LoadkitResult<Option<PackageMetadata>> {
    let content = match fs::read_to_string(cache).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            warn!("Ignoring unreadable metadata cache {}: {}", cache.display(), e);
            return Ok(None);
        }
    };

    let pkg: PackageMetadata =
        serde_json::from_str(&content).map_err(|e| LoadkitError::CacheDecode {
            path: cache.to_path_buf(),
            source: e,
        })?;

    if !pkg.is_buildable() {
        return Err(LoadkitError::NotBuildable(path.to_string()));
    }

    debug!("Using cached metadata {}", cache.display());
    Ok(Some(pkg))
}

/// Write through a temporary file so a failed write never clobbers a good cache
async fn write_cache(cache: &Path, pkg: &PackageMetadata) -> LoadkitResult<()> {
    let content = serde_json::to_string_pretty(pkg)?;
    let tmp = cache.with_extension(format!("{}.tmp", CACHE_EXTENSION));

    fs::write(&tmp, content)
        .await
        .map_err(|e| LoadkitError::io(format!("writing {}", tmp.display()), e))?;
    fs::rename(&tmp, cache)
        .await
        .map_err(|e| LoadkitError::io(format!("renaming {}", tmp.display()), e))?;

    debug!("Cached metadata {}", cache.display());
    Ok(())
}
