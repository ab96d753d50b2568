//! Working directory and target archive planning

use crate::builder::config::{BuildConfig, DEFAULT_TOOLCHAIN};
use crate::error::{LoadkitError, LoadkitResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Suffix of single source files
pub const SOURCE_SUFFIX: &str = ".go";

/// Extension of compiled archives
pub const ARCHIVE_EXTENSION: &str = "a";

/// Fill in defaults, absolute paths and the target archive path.
///
/// `absolute` canonicalizes the build paths; dependency builds pass `false`
/// because their build path is a package identifier.
pub async fn plan(config: &mut BuildConfig, absolute: bool) -> LoadkitResult<()> {
    if config.toolchain.is_empty() {
        config.toolchain = DEFAULT_TOOLCHAIN.to_string();
    }

    if config.build_paths.is_empty() {
        return Err(LoadkitError::Config("source file path is empty".to_string()));
    }

    if absolute {
        for path in &mut config.build_paths {
            *path = absolute_path(Path::new(path))?.display().to_string();
        }
    }

    if config.work_dir.as_os_str().is_empty() {
        config.work_dir = PathBuf::from(".");
    }
    config.work_dir = absolute_path(&config.work_dir)?;
    create_dir(&config.work_dir).await?;

    config.target_dir = absolute_path(&config.target_dir)?;

    let archive_dir = archive_dir(config);
    create_dir(&archive_dir).await?;
    config.target_path = archive_path(&archive_dir);

    debug!(
        "Planned {} -> {}",
        config.build_paths[0],
        config.target_path.display()
    );
    Ok(())
}

/// Directory that holds the archive for the first build path.
///
/// Paths under `<toolchain_root>/src` keep their relative layout; other
/// packages use the package identifier and single files use their base name.
pub fn archive_dir(config: &BuildConfig) -> PathBuf {
    let Some(first) = config.build_paths.first() else {
        return config.target_dir.join(&config.pkg_path);
    };

    let relative = config
        .toolchain_root
        .as_ref()
        .and_then(|root| Path::new(first).strip_prefix(root.join("src")).ok());

    match first.strip_suffix(SOURCE_SUFFIX) {
        None => match relative {
            Some(rel) => config.target_dir.join(rel),
            None => config.target_dir.join(&config.pkg_path),
        },
        Some(stem) => match relative {
            Some(rel) => config
                .target_dir
                .join(rel.parent().unwrap_or_else(|| Path::new(""))),
            None => {
                let base = Path::new(stem)
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_default();
                config.target_dir.join(base)
            }
        },
    }
}

/// `<dir>/<basename(dir)>.a`
fn archive_path(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "pkg".to_string());
    dir.join(format!("{}.{}", name, ARCHIVE_EXTENSION))
}

fn absolute_path(path: &Path) -> LoadkitResult<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        LoadkitError::io(
            format!("failed to get absolute path at {}", path.display()),
            e,
        )
    })
}

async fn create_dir(path: &Path) -> LoadkitResult<()> {
    fs::create_dir_all(path).await.map_err(|e| {
        LoadkitError::io(format!("could not create directory at {}", path.display()), e)
    })
}
