//! Configuration management for loadkit

pub mod schema;

pub use schema::Config;

use crate::error::{LoadkitError, LoadkitResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the project-local config file
pub const LOCAL_CONFIG_FILE: &str = "loadkit.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("loadkit")
            .join("config.toml")
    }

    /// Find a project-local config in `start` or one of its ancestors
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_FILE))
            .find(|path| path.is_file())
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> LoadkitResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load the local config when present, otherwise the managed one
    pub async fn load_preferring(&self, local: Option<&Path>) -> LoadkitResult<Config> {
        match local {
            Some(path) => {
                debug!("Using local config {}", path.display());
                self.load_from_file(path).await
            }
            None => self.load().await,
        }
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> LoadkitResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| LoadkitError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| LoadkitError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("nonexistent.toml"));

        let config = manager.load().await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn local_config_wins() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            "[build]\npkg_path = \"example.com/app\"\n",
        )
        .unwrap();

        let local = ConfigManager::find_local_config(&nested).unwrap();
        assert_eq!(local, temp.path().join(LOCAL_CONFIG_FILE));

        let manager = ConfigManager::with_path(temp.path().join("global.toml"));
        let config = manager.load_preferring(Some(&local)).await.unwrap();
        assert_eq!(config.build.pkg_path, "example.com/app");
    }

    #[tokio::test]
    async fn invalid_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[link]\nmax_iterations = \"many\"\n").unwrap();

        let err = ConfigManager::with_path(path.clone())
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, LoadkitError::ConfigInvalid { path: p, .. } if p == path));
    }
}
