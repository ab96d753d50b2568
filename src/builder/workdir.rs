//! Scoped working directory cleanup

use std::path::{Path, PathBuf};
use tracing::debug;

/// Removes a working directory when dropped, on success and failure alike.
///
/// Never removes the current directory or one of its ancestors.
pub struct WorkDirGuard {
    path: Option<PathBuf>,
}

impl WorkDirGuard {
    /// Guard `work_dir` unless it should be kept
    pub fn new(work_dir: &Path, keep: bool) -> Self {
        if keep || work_dir.as_os_str().is_empty() {
            return Self { path: None };
        }
        let path = std::path::absolute(work_dir).ok().filter(|p| !contains_cwd(p));
        Self { path }
    }

    /// Directory that will be removed, if any
    #[cfg(test)]
    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn contains_cwd(path: &Path) -> bool {
    std::env::current_dir().map_or(true, |cwd| cwd.starts_with(path))
}

impl Drop for WorkDirGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match std::fs::remove_dir_all(&path) {
                Ok(()) => debug!("Removed work directory {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => debug!("Could not remove work directory {}: {}", path.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn removes_on_drop() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        std::fs::create_dir_all(work.join("nested")).unwrap();

        drop(WorkDirGuard::new(&work, false));
        assert!(!work.exists());
    }

    #[test]
    fn keeps_when_requested() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        std::fs::create_dir_all(&work).unwrap();

        drop(WorkDirGuard::new(&work, true));
        assert!(work.exists());
    }

    #[test]
    fn never_removes_current_dir() {
        let guard = WorkDirGuard::new(Path::new("."), false);
        assert!(guard.path().is_none());
        let guard = WorkDirGuard::new(Path::new("/"), false);
        assert!(guard.path().is_none());
    }
}
