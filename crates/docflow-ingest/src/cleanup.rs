//! Cleanup capability and the scoped guard that enforces it
//!
//! Anything that leaves local artifacts behind (staged documents, connector
//! download directories) implements [`Cleanup`]. Wrapping a value in a
//! [`CleanupGuard`] ties the cleanup to the guard's scope, so it runs on
//! early returns, panics and dropped futures alike.

use std::ops::{Deref, DerefMut};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Release local artifacts.
///
/// Must be safe to call at any time and any number of times; implementations
/// log failures instead of returning them.
pub trait Cleanup {
    fn cleanup(&self);
}

impl<T: Cleanup + ?Sized> Cleanup for &T {
    fn cleanup(&self) {
        (**self).cleanup()
    }
}

impl<T: Cleanup + ?Sized> Cleanup for std::sync::Arc<T> {
    fn cleanup(&self) {
        (**self).cleanup()
    }
}

/// Owns a value and calls [`Cleanup::cleanup`] on it when dropped
#[derive(Debug)]
pub struct CleanupGuard<D: Cleanup> {
    inner: D,
}

impl<D: Cleanup> CleanupGuard<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

impl<D: Cleanup> Deref for CleanupGuard<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.inner
    }
}

impl<D: Cleanup> DerefMut for CleanupGuard<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.inner
    }
}

impl<D: Cleanup> Drop for CleanupGuard<D> {
    fn drop(&mut self) {
        self.inner.cleanup();
    }
}

/// Remove empty directories below `root`, deepest first, then `root` itself
/// if it ended up empty. Non-empty directories are left alone.
///
/// Returns the number of directories removed.
pub fn remove_empty_dirs(root: &Path) -> usize {
    if !root.is_dir() {
        return 0;
    }

    let mut removed = 0;
    for entry in WalkDir::new(root).contents_first(true).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let is_empty = match std::fs::read_dir(path) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => false,
        };
        if !is_empty {
            continue;
        }
        match std::fs::remove_dir(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed empty directory");
                removed += 1;
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove directory"),
        }
    }
    removed
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Cleanup for Counter {
        fn cleanup(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_guard_runs_cleanup_on_drop() {
        let counter = Arc::new(Counter::default());
        {
            let guard = CleanupGuard::new(counter.clone());
            assert_eq!(guard.0.load(Ordering::SeqCst), 0);
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_runs_cleanup_on_early_return() {
        fn fails(counter: Arc<Counter>) -> Result<(), String> {
            let _guard = CleanupGuard::new(counter);
            let parsed: Result<(), String> = Err("boom".to_string());
            parsed?;
            Ok(())
        }

        let counter = Arc::new(Counter::default());
        assert!(fails(counter.clone()).is_err());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_runs_cleanup_on_panic() {
        let counter = Arc::new(Counter::default());
        let inner = counter.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = CleanupGuard::new(inner);
            panic!("parser exploded");
        });
        assert!(result.is_err());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_empty_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("downloads");
        std::fs::create_dir_all(root.join("a/b/c")).unwrap();
        std::fs::create_dir_all(root.join("keep")).unwrap();
        std::fs::write(root.join("keep/file.txt"), b"x").unwrap();

        let removed = remove_empty_dirs(&root);

        assert_eq!(removed, 3);
        assert!(!root.join("a").exists());
        assert!(root.join("keep/file.txt").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_remove_empty_dirs_removes_empty_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("downloads");
        std::fs::create_dir_all(root.join("x")).unwrap();

        assert_eq!(remove_empty_dirs(&root), 2);
        assert!(!root.exists());
        assert_eq!(remove_empty_dirs(&root), 0);
    }
}
