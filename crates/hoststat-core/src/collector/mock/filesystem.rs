//! In-memory mock filesystem for testing readers without real `/proc`.
//!
//! `MockFs` holds file contents and `statvfs` results in memory, so reader
//! tests do not depend on the build host's `/proc` or mount table.

use crate::collector::traits::{FileSystem, FsStat};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MockTree {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for `exists` support).
    directories: HashSet<PathBuf>,
    /// Per mount point `statvfs` results.
    mounts: HashMap<PathBuf, io::Result<FsStat>>,
}

impl MockTree {
    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

/// In-memory filesystem for testing.
///
/// Clones share the same tree, so a test can keep a handle and rewrite
/// `/proc/stat` after the mock has been moved into a reader.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    tree: Arc<RwLock<MockTree>>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_tree(&self) -> RwLockReadGuard<'_, MockTree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_tree(&self) -> RwLockWriteGuard<'_, MockTree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds (or replaces) a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        let mut tree = self.write_tree();
        tree.add_parents(&path);
        tree.files.insert(path, content.into());
    }

    /// Removes a file if present.
    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.write_tree().files.remove(path.as_ref());
    }

    /// Registers `statvfs` counters for a mount point.
    pub fn add_statvfs(&self, mount_point: impl AsRef<Path>, stat: FsStat) {
        let path = mount_point.as_ref().to_path_buf();
        let mut tree = self.write_tree();
        tree.directories.insert(path.clone());
        tree.mounts.insert(path, Ok(stat));
    }

    /// Makes `statvfs` on a mount point fail with the given error kind.
    pub fn fail_statvfs(&self, mount_point: impl AsRef<Path>, kind: io::ErrorKind) {
        self.write_tree().mounts.insert(
            mount_point.as_ref().to_path_buf(),
            Err(io::Error::new(kind, "injected statvfs failure")),
        );
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.read_tree().files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        let tree = self.read_tree();
        tree.files.contains_key(path) || tree.directories.contains(path)
    }

    fn statvfs(&self, path: &Path) -> io::Result<FsStat> {
        match self.read_tree().mounts.get(path) {
            Some(Ok(stat)) => Ok(*stat),
            Some(Err(e)) => Err(io::Error::new(e.kind(), e.to_string())),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mount point not found: {:?}", path),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let fs = MockFs::new();
        fs.add_file("/proc/loadavg", "0.15 0.10 0.05 1/150 1234\n");

        assert!(fs.exists(Path::new("/proc/loadavg")));
        assert!(fs.exists(Path::new("/proc")));

        let content = fs.read_to_string(Path::new("/proc/loadavg")).unwrap();
        assert_eq!(content, "0.15 0.10 0.05 1/150 1234\n");
    }

    #[test]
    fn test_mock_fs_clones_share_tree() {
        let fs = MockFs::new();
        let handle = fs.clone();
        handle.add_file("/proc/stat", "cpu  1 2 3 4 5 6 7 8 0 0\n");

        let content = fs.read_to_string(Path::new("/proc/stat")).unwrap();
        assert!(content.starts_with("cpu "));

        handle.remove_file("/proc/stat");
        assert!(!fs.exists(Path::new("/proc/stat")));
    }

    #[test]
    fn test_mock_fs_statvfs() {
        let fs = MockFs::new();
        let stat = FsStat {
            block_size: 4096,
            blocks: 1000,
            blocks_free: 400,
            blocks_available: 350,
            files: 100,
            files_free: 60,
            files_available: 60,
        };
        fs.add_statvfs("/", stat);
        assert_eq!(fs.statvfs(Path::new("/")).unwrap(), stat);

        fs.fail_statvfs("/mnt/nfs", io::ErrorKind::PermissionDenied);
        let err = fs.statvfs(Path::new("/mnt/nfs")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_mock_fs_not_found() {
        let fs = MockFs::new();
        let result = fs.read_to_string(Path::new("/nonexistent"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert_eq!(
            fs.statvfs(Path::new("/nonexistent")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
