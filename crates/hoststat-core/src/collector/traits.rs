//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait allows the procfs reader to work with both the real
//! `/proc` filesystem on Linux and mock implementations for testing on macOS or in CI.

use std::io;
use std::path::Path;

/// Capacity counters of a mounted filesystem, as reported by `statvfs(2)`.
///
/// Block counts are in units of `block_size` bytes (the fragment size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FsStat {
    pub block_size: u64,
    pub blocks: u64,
    pub blocks_free: u64,
    pub blocks_available: u64,
    pub files: u64,
    pub files_free: u64,
    pub files_available: u64,
}

/// Abstraction for filesystem operations.
///
/// This trait allows readers to query the real filesystem or
/// a mock implementation for testing purposes.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    ///
    /// # Arguments
    /// * `path` - Path to the file to read
    ///
    /// # Returns
    /// The file contents as a string, or an I/O error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Queries capacity counters of the filesystem mounted at `path`.
    fn statvfs(&self, path: &Path) -> io::Result<FsStat>;
}

/// Real filesystem implementation that delegates to `std::fs` and `libc`.
///
/// Use this in production to read from the actual `/proc` filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    #[cfg(unix)]
    fn statvfs(&self, path: &Path) -> io::Result<FsStat> {
        use std::ffi::CString;
        use std::mem::MaybeUninit;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut buf = MaybeUninit::<libc::statvfs>::zeroed();

        // SAFETY: `c_path` is a valid NUL-terminated string and `buf` points to
        // writable memory large enough for one `statvfs` structure.
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), buf.as_mut_ptr()) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: statvfs returned 0, so the structure is fully initialized.
        let st = unsafe { buf.assume_init() };

        Ok(FsStat {
            block_size: st.f_frsize as u64,
            blocks: st.f_blocks as u64,
            blocks_free: st.f_bfree as u64,
            blocks_available: st.f_bavail as u64,
            files: st.f_files as u64,
            files_free: st.f_ffree as u64,
            files_available: st.f_favail as u64,
        })
    }

    #[cfg(not(unix))]
    fn statvfs(&self, _path: &Path) -> io::Result<FsStat> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "statvfs is not available on this platform",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_real_fs_read_to_string() {
        let fs = RealFs::new();
        // Cargo runs unit tests from the crate root
        let cargo_toml = env::current_dir().unwrap().join("Cargo.toml");
        let content = fs.read_to_string(&cargo_toml).unwrap();
        assert!(content.contains("[package]"));
    }

    #[test]
    fn test_real_fs_exists() {
        let fs = RealFs::new();
        let cargo_toml = env::current_dir().unwrap().join("Cargo.toml");
        assert!(fs.exists(&cargo_toml));
        assert!(!fs.exists(Path::new("/nonexistent/path/12345")));
    }

    #[cfg(unix)]
    #[test]
    fn test_real_fs_statvfs() {
        let fs = RealFs::new();
        let dir = tempfile::tempdir().unwrap();
        let stat = fs.statvfs(dir.path()).unwrap();
        assert!(stat.block_size > 0);
        assert!(stat.blocks_free <= stat.blocks);
    }

    #[cfg(unix)]
    #[test]
    fn test_real_fs_statvfs_missing_path() {
        let fs = RealFs::new();
        let err = fs.statvfs(Path::new("/nonexistent/path/12345")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
