//! Filesystem access.
//!
//! Resolution only ever needs to test for files and read documents, so the
//! whole filesystem surface is this small trait. `OsFileSystem` talks to the
//! real disk, `MemoryFileSystem` serves tests and benchmarks.

use crate::error::{BundleError, BundleResult};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// Read-only filesystem oracle
pub trait FileSystem {
    /// Check if a regular file exists at `path`
    fn is_file(&self, path: &Utf8Path) -> bool;

    /// Read a whole file as UTF-8
    fn read_to_string(&self, path: &Utf8Path) -> BundleResult<String>;

    /// Directory relative paths are resolved against
    fn current_dir(&self) -> BundleResult<Utf8PathBuf>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn is_file(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Utf8Path) -> BundleResult<String> {
        std::fs::read_to_string(path)
            .map_err(|e| BundleError::io(format!("Failed to read '{}'", path), e))
    }

    fn current_dir(&self) -> BundleResult<Utf8PathBuf> {
        let cwd = std::env::current_dir()
            .map_err(|e| BundleError::io("Failed to get current directory".to_string(), e))?;
        Utf8PathBuf::from_path_buf(cwd).map_err(|path| {
            BundleError::io(
                format!("Current directory '{}' is not valid UTF-8", path.display()),
                std::io::Error::from(std::io::ErrorKind::InvalidData),
            )
        })
    }
}

/// In-memory filesystem keyed by absolute path
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    cwd: Utf8PathBuf,
    files: IndexMap<Utf8PathBuf, String>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem rooted at `cwd`
    pub fn new(cwd: impl Into<Utf8PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            files: IndexMap::new(),
        }
    }

    /// Add or replace a file, relative paths are taken from the current directory
    pub fn insert(&mut self, path: impl AsRef<Utf8Path>, contents: impl Into<String>) {
        let path = super::path::absolutize(path.as_ref(), &self.cwd);
        self.files.insert(path, contents.into());
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_file(mut self, path: impl AsRef<Utf8Path>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new("/")
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_file(&self, path: &Utf8Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_to_string(&self, path: &Utf8Path) -> BundleResult<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            BundleError::io(
                format!("Failed to read '{}'", path),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })
    }

    fn current_dir(&self) -> BundleResult<Utf8PathBuf> {
        Ok(self.cwd.clone())
    }
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn is_file(&self, path: &Utf8Path) -> bool {
        (**self).is_file(path)
    }

    fn read_to_string(&self, path: &Utf8Path) -> BundleResult<String> {
        (**self).read_to_string(path)
    }

    fn current_dir(&self) -> BundleResult<Utf8PathBuf> {
        (**self).current_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_filesystem() {
        let fs = MemoryFileSystem::new("/work").with_file("conf/bundles.yml", "packages: {}");
        let path = Utf8Path::new("/work/conf/bundles.yml");
        assert!(fs.is_file(path));
        assert_eq!(fs.read_to_string(path).unwrap(), "packages: {}");
        assert!(!fs.is_file(Utf8Path::new("/work/missing.yml")));
        assert!(fs.read_to_string(Utf8Path::new("/work/missing.yml")).is_err());
        assert_eq!(fs.current_dir().unwrap(), Utf8PathBuf::from("/work"));
    }

    #[test]
    fn test_os_filesystem() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();
        let file = root.join("bundles.yml");
        std::fs::write(&file, "imports: []").unwrap();

        let fs = OsFileSystem;
        assert!(fs.is_file(&file));
        assert!(!fs.is_file(&root));
        assert_eq!(fs.read_to_string(&file).unwrap(), "imports: []");

        let err = fs.read_to_string(&root.join("missing.yml")).unwrap_err();
        assert!(err.to_string().contains("missing.yml"));
    }
}
