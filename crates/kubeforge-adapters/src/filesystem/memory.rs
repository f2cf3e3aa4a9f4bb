//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use kubeforge_core::{
    application::{ApplicationError, ports::Filesystem},
    domain::Permissions,
    error::ForgeResult,
};

/// In-memory filesystem for testing.
///
/// Behaves like the disk where the engine can observe it: a missing file is
/// `FileNotFound`, and writing into a directory that was never created
/// fails. Clones share the same tree.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, Vec<u8>>,
    directories: HashSet<PathBuf>,
    executables: HashSet<PathBuf>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryFilesystemInner::default())),
        }
    }

    /// Read a file's content as text (testing helper).
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<String> {
        let inner = self.inner.read().ok()?;
        let bytes = inner.files.get(path.as_ref())?;
        String::from_utf8(bytes.clone()).ok()
    }

    /// Check if a file is marked executable.
    pub fn is_executable(&self, path: impl AsRef<Path>) -> bool {
        self.inner
            .read()
            .map(|inner| inner.executables.contains(path.as_ref()))
            .unwrap_or(false)
    }

    /// List all files, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Create a file and its parent directories (testing helper).
    pub fn seed(&self, path: impl AsRef<Path>, content: &str) -> ForgeResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }
        self.write(path, content.as_bytes(), Permissions::default())
    }

    fn read_guard(&self) -> ForgeResult<RwLockReadGuard<'_, MemoryFilesystemInner>> {
        Ok(self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?)
    }

    fn write_guard(&self) -> ForgeResult<RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        Ok(self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?)
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for MemoryFilesystem {
    fn read(&self, path: &Path) -> ForgeResult<Vec<u8>> {
        let inner = self.read_guard()?;
        if inner.directories.contains(path) {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "Is a directory".into(),
            }
            .into());
        }
        inner.files.get(path).cloned().ok_or_else(|| {
            ApplicationError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into()
        })
    }

    fn write(&self, path: &Path, content: &[u8], permissions: Permissions) -> ForgeResult<()> {
        let mut inner = self.write_guard()?;

        // Ensure parent exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }
        if inner.directories.contains(path) {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "Is a directory".into(),
            }
            .into());
        }

        inner.files.insert(path.to_path_buf(), content.to_vec());
        if permissions.is_executable() {
            inner.executables.insert(path.to_path_buf());
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn create_dir_all(&self, path: &Path) -> ForgeResult<()> {
        let mut inner = self.write_guard()?;

        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            if inner.files.contains_key(&current) {
                return Err(ApplicationError::FilesystemError {
                    path: current,
                    reason: "Not a directory".into(),
                }
                .into());
            }
            inner.directories.insert(current.clone());
        }

        Ok(())
    }
}
