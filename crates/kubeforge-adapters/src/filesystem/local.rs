//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use kubeforge_core::{
    application::{ApplicationError, ports::Filesystem},
    domain::Permissions,
    error::{ForgeError, ForgeResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn read(&self, path: &Path) -> ForgeResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ApplicationError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into(),
            _ => map_io_error(path, e, "read file"),
        })
    }

    fn write(&self, path: &Path, content: &[u8], permissions: Permissions) -> ForgeResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))?;
        if permissions.is_executable() {
            set_executable(path)?;
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> ForgeResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> ForgeResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path).map_err(|e| map_io_error(path, e, "get metadata"))?;
    let mut perms = metadata.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms).map_err(|e| map_io_error(path, e, "set permissions"))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> ForgeResult<()> {
    // No executable bit outside unix.
    Ok(())
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> ForgeError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeforge_core::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn read_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = LocalFilesystem::new()
            .read(&temp.path().join("PROJECT"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn write_then_read() {
        let temp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let dir = temp.path().join("config/default");
        fs.create_dir_all(&dir).unwrap();

        let file = dir.join("kustomization.yaml");
        fs.write(&file, b"resources:\n", Permissions::default())
            .unwrap();
        assert!(fs.exists(&file));
        assert_eq!(fs.read_to_string(&file).unwrap(), "resources:\n");
    }

    #[test]
    fn write_without_parent_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = LocalFilesystem::new()
            .write(
                &temp.path().join("missing/file.txt"),
                b"x",
                Permissions::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_is_set() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("run.sh");
        LocalFilesystem::new()
            .write(&file, b"#!/bin/sh\n", Permissions::executable())
            .unwrap();
        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
