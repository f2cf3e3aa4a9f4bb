use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::domain::error::DomainError;

/// A path inside the project tree, relative to its root.
///
/// Generated files and mutation targets are always addressed this way so a
/// plugin can never write outside the directory it was pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    /// Create a relative path, rejecting absolute paths and `..` segments.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || path.as_os_str().is_empty() {
            return Err(DomainError::InvalidPath {
                path: path.display().to_string(),
            });
        }
        Ok(Self(path))
    }

    /// Join a path segment onto this relative path.
    pub fn join(&self, segment: impl AsRef<Path>) -> Result<Self, DomainError> {
        Self::new(self.0.join(segment))
    }

    /// Borrow as a `Path`.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolve against a project root.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Mode of a generated file. Only the executable bit is modelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    executable: bool,
}

impl Permissions {
    pub const fn regular() -> Self {
        Self { executable: false }
    }

    pub const fn executable() -> Self {
        Self { executable: true }
    }

    pub const fn is_executable(&self) -> bool {
        self.executable
    }
}
