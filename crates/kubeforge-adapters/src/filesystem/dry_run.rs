//! Dry-run overlay: reads fall through to a base filesystem, writes are
//! captured in memory.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use serde::Serialize;
use tracing::debug;

use kubeforge_core::{
    application::{ApplicationError, ports::Filesystem},
    domain::Permissions,
    error::ForgeResult,
};

/// Whether a captured write creates a file or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "create"),
            Self::Modified => write!(f, "modify"),
        }
    }
}

/// One entry of the change log, with the file's final content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub content: String,
}

/// Filesystem that never writes to its base.
///
/// Clones share the captured state, so the caller can hand one clone to the
/// scaffolder and read the change log from another afterwards.
#[derive(Clone)]
pub struct DryRunFilesystem {
    base: Arc<dyn Filesystem>,
    overlay: Arc<RwLock<Overlay>>,
}

#[derive(Debug, Default)]
struct Overlay {
    files: HashMap<PathBuf, Vec<u8>>,
    directories: HashSet<PathBuf>,
    order: Vec<PathBuf>,
}

impl DryRunFilesystem {
    pub fn new(base: Arc<dyn Filesystem>) -> Self {
        Self {
            base,
            overlay: Arc::new(RwLock::new(Overlay::default())),
        }
    }

    /// Captured writes in the order the files were first written.
    pub fn changes(&self) -> Vec<FileChange> {
        let Ok(overlay) = self.overlay.read() else {
            return Vec::new();
        };
        overlay
            .order
            .iter()
            .filter_map(|path| {
                let content = overlay.files.get(path)?;
                let kind = if self.base.exists(path) {
                    ChangeKind::Modified
                } else {
                    ChangeKind::Created
                };
                Some(FileChange {
                    path: path.clone(),
                    kind,
                    content: String::from_utf8_lossy(content).into_owned(),
                })
            })
            .collect()
    }

    fn dir_exists(&self, overlay: &Overlay, path: &Path) -> bool {
        path.as_os_str().is_empty() || overlay.directories.contains(path) || self.base.exists(path)
    }
}

impl fmt::Debug for DryRunFilesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DryRunFilesystem")
            .field("overlay", &self.overlay)
            .finish_non_exhaustive()
    }
}

impl Filesystem for DryRunFilesystem {
    fn read(&self, path: &Path) -> ForgeResult<Vec<u8>> {
        {
            let overlay = self
                .overlay
                .read()
                .map_err(|_| ApplicationError::StoreLockError)?;
            if let Some(content) = overlay.files.get(path) {
                return Ok(content.clone());
            }
        }
        self.base.read(path)
    }

    fn write(&self, path: &Path, content: &[u8], _permissions: Permissions) -> ForgeResult<()> {
        let mut overlay = self
            .overlay
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        if let Some(parent) = path.parent() {
            if !self.dir_exists(&overlay, parent) {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }

        debug!(path = %path.display(), "dry run: capturing write");
        if overlay
            .files
            .insert(path.to_path_buf(), content.to_vec())
            .is_none()
        {
            overlay.order.push(path.to_path_buf());
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let captured = self
            .overlay
            .read()
            .map(|o| o.files.contains_key(path) || o.directories.contains(path))
            .unwrap_or(false);
        captured || self.base.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> ForgeResult<()> {
        let mut overlay = self
            .overlay
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            overlay.directories.insert(current.clone());
        }
        Ok(())
    }
}
