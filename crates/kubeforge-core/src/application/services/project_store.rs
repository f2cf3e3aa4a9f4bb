//! Loading and saving the `PROJECT` file through the [`Filesystem`] port.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::{ApplicationError, ports::Filesystem};
use crate::domain::{PROJECT_FILE, Permissions, ProjectConfig};
use crate::error::{ForgeError, ForgeResult};

pub struct ProjectStore<'a> {
    fs: &'a dyn Filesystem,
    path: PathBuf,
}

impl<'a> ProjectStore<'a> {
    pub fn new(fs: &'a dyn Filesystem, root: &Path) -> Self {
        Self {
            fs,
            path: root.join(PROJECT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The project configuration, or `None` when the project is not
    /// initialized yet.
    pub fn load(&self) -> ForgeResult<Option<ProjectConfig>> {
        match self.fs.read_to_string(&self.path) {
            Ok(text) => Ok(Some(ProjectConfig::from_yaml(&text)?)),
            Err(ForgeError::Application(ApplicationError::FileNotFound { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The project configuration, failing when the project is not
    /// initialized.
    pub fn require(&self) -> ForgeResult<ProjectConfig> {
        self.load()?.ok_or_else(|| {
            ApplicationError::Precondition {
                requirement: format!(
                    "project is not initialized ({} not found); run `kubeforge init` first",
                    self.path.display()
                ),
            }
            .into()
        })
    }

    pub fn save(&self, config: &ProjectConfig) -> ForgeResult<()> {
        debug!(path = %self.path.display(), "saving project configuration");
        let text = config.to_yaml()?;
        self.fs
            .write(&self.path, text.as_bytes(), Permissions::default())
    }
}
