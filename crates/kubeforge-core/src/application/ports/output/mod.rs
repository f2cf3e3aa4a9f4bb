//! Driven (output) ports - implemented by infrastructure.

use std::path::Path;

use crate::application::ApplicationError;
use crate::domain::{Permissions, RenderContext, RenderedFile, TemplateId};
use crate::error::ForgeResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `kubeforge_adapters::filesystem::LocalFilesystem` (production)
/// - `kubeforge_adapters::filesystem::MemoryFilesystem` (testing)
/// - `kubeforge_adapters::filesystem::DryRunFilesystem` (`--dry-run`)
///
/// A missing file is reported as `ApplicationError::FileNotFound`, never as
/// a generic filesystem error, so callers can tell "not generated yet" from
/// "disk is broken".
pub trait Filesystem: Send + Sync {
    /// Read the whole file.
    fn read(&self, path: &Path) -> ForgeResult<Vec<u8>>;

    /// Replace the whole file. The parent directory must exist.
    fn write(&self, path: &Path, content: &[u8], permissions: Permissions) -> ForgeResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> ForgeResult<()>;

    /// Read a UTF-8 text file.
    fn read_to_string(&self, path: &Path) -> ForgeResult<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|_| {
            ApplicationError::InvalidEncoding {
                path: path.to_path_buf(),
            }
            .into()
        })
    }
}

/// Port for template rendering.
///
/// Implemented by:
/// - `kubeforge_adapters::renderer::SimpleRenderer` (`{{VARIABLE}}` substitution)
pub trait TemplateRenderer: Send + Sync {
    /// Render one template into a file relative to the project root.
    ///
    /// Fails with `ApplicationError::TemplateRender` for an unknown template,
    /// a missing required variable or a placeholder left unresolved.
    fn render(&self, template: &TemplateId, context: &RenderContext) -> ForgeResult<RenderedFile>;

    /// Whether the renderer knows `template`.
    fn has_template(&self, template: &TemplateId) -> bool;
}
