//! Infrastructure adapters for kubeforge.
//!
//! This crate implements the ports defined in `kubeforge-core::application::ports`
//! and ships the built-in plugins. It contains all I/O.

pub mod builtin_templates;
pub mod filesystem;
pub mod plugins;
pub mod registry;
pub mod renderer;
pub mod template_loader;

// Re-export commonly used adapters
pub use filesystem::{DryRunFilesystem, LocalFilesystem, MemoryFilesystem};
pub use registry::PluginRegistry;
pub use renderer::SimpleRenderer;
pub use template_loader::FilesystemTemplateLoader;
