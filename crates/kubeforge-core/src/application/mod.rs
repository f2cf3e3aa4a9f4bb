//! Application layer for kubeforge.
//!
//! This layer contains:
//! - **Ports**: the filesystem and renderer traits adapters implement
//! - **Plugin contract**: [`Plugin`] and its ordered composition [`Bundle`]
//! - **Services**: marker engine, project store, workspace and the
//!   [`Scaffolder`] entry point
//! - **Errors**: Application-specific error types

pub mod error;
pub mod plugin;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use plugin::{Bundle, BundleBuilder, Plugin};
pub use ports::{Filesystem, TemplateRenderer};
pub use services::{MarkerEngine, ProjectStore, Scaffolder, StepReport, Workspace};
