//! Application ports (traits) for external dependencies.
//!
//! Adapters in `kubeforge-adapters` implement these. Plugins see the
//! project tree only through [`Filesystem`], so the same plugin code runs
//! against the disk, an in-memory tree in tests, or a dry-run overlay.

pub mod output;

pub use output::{Filesystem, TemplateRenderer};
