//! kubeforge core - domain and application layers of the scaffolding engine.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          kubeforge-cli (binary)         │
//! └──────────────────┬──────────────────────┘
//!                    │ builds GenerationContext, picks a plugin
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   Scaffolder → Plugin / Bundle          │
//! │   Workspace, MarkerEngine, ProjectStore │
//! └──────────────────┬──────────────────────┘
//!                    │ through ports
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │ kubeforge-adapters (filesystems,        │
//! │ renderer, concrete plugins, registry)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The domain layer (`domain`) holds the values: resource identity, plugin
//! keys, the PROJECT file model, mutation plans and the literal text
//! patching that the marker engine is built on.

pub mod application;
pub mod domain;
pub mod error;

/// Common imports for plugin authors and the command layer.
pub mod prelude {
    pub use crate::application::{
        ApplicationError, Bundle, Filesystem, MarkerEngine, Plugin, ProjectStore, Scaffolder,
        TemplateRenderer, Workspace,
    };
    pub use crate::domain::{
        Capability, CapabilitySet, FeatureFlags, GenerationContext, IfExists, Mutation,
        MutationPlan, Permissions, PluginKey, PluginVersion, ProjectConfig, ProjectVersion,
        RelativePath, RenderContext, RenderedFile, ResourceId, StepPlan, TemplateId,
    };
    pub use crate::error::{ErrorKind, ForgeError, ForgeResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
