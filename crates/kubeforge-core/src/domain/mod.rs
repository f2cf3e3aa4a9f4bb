//! Core domain layer for kubeforge.
//!
//! Pure values and text manipulation: no filesystem, no rendering engine,
//! no plugin dispatch. Those live behind the ports of the application layer.

pub mod capability;
pub mod common;
pub mod context;
pub mod error;
pub mod mutation;
pub mod naming;
pub mod patch;
pub mod plugin_key;
pub mod project_config;
pub mod render;
pub mod resource;
pub mod step_plan;

pub use capability::{Capability, CapabilitySet};
pub use common::{Permissions, RelativePath};
pub use context::{FeatureFlags, GenerationContext, GenerationContextBuilder};
pub use error::{DomainError, ErrorCategory};
pub use mutation::{MissingPolicy, Mutation, MutationKind, MutationOp, MutationOutcome, MutationPlan};
pub use patch::PatchError;
pub use plugin_key::{PluginKey, PluginVersion, ProjectVersion, Stage};
pub use project_config::{
    ApiSpec, PROJECT_FILE, PluginRecord, ProjectConfig, ProjectStage, ResourceEntry, WebhookSpec,
};
pub use render::{IfExists, RenderContext, RenderedFile, TemplateId};
pub use resource::ResourceId;
pub use step_plan::StepPlan;
