//! Application services - orchestrate use cases.

pub mod marker_engine;
pub mod project_store;
pub mod scaffolder;
pub mod workspace;

pub use marker_engine::{MarkerEngine, PreparedEdits};
pub use project_store::ProjectStore;
pub use scaffolder::Scaffolder;
pub use workspace::{StepReport, Workspace};
