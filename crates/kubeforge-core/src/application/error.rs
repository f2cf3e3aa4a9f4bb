//! Application layer errors.
//!
//! These errors represent failures while driving plugins against a project
//! tree, not invalid input values. Those are `DomainError` from
//! `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{Capability, ErrorCategory, MutationKind, PatchError, ProjectVersion};

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// The file does not exist (distinct from an I/O failure).
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Filesystem operation failed.
    #[error("filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    #[error("{path} is not valid UTF-8")]
    InvalidEncoding { path: PathBuf },

    /// A marker operation could not be applied. The file is untouched.
    #[error("unable to {operation} in {path}: {source}")]
    Mutation {
        path: PathBuf,
        operation: MutationKind,
        #[source]
        source: PatchError,
    },

    /// Template rendering failed.
    #[error("unable to render template '{template}': {reason}")]
    TemplateRender { template: String, reason: String },

    #[error("{path} already exists")]
    FileExists { path: PathBuf },

    /// A lifecycle prerequisite of the step is not met.
    #[error("precondition failed: {requirement}")]
    Precondition { requirement: String },

    #[error(
        "plugin {plugin} does not support project version {project_version} (supported: {supported})"
    )]
    VersionMismatch {
        plugin: String,
        project_version: ProjectVersion,
        supported: String,
    },

    #[error("no plugin matches '{key}'")]
    PluginNotFound { key: String },

    #[error("'{key}' is ambiguous: matches {}", candidates.join(", "))]
    AmbiguousPlugin { key: String, candidates: Vec<String> },

    #[error("plugin {plugin} does not implement '{capability}'")]
    UnsupportedCapability {
        plugin: String,
        capability: Capability,
    },

    /// Shared in-memory state is unusable (a lock was poisoned).
    #[error("in-memory store lock poisoned")]
    StoreLockError,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FileNotFound { path } => vec![
                format!("Expected {} to have been generated by an earlier step", path.display()),
                "Run the command from the project root or pass --dir".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::Mutation { path, .. } => vec![
                format!(
                    "{} no longer contains the scaffold marker; it may have been edited by hand",
                    path.display()
                ),
                "Restore the marker comment or the file from version control".into(),
            ],
            Self::TemplateRender { .. } => vec![
                "Check that every required flag (--group, --version, --kind, --domain, --repo) was provided".into(),
            ],
            Self::FileExists { path } => vec![
                format!("Remove {} or pass --force to overwrite it", path.display()),
            ],
            Self::Precondition { .. } => vec![
                "Run the steps in order: init, create api, create webhook".into(),
                "Inspect the PROJECT file to see what has been scaffolded".into(),
            ],
            Self::VersionMismatch { supported, .. } => vec![
                format!("Use a plugin that supports project version {supported}"),
                "Try: kubeforge plugins".into(),
            ],
            Self::PluginNotFound { .. } | Self::AmbiguousPlugin { .. } => vec![
                "Try: kubeforge plugins to list the available plugins".into(),
                "Use the fully qualified key, e.g. go.kubeforge.io/v4".into(),
            ],
            Self::UnsupportedCapability { .. } => vec![
                "Choose a plugin that implements this subcommand (kubeforge plugins)".into(),
            ],
            Self::InvalidEncoding { .. } => vec!["Generated files are expected to be UTF-8".into()],
            Self::StoreLockError => vec!["A previous operation panicked; retry the command".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileNotFound { .. }
            | Self::PluginNotFound { .. }
            | Self::AmbiguousPlugin { .. } => ErrorCategory::NotFound,
            Self::Mutation { source, .. } if source.is_not_found() => ErrorCategory::NotFound,
            Self::Mutation { .. } | Self::UnsupportedCapability { .. } => {
                ErrorCategory::Compatibility
            }
            Self::TemplateRender { .. } | Self::FileExists { .. } | Self::Precondition { .. } => {
                ErrorCategory::Validation
            }
            Self::VersionMismatch { .. } => ErrorCategory::Configuration,
            Self::FilesystemError { .. } | Self::InvalidEncoding { .. } | Self::StoreLockError => {
                ErrorCategory::Internal
            }
        }
    }
}
