//! Unified error handling for kubeforge core.
//!
//! [`ForgeError`] wraps domain and application errors and adds the plugin
//! and bundle context a failure travelled through, so a marker that went
//! missing three plugins deep still names the file, the plugin and the
//! bundle step.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{DomainError, PatchError, PluginKey};

pub use crate::domain::ErrorCategory;

/// Root error type for kubeforge core operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForgeError {
    /// Invalid input values.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Orchestration failures (filesystem, markers, preconditions).
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Failure inside a plugin.
    #[error("plugin {plugin}: {source}")]
    Plugin {
        plugin: PluginKey,
        #[source]
        source: Box<ForgeError>,
    },

    /// Failure of one member of a bundle. Earlier members are not undone.
    #[error("bundle {bundle} step {step} ({member}): {source}")]
    Bundle {
        bundle: PluginKey,
        step: usize,
        member: PluginKey,
        #[source]
        source: Box<ForgeError>,
    },

    /// Configuration or setup errors.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

/// Root-cause classification of a [`ForgeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MarkerNotFound,
    TextNotFound,
    RegionNotCommented,
    FileNotFound,
    Io,
    TemplateRender,
    FileExists,
    Precondition,
    VersionMismatch,
    PluginNotFound,
    UnsupportedCapability,
    InvalidInput,
    Config,
    Internal,
}

impl ForgeError {
    /// Wrap with the key of the plugin the error escaped from.
    pub fn in_plugin(self, plugin: PluginKey) -> Self {
        Self::Plugin {
            plugin,
            source: Box::new(self),
        }
    }

    /// The innermost error, past every plugin and bundle wrapper.
    pub fn root_cause(&self) -> &ForgeError {
        match self {
            Self::Plugin { source, .. } | Self::Bundle { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Classification of the root cause.
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Self::Domain(e) => match e {
                DomainError::ProjectConfigParse { .. } | DomainError::ProjectConfigSerialize { .. } => {
                    ErrorKind::Config
                }
                DomainError::DuplicateResource { .. } => ErrorKind::Precondition,
                DomainError::InvalidBundle { .. } => ErrorKind::Internal,
                _ => ErrorKind::InvalidInput,
            },
            Self::Application(e) => match e {
                ApplicationError::FileNotFound { .. } => ErrorKind::FileNotFound,
                ApplicationError::FilesystemError { .. }
                | ApplicationError::InvalidEncoding { .. } => ErrorKind::Io,
                ApplicationError::Mutation { source, .. } => match source {
                    PatchError::MarkerNotFound { .. } => ErrorKind::MarkerNotFound,
                    PatchError::TextNotFound { .. } => ErrorKind::TextNotFound,
                    PatchError::RegionNotCommented { .. } => ErrorKind::RegionNotCommented,
                },
                ApplicationError::TemplateRender { .. } => ErrorKind::TemplateRender,
                ApplicationError::FileExists { .. } => ErrorKind::FileExists,
                ApplicationError::Precondition { .. } => ErrorKind::Precondition,
                ApplicationError::VersionMismatch { .. } => ErrorKind::VersionMismatch,
                ApplicationError::PluginNotFound { .. }
                | ApplicationError::AmbiguousPlugin { .. } => ErrorKind::PluginNotFound,
                ApplicationError::UnsupportedCapability { .. } => ErrorKind::UnsupportedCapability,
                ApplicationError::StoreLockError => ErrorKind::Internal,
            },
            Self::Configuration { .. } => ErrorKind::Config,
            Self::Internal { .. } | Self::Plugin { .. } | Self::Bundle { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Plugin keys the error passed through, outermost first.
    pub fn plugin_chain(&self) -> Vec<&PluginKey> {
        let mut chain = Vec::new();
        let mut current = self;
        loop {
            match current {
                Self::Plugin { plugin, source } => {
                    chain.push(plugin);
                    current = source.as_ref();
                }
                Self::Bundle {
                    bundle,
                    member,
                    source,
                    ..
                } => {
                    chain.push(bundle);
                    chain.push(member);
                    current = source.as_ref();
                }
                _ => return chain,
            }
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self.root_cause() {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check the config file and KUBEFORGE_* environment variables".into(),
            ],
            _ => vec!["This appears to be a bug in kubeforge; please report it".into()],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self.root_cause() {
            Self::Domain(e) => e.category(),
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            _ => ErrorCategory::Internal,
        }
    }
}

/// Convenient result type alias.
pub type ForgeResult<T> = Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::domain::{MutationKind, PluginVersion};

    fn key(name: &str) -> PluginKey {
        PluginKey::new(name, PluginVersion::stable(4)).unwrap()
    }

    fn marker_error() -> ForgeError {
        ApplicationError::Mutation {
            path: PathBuf::from("cmd/main.go"),
            operation: MutationKind::InsertAfter,
            source: PatchError::MarkerNotFound {
                anchor: "// +kubeforge:scaffold:scheme".into(),
            },
        }
        .into()
    }

    #[test]
    fn kind_walks_through_wrappers() {
        let err = ForgeError::Bundle {
            bundle: key("go.kubeforge.io"),
            step: 2,
            member: key("base.go.kubeforge.io"),
            source: Box::new(marker_error().in_plugin(key("base.go.kubeforge.io"))),
        };

        assert_eq!(err.kind(), ErrorKind::MarkerNotFound);
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.plugin_chain().len(), 3);

        let message = err.to_string();
        assert!(message.contains("go.kubeforge.io/v4 step 2"));
        assert!(message.contains("cmd/main.go"));
        assert!(message.contains("+kubeforge:scaffold:scheme"));
    }

    #[test]
    fn suggestions_come_from_root_cause() {
        let err = marker_error().in_plugin(key("base.go.kubeforge.io"));
        assert!(err.suggestions().iter().any(|s| s.contains("marker")));
    }

    #[test]
    fn domain_errors_are_invalid_input() {
        let err: ForgeError = DomainError::InvalidDomain {
            value: "X".into(),
            reason: "bad".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.category(), ErrorCategory::Validation);
    }
}
