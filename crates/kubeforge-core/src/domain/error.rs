// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (errors are carried through plugin and bundle wrappers)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("invalid {field} '{value}': {reason}")]
    InvalidResource {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid domain '{value}': {reason}")]
    InvalidDomain { value: String, reason: String },

    #[error("invalid plugin key '{key}': {reason}")]
    InvalidPluginKey { key: String, reason: String },

    #[error("invalid project version '{0}'")]
    InvalidProjectVersion(String),

    #[error("path '{path}' must be relative to the project root")]
    InvalidPath { path: String },

    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },

    #[error("bundle '{bundle}' is invalid: {reason}")]
    InvalidBundle { bundle: String, reason: String },

    // ========================================================================
    // Project configuration
    // ========================================================================
    #[error("resource {resource} is already recorded in the project")]
    DuplicateResource { resource: String },

    #[error("unable to parse PROJECT file: {reason}")]
    ProjectConfigParse { reason: String },

    #[error("unable to serialize PROJECT file: {reason}")]
    ProjectConfigSerialize { reason: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidResource { field, .. } => match *field {
                "group" => vec![
                    "Groups are lowercase DNS labels, e.g. 'batch' or 'apps'".into(),
                ],
                "version" => vec![
                    "Versions look like v1, v2beta1 or v1alpha2".into(),
                ],
                "kind" => vec![
                    "Kinds are PascalCase identifiers, e.g. 'CronJob'".into(),
                ],
                _ => vec!["Check the resource flags (--group, --version, --kind)".into()],
            },
            Self::InvalidDomain { .. } => vec![
                "Domains are lowercase DNS names, e.g. 'example.com'".into(),
            ],
            Self::InvalidPluginKey { .. } => vec![
                "Plugin keys have the form <name>/<version>, e.g. go.kubeforge.io/v4".into(),
                "Try: kubeforge plugins to list the available plugins".into(),
            ],
            Self::MissingRequiredField { field } => vec![format!(
                "Provide --{} on the command line or in the config file",
                field.replace('_', "-")
            )],
            Self::DuplicateResource { resource } => vec![
                format!("{} already exists in the PROJECT file", resource),
                "Use --force to scaffold it again".into(),
            ],
            Self::ProjectConfigParse { .. } => vec![
                "The PROJECT file is generated; restore it from version control".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidResource { .. }
            | Self::InvalidDomain { .. }
            | Self::InvalidPluginKey { .. }
            | Self::InvalidProjectVersion(_)
            | Self::InvalidPath { .. }
            | Self::MissingRequiredField { .. } => ErrorCategory::Validation,
            Self::DuplicateResource { .. } => ErrorCategory::Compatibility,
            Self::ProjectConfigParse { .. } => ErrorCategory::Configuration,
            Self::InvalidBundle { .. } | Self::ProjectConfigSerialize { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Configuration,
    Internal,
}
