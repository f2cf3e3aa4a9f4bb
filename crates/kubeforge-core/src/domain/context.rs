//! Per-invocation generation parameters.

use std::path::{Path, PathBuf};

use crate::domain::{
    error::DomainError,
    naming::to_kebab_case,
    plugin_key::ProjectVersion,
    resource::{ResourceId, validate_group, validate_kind, validate_version},
};

/// Boolean switches shared by every subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub namespaced: bool,
    pub resource: bool,
    pub controller: bool,
    pub defaulting: bool,
    pub programmatic_validation: bool,
    pub restricted_pod_standards: bool,
    pub multigroup: bool,
    /// Include the Prometheus ServiceMonitor in the default overlay.
    pub prometheus: bool,
    /// Drop the metrics service and its manager patch from the default overlay.
    pub disable_metrics: bool,
    pub force: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            namespaced: true,
            resource: true,
            controller: true,
            defaulting: false,
            programmatic_validation: false,
            restricted_pod_standards: false,
            multigroup: false,
            prometheus: false,
            disable_metrics: false,
            force: false,
        }
    }
}

/// Immutable parameters for one scaffolding step.
///
/// Group, version and kind are optional individually: a partially specified
/// resource is representable so that templates needing the missing piece
/// fail at render time with the name of what is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationContext {
    root: PathBuf,
    project_version: ProjectVersion,
    domain: Option<String>,
    repo: Option<String>,
    project_name: Option<String>,
    owner: Option<String>,
    year: Option<i32>,
    group: Option<String>,
    version: Option<String>,
    kind: Option<String>,
    plural: Option<String>,
    flags: FeatureFlags,
}

impl GenerationContext {
    pub fn builder(root: impl Into<PathBuf>) -> GenerationContextBuilder {
        GenerationContextBuilder::new(root.into())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_version(&self) -> ProjectVersion {
        self.project_version
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn plural(&self) -> Option<&str> {
        self.plural.as_deref()
    }

    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    /// The resource identity, when group, version and kind are all set.
    pub fn resource(&self) -> Option<ResourceId> {
        match (&self.group, &self.version, &self.kind) {
            (Some(g), Some(v), Some(k)) => ResourceId::new(g, v, k).ok(),
            _ => None,
        }
    }

    /// Plural resource name: the override when given, otherwise derived.
    pub fn resource_plural(&self) -> Option<String> {
        self.plural
            .clone()
            .or_else(|| self.resource().map(|r| r.default_plural()))
    }
}

/// Builder for [`GenerationContext`].
#[derive(Debug, Clone)]
pub struct GenerationContextBuilder {
    inner: GenerationContext,
}

impl GenerationContextBuilder {
    fn new(root: PathBuf) -> Self {
        Self {
            inner: GenerationContext {
                root,
                project_version: ProjectVersion::default(),
                domain: None,
                repo: None,
                project_name: None,
                owner: None,
                year: None,
                group: None,
                version: None,
                kind: None,
                plural: None,
                flags: FeatureFlags::default(),
            },
        }
    }

    pub fn project_version(mut self, version: ProjectVersion) -> Self {
        self.inner.project_version = version;
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.inner.domain = non_empty(domain.into());
        self
    }

    pub fn repo(mut self, repo: impl Into<String>) -> Self {
        self.inner.repo = non_empty(repo.into());
        self
    }

    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.inner.project_name = non_empty(name.into());
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.inner.owner = non_empty(owner.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.inner.year = Some(year);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.inner.group = non_empty(group.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.inner.version = non_empty(version.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.inner.kind = non_empty(kind.into());
        self
    }

    pub fn plural(mut self, plural: impl Into<String>) -> Self {
        self.inner.plural = non_empty(plural.into());
        self
    }

    pub fn flags(mut self, flags: FeatureFlags) -> Self {
        self.inner.flags = flags;
        self
    }

    /// Validate whatever was provided and freeze the context.
    ///
    /// A missing project name is derived from the root directory name.
    pub fn build(mut self) -> Result<GenerationContext, DomainError> {
        if let Some(domain) = &self.inner.domain {
            validate_domain(domain)?;
        }
        if let Some(group) = &self.inner.group {
            validate_group(group)?;
        }
        if let Some(version) = &self.inner.version {
            validate_version(version)?;
        }
        if let Some(kind) = &self.inner.kind {
            validate_kind(kind)?;
        }

        if self.inner.project_name.is_none() {
            self.inner.project_name = self
                .inner
                .root
                .file_name()
                .map(|n| to_kebab_case(&n.to_string_lossy()))
                .and_then(non_empty);
        }

        Ok(self.inner)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Domains are lowercase DNS names (`example.com`, `tutorial.kubebuilder.io`).
pub fn validate_domain(domain: &str) -> Result<(), DomainError> {
    let invalid = |reason: &str| DomainError::InvalidDomain {
        value: domain.to_string(),
        reason: reason.to_string(),
    };

    if domain.len() > 253 {
        return Err(invalid("must be at most 253 characters"));
    }
    for label in domain.split('.') {
        if label.is_empty() {
            return Err(invalid("must not contain empty labels"));
        }
        if label.len() > 63 {
            return Err(invalid("labels must be at most 63 characters"));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid("may only contain lowercase letters, digits, '-' and '.'"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("labels must start and end with a letter or digit"));
        }
    }
    Ok(())
}
