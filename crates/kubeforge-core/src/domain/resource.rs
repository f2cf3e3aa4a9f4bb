//! Resource identity (group, version, kind) and its derived names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::DomainError,
    naming::{pluralize, to_go_identifier},
};

/// Identity of an API resource.
///
/// Invariant: every field has passed [`ResourceId::new`] validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    group: String,
    version: String,
    kind: String,
}

impl ResourceId {
    /// Build a validated resource identity.
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let group = group.into();
        let version = version.into();
        let kind = kind.into();

        validate_group(&group)?;
        validate_version(&version)?;
        validate_kind(&kind)?;

        Ok(Self {
            group,
            version,
            kind,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// `CronJob` → `cronjob`.
    pub fn kind_lower(&self) -> String {
        self.kind.to_lowercase()
    }

    /// Default plural resource name: `CronJob` → `cronjobs`.
    pub fn default_plural(&self) -> String {
        pluralize(&self.kind_lower())
    }

    /// Go import alias for the API package: `batch` + `v1` → `batchv1`.
    pub fn import_alias(&self) -> String {
        format!("{}{}", to_go_identifier(&self.group), self.version)
    }

    /// Fully qualified group: `batch` + `example.com` → `batch.example.com`.
    pub fn qualified_group(&self, domain: &str) -> String {
        if domain.is_empty() {
            self.group.clone()
        } else {
            format!("{}.{}", self.group, domain)
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}

pub(crate) fn validate_group(group: &str) -> Result<(), DomainError> {
    let invalid = |reason: &str| DomainError::InvalidResource {
        field: "group",
        value: group.to_string(),
        reason: reason.to_string(),
    };

    if group.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if group.len() > 63 {
        return Err(invalid("must be at most 63 characters"));
    }
    if !group
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid("may only contain lowercase letters, digits, '-' and '.'"));
    }
    if !group.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(invalid("must start with a lowercase letter"));
    }
    if group.ends_with(['-', '.']) {
        return Err(invalid("must end with a letter or digit"));
    }
    Ok(())
}

/// Versions follow `v<N>` optionally followed by `alpha<N>` or `beta<N>`.
pub(crate) fn validate_version(version: &str) -> Result<(), DomainError> {
    let invalid = || DomainError::InvalidResource {
        field: "version",
        value: version.to_string(),
        reason: "must match v<N>[alpha<N>|beta<N>]".to_string(),
    };

    let rest = version.strip_prefix('v').ok_or_else(invalid)?;
    let major_len = rest.chars().take_while(char::is_ascii_digit).count();
    if major_len == 0 || rest.starts_with('0') {
        return Err(invalid());
    }

    let stage = &rest[major_len..];
    if stage.is_empty() {
        return Ok(());
    }

    let number = stage
        .strip_prefix("alpha")
        .or_else(|| stage.strip_prefix("beta"))
        .ok_or_else(invalid)?;
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) || number.starts_with('0')
    {
        return Err(invalid());
    }
    Ok(())
}

pub(crate) fn validate_kind(kind: &str) -> Result<(), DomainError> {
    let invalid = |reason: &str| DomainError::InvalidResource {
        field: "kind",
        value: kind.to_string(),
        reason: reason.to_string(),
    };

    if kind.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if !kind.starts_with(|c: char| c.is_ascii_uppercase()) {
        return Err(invalid("must start with an uppercase letter"));
    }
    if !kind.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("may only contain letters and digits"));
    }
    Ok(())
}
