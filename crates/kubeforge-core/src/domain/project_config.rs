//! The `PROJECT` file: persisted record of how a project was scaffolded.
//!
//! Every plugin step reads it to check its preconditions and writes it back
//! with what it did. Resource entries are unique per (group, version, kind).

use serde::{Deserialize, Serialize};

use crate::domain::{
    capability::Capability, error::DomainError, plugin_key::PluginKey,
    plugin_key::ProjectVersion, resource::ResourceId,
};

/// File name of the project configuration, relative to the project root.
pub const PROJECT_FILE: &str = "PROJECT";

const HEADER: &str = "# Code generated by kubeforge. DO NOT EDIT.\n\
# This file tracks the information used to scaffold the project\n\
# so that later plugin steps can find what earlier ones produced.\n";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    version: ProjectVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    layout: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    multigroup: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    resources: Vec<ResourceEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    plugins: Vec<PluginRecord>,
}

/// One scaffolded resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    #[serde(flatten)]
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    /// Go import path of the API package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiSpec>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub controller: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhooks: Option<WebhookSpec>,
}

impl ResourceEntry {
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            domain: None,
            plural: None,
            path: None,
            api: None,
            controller: false,
            webhooks: None,
        }
    }

    pub fn has_api(&self) -> bool {
        self.api.is_some()
    }

    /// Fold a later record for the same resource into this one.
    ///
    /// Flags only ever turn on; descriptive fields keep their first value.
    fn merge(&mut self, other: ResourceEntry) {
        self.domain = self.domain.take().or(other.domain);
        self.plural = self.plural.take().or(other.plural);
        self.path = self.path.take().or(other.path);
        self.api = self.api.take().or(other.api);
        self.controller |= other.controller;
        self.webhooks = match (self.webhooks.take(), other.webhooks) {
            (Some(mut mine), Some(theirs)) => {
                mine.defaulting |= theirs.defaulting;
                mine.validation |= theirs.validation;
                Some(mine)
            }
            (mine, theirs) => mine.or(theirs),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpec {
    pub crd_version: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub namespaced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSpec {
    #[serde(default, skip_serializing_if = "is_false")]
    pub defaulting: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub validation: bool,
    pub webhook_version: String,
}

/// History entry appended by every leaf plugin step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub key: String,
    pub capability: Capability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceId>,
}

/// Lifecycle position derived from the recorded resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProjectStage {
    Uninitialized,
    Initialized,
    ApiAdded,
    WebhookAdded,
}

impl ProjectStage {
    /// Stage of a project given its (possibly absent) configuration.
    pub fn of(config: Option<&ProjectConfig>) -> Self {
        config.map_or(Self::Uninitialized, ProjectConfig::stage)
    }
}

impl ProjectConfig {
    pub fn new(version: ProjectVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Parse a PROJECT file, rejecting duplicate resource entries.
    pub fn from_yaml(text: &str) -> Result<Self, DomainError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| DomainError::ProjectConfigParse {
                reason: e.to_string(),
            })?;

        for (i, entry) in config.resources.iter().enumerate() {
            if config.resources[..i].iter().any(|r| r.id == entry.id) {
                return Err(DomainError::DuplicateResource {
                    resource: entry.id.to_string(),
                });
            }
        }
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, DomainError> {
        let body =
            serde_yaml::to_string(self).map_err(|e| DomainError::ProjectConfigSerialize {
                reason: e.to_string(),
            })?;
        Ok(format!("{HEADER}{body}"))
    }

    pub fn version(&self) -> ProjectVersion {
        self.version
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.domain = Some(domain.into());
    }

    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    pub fn set_repo(&mut self, repo: impl Into<String>) {
        self.repo = Some(repo.into());
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.project_name = Some(name.into());
    }

    pub fn layout(&self) -> &[String] {
        &self.layout
    }

    /// Record a plugin key in the init layout (no duplicates).
    pub fn add_layout(&mut self, key: &PluginKey) {
        let key = key.to_string();
        if !self.layout.contains(&key) {
            self.layout.push(key);
        }
    }

    pub fn multigroup(&self) -> bool {
        self.multigroup
    }

    pub fn set_multigroup(&mut self, multigroup: bool) {
        self.multigroup = multigroup;
    }

    pub fn resources(&self) -> &[ResourceEntry] {
        &self.resources
    }

    pub fn find_resource(&self, id: &ResourceId) -> Option<&ResourceEntry> {
        self.resources.iter().find(|r| &r.id == id)
    }

    /// Insert a resource or merge it into the existing entry with the same
    /// identity. Returns `true` when the entry is new.
    pub fn upsert_resource(&mut self, entry: ResourceEntry) -> bool {
        match self.resources.iter_mut().find(|r| r.id == entry.id) {
            Some(existing) => {
                existing.merge(entry);
                false
            }
            None => {
                self.resources.push(entry);
                true
            }
        }
    }

    pub fn plugins(&self) -> &[PluginRecord] {
        &self.plugins
    }

    pub fn record_plugin(
        &mut self,
        key: &PluginKey,
        capability: Capability,
        resource: Option<ResourceId>,
    ) {
        self.plugins.push(PluginRecord {
            key: key.to_string(),
            capability,
            resource,
        });
    }

    /// Whether `key` already ran `capability` (for `resource`, if given).
    pub fn has_run(
        &self,
        key: &PluginKey,
        capability: Capability,
        resource: Option<&ResourceId>,
    ) -> bool {
        let key = key.to_string();
        self.plugins.iter().any(|p| {
            p.key == key
                && p.capability == capability
                && (resource.is_none() || p.resource.as_ref() == resource)
        })
    }

    pub fn stage(&self) -> ProjectStage {
        if self.resources.iter().any(|r| r.webhooks.is_some()) {
            ProjectStage::WebhookAdded
        } else if self.resources.iter().any(ResourceEntry::has_api) {
            ProjectStage::ApiAdded
        } else {
            ProjectStage::Initialized
        }
    }

    pub fn edits_applied(&self) -> bool {
        self.plugins.iter().any(|p| p.capability == Capability::Edit)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plugin_key::PluginVersion;
    use pretty_assertions::assert_eq;

    fn cronjob() -> ResourceId {
        ResourceId::new("batch", "v1", "CronJob").unwrap()
    }

    fn sample() -> ProjectConfig {
        let mut config = ProjectConfig::new(ProjectVersion::V3);
        config.set_domain("example.com");
        config.set_repo("example.com/cronjob");
        config.set_project_name("cronjob");
        let mut entry = ResourceEntry::new(cronjob());
        entry.api = Some(ApiSpec {
            crd_version: "v1".into(),
            namespaced: true,
        });
        entry.controller = true;
        config.upsert_resource(entry);
        config
    }

    #[test]
    fn yaml_round_trip() {
        let config = sample();
        let text = config.to_yaml().unwrap();
        assert!(text.starts_with("# Code generated by kubeforge"));
        assert!(text.contains("projectName: cronjob"));
        assert!(text.contains("crdVersion: v1"));
        assert!(text.contains("kind: CronJob"));

        let back = ProjectConfig::from_yaml(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn upsert_merges_flags_and_keeps_gvk_unique() {
        let mut config = sample();
        let mut webhook = ResourceEntry::new(cronjob());
        webhook.webhooks = Some(WebhookSpec {
            defaulting: true,
            validation: false,
            webhook_version: "v1".into(),
        });
        assert!(!config.upsert_resource(webhook));

        assert_eq!(config.resources().len(), 1);
        let entry = config.find_resource(&cronjob()).unwrap();
        assert!(entry.has_api());
        assert!(entry.controller);
        assert!(entry.webhooks.as_ref().unwrap().defaulting);
        assert_eq!(config.stage(), ProjectStage::WebhookAdded);
    }

    #[test]
    fn duplicate_entries_are_rejected_on_load() {
        let text = "version: \"3\"\nresources:\n- group: batch\n  version: v1\n  kind: CronJob\n- group: batch\n  version: v1\n  kind: CronJob\n";
        assert!(matches!(
            ProjectConfig::from_yaml(text),
            Err(DomainError::DuplicateResource { .. })
        ));
    }

    #[test]
    fn plugin_history() {
        let key = PluginKey::new("base.go.kubeforge.io", PluginVersion::stable(4)).unwrap();
        let mut config = ProjectConfig::new(ProjectVersion::V3);
        config.record_plugin(&key, Capability::CreateApi, Some(cronjob()));

        assert!(config.has_run(&key, Capability::CreateApi, Some(&cronjob())));
        assert!(config.has_run(&key, Capability::CreateApi, None));
        assert!(!config.has_run(&key, Capability::Edit, None));
        assert!(!config.edits_applied());

        let other = ResourceId::new("batch", "v2", "CronJob").unwrap();
        assert!(!config.has_run(&key, Capability::CreateApi, Some(&other)));
    }

    #[test]
    fn stages() {
        assert_eq!(ProjectStage::of(None), ProjectStage::Uninitialized);
        let config = ProjectConfig::new(ProjectVersion::V3);
        assert_eq!(ProjectStage::of(Some(&config)), ProjectStage::Initialized);
        assert_eq!(sample().stage(), ProjectStage::ApiAdded);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            ProjectConfig::from_yaml("version: [1, 2"),
            Err(DomainError::ProjectConfigParse { .. })
        ));
    }
}
