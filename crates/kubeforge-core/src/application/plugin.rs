//! The plugin contract and ordered composition of plugins into bundles.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ports::Filesystem};
use crate::domain::{
    Capability, CapabilitySet, DomainError, GenerationContext, PluginKey, ProjectVersion,
};
use crate::error::{ForgeError, ForgeResult};

/// A versioned unit of scaffolding logic.
///
/// Plugins are stateless: everything they know about the project comes from
/// the context and from what they read through the filesystem. A plugin
/// checks its own preconditions and wraps any failure with its key.
pub trait Plugin: Send + Sync {
    fn key(&self) -> &PluginKey;

    fn description(&self) -> &str {
        ""
    }

    fn capabilities(&self) -> CapabilitySet;

    fn supported_project_versions(&self) -> &[ProjectVersion];

    /// Run one capability against the project tree.
    fn scaffold(
        &self,
        capability: Capability,
        ctx: &GenerationContext,
        fs: &dyn Filesystem,
    ) -> ForgeResult<()>;

    fn implements(&self, capability: Capability) -> bool {
        self.capabilities().contains(capability)
    }

    fn supports(&self, version: ProjectVersion) -> bool {
        self.supported_project_versions().contains(&version)
    }

    /// Member plugins, in execution order. Empty for leaf plugins.
    fn members(&self) -> &[Arc<dyn Plugin>] {
        &[]
    }
}

impl fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("key", &self.key().to_string())
            .field("capabilities", &self.capabilities().to_string())
            .finish()
    }
}

/// An ordered sequence of plugins exposed as a single plugin.
///
/// Its capabilities are the union of its members', its supported project
/// versions the intersection. Members run strictly in order; the first
/// failure aborts the bundle and earlier members are not undone.
pub struct Bundle {
    key: PluginKey,
    description: String,
    members: Vec<Arc<dyn Plugin>>,
    capabilities: CapabilitySet,
    versions: Vec<ProjectVersion>,
}

impl Bundle {
    pub fn builder(key: PluginKey) -> BundleBuilder {
        BundleBuilder {
            key,
            description: String::new(),
            members: Vec::new(),
        }
    }
}

impl Plugin for Bundle {
    fn key(&self) -> &PluginKey {
        &self.key
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    fn supported_project_versions(&self) -> &[ProjectVersion] {
        &self.versions
    }

    #[instrument(skip_all, fields(bundle = %self.key, capability = %capability))]
    fn scaffold(
        &self,
        capability: Capability,
        ctx: &GenerationContext,
        fs: &dyn Filesystem,
    ) -> ForgeResult<()> {
        if !self.implements(capability) {
            return Err(ApplicationError::UnsupportedCapability {
                plugin: self.key.to_string(),
                capability,
            }
            .into());
        }

        for (index, member) in self.members.iter().enumerate() {
            if !member.implements(capability) {
                debug!(member = %member.key(), "member does not implement capability, skipping");
                continue;
            }

            debug!(member = %member.key(), step = index + 1, "running bundle member");
            member
                .scaffold(capability, ctx, fs)
                .map_err(|source| ForgeError::Bundle {
                    bundle: self.key.clone(),
                    step: index + 1,
                    member: member.key().clone(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    fn members(&self) -> &[Arc<dyn Plugin>] {
        &self.members
    }
}

/// Builder for [`Bundle`].
pub struct BundleBuilder {
    key: PluginKey,
    description: String,
    members: Vec<Arc<dyn Plugin>>,
}

impl BundleBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn member(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.members.push(plugin);
        self
    }

    pub fn members(mut self, plugins: impl IntoIterator<Item = Arc<dyn Plugin>>) -> Self {
        self.members.extend(plugins);
        self
    }

    /// Validate the composition.
    ///
    /// A bundle needs at least one member, no member twice, and at least one
    /// project version every member supports.
    pub fn build(self) -> Result<Bundle, DomainError> {
        let invalid = |reason: String| DomainError::InvalidBundle {
            bundle: self.key.to_string(),
            reason,
        };

        let Some(first) = self.members.first() else {
            return Err(invalid("a bundle needs at least one member".into()));
        };

        for (i, member) in self.members.iter().enumerate() {
            if self.members[..i].iter().any(|m| m.key() == member.key()) {
                return Err(invalid(format!("{} is listed twice", member.key())));
            }
        }

        let capabilities = self
            .members
            .iter()
            .fold(CapabilitySet::empty(), |acc, m| acc.union(m.capabilities()));

        let versions: Vec<ProjectVersion> = first
            .supported_project_versions()
            .iter()
            .copied()
            .filter(|v| self.members.iter().all(|m| m.supports(*v)))
            .collect();
        if versions.is_empty() {
            return Err(invalid("members share no supported project version".into()));
        }

        Ok(Bundle {
            key: self.key,
            description: self.description,
            members: self.members,
            capabilities,
            versions,
        })
    }
}
