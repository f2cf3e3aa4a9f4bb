//! Explicitly constructed set of available plugins.
//!
//! There is no global registration: the command layer builds a registry,
//! resolves the user's `--plugins` value against it and hands the result to
//! the [`Scaffolder`](kubeforge_core::application::Scaffolder).

use std::sync::Arc;

use kubeforge_core::{
    application::{ApplicationError, Bundle, Plugin, TemplateRenderer},
    domain::{PluginKey, PluginVersion},
    error::{ForgeError, ForgeResult},
};
use tracing::debug;

use crate::plugins::{GoPlugin, KustomizePlugin, NetworkPolicyPlugin, go_bundle};

/// Key of the bundle assembled from a comma-separated `--plugins` list.
const COMPOSED: &str = "composed.kubeforge.io";

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in plugin and bundle.
    pub fn builtin(renderer: Arc<dyn TemplateRenderer>) -> ForgeResult<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(go_bundle(Arc::clone(&renderer))?))?;
        registry.register(Arc::new(GoPlugin::new(Arc::clone(&renderer))?))?;
        registry.register(Arc::new(KustomizePlugin::new(Arc::clone(&renderer))?))?;
        registry.register(Arc::new(NetworkPolicyPlugin::new(renderer)?))?;
        Ok(registry)
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> ForgeResult<()> {
        if self.plugins.iter().any(|p| p.key() == plugin.key()) {
            return Err(ForgeError::Configuration {
                message: format!("plugin {} is registered twice", plugin.key()),
            });
        }
        debug!(plugin = %plugin.key(), "registered plugin");
        self.plugins.push(plugin);
        Ok(())
    }

    /// Find the plugin selected by a full or short key.
    ///
    /// An exact key always wins; otherwise the query must select exactly one
    /// plugin.
    pub fn resolve(&self, query: &str) -> ForgeResult<Arc<dyn Plugin>> {
        let query = query.trim();
        if let Some(plugin) = self.plugins.iter().find(|p| p.key().to_string() == query) {
            return Ok(Arc::clone(plugin));
        }

        let matches: Vec<&Arc<dyn Plugin>> =
            self.plugins.iter().filter(|p| p.key().matches(query)).collect();
        match matches.as_slice() {
            [] => Err(ApplicationError::PluginNotFound {
                key: query.to_string(),
            }
            .into()),
            [plugin] => Ok(Arc::clone(plugin)),
            many => Err(ApplicationError::AmbiguousPlugin {
                key: query.to_string(),
                candidates: many.iter().map(|p| p.key().to_string()).collect(),
            }
            .into()),
        }
    }

    /// Resolve a `--plugins` list. One entry is returned as is; several are
    /// chained into an ad-hoc bundle in the given order, unless a registered
    /// bundle has exactly those members.
    pub fn compose<S: AsRef<str>>(&self, queries: &[S]) -> ForgeResult<Arc<dyn Plugin>> {
        let members = queries
            .iter()
            .map(|q| self.resolve(q.as_ref()))
            .collect::<ForgeResult<Vec<_>>>()?;

        match members.len() {
            0 => Err(ForgeError::Configuration {
                message: "no plugins selected".into(),
            }),
            1 => Ok(Arc::clone(&members[0])),
            _ => {
                if let Some(bundle) = self
                    .plugins
                    .iter()
                    .find(|p| same_members(p.members(), &members))
                {
                    return Ok(Arc::clone(bundle));
                }
                let bundle = Bundle::builder(PluginKey::new(COMPOSED, PluginVersion::stable(1))?)
                    .description("plugins chained from the command line")
                    .members(members)
                    .build()?;
                Ok(Arc::new(bundle))
            }
        }
    }

    pub fn list(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }
}

fn same_members(a: &[Arc<dyn Plugin>], b: &[Arc<dyn Plugin>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.key() == y.key())
}
