//! `network-policy.kubeforge.io/v1-alpha`: an edit-only overlay that
//! protects the metrics and webhook endpoints with NetworkPolicies.

use std::sync::Arc;

use kubeforge_core::{
    application::{
        ApplicationError, Filesystem, Plugin, ProjectStore, TemplateRenderer, Workspace,
    },
    domain::{
        Capability, CapabilitySet, GenerationContext, Mutation, MutationPlan, PluginKey,
        PluginVersion, ProjectVersion, RenderContext, StepPlan,
    },
    error::ForgeResult,
};
use tracing::instrument;

use super::support::{DEFAULT_KUSTOMIZATION, commit, precondition, rel};
use crate::builtin_templates::ids;

const SUPPORTED: &[ProjectVersion] = &[ProjectVersion::V3];
const INCLUDE: &str = "#- ../network-policy\n";

pub struct NetworkPolicyPlugin {
    key: PluginKey,
    renderer: Arc<dyn TemplateRenderer>,
}

impl NetworkPolicyPlugin {
    pub const NAME: &'static str = "network-policy.kubeforge.io";

    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> ForgeResult<Self> {
        Ok(Self {
            key: PluginKey::new(Self::NAME, PluginVersion::alpha(1))?,
            renderer,
        })
    }

    fn edit(&self, ctx: &GenerationContext, fs: &dyn Filesystem) -> ForgeResult<()> {
        let workspace = Workspace::new(fs, self.renderer.as_ref(), ctx.root());
        let store = ProjectStore::new(fs, ctx.root());
        let config = store.require()?;
        let force = ctx.flags().force;

        let rerun = config.has_run(&self.key, Capability::Edit, None);
        if rerun && !force {
            return Err(precondition(
                "network policies are already enabled; pass --force to rewrite them",
            ));
        }

        // On a first run a kustomization without the commented include was
        // not produced by the kustomize plugin and is left alone. A forced
        // re-run finds the include already enabled.
        let mut include = Mutation::uncomment(rel(DEFAULT_KUSTOMIZATION)?, INCLUDE, "#");
        if rerun {
            include = include.skip_if_missing();
        }

        let render = RenderContext::new(&config, ctx);
        let step = StepPlan {
            files: workspace.render_all(
                &[
                    ids::NETWORK_POLICY,
                    ids::NETWORK_POLICY_METRICS,
                    ids::NETWORK_POLICY_WEBHOOK,
                ],
                &render,
            )?,
            mutations: MutationPlan::new().with(include),
        };

        commit(
            &workspace,
            &store,
            config,
            &step,
            &self.key,
            Capability::Edit,
            None,
            force,
        )?;
        Ok(())
    }
}

impl Plugin for NetworkPolicyPlugin {
    fn key(&self) -> &PluginKey {
        &self.key
    }

    fn description(&self) -> &str {
        "NetworkPolicies for the metrics and webhook endpoints"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::empty().with(Capability::Edit)
    }

    fn supported_project_versions(&self) -> &[ProjectVersion] {
        SUPPORTED
    }

    #[instrument(skip_all, fields(plugin = %self.key, capability = %capability))]
    fn scaffold(
        &self,
        capability: Capability,
        ctx: &GenerationContext,
        fs: &dyn Filesystem,
    ) -> ForgeResult<()> {
        match capability {
            Capability::Edit => self.edit(ctx, fs),
            other => Err(ApplicationError::UnsupportedCapability {
                plugin: self.key.to_string(),
                capability: other,
            }
            .into()),
        }
        .map_err(|e| e.in_plugin(self.key.clone()))
    }
}
