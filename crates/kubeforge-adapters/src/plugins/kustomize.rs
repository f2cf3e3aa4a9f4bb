//! `kustomize.common.kubeforge.io/v2`: kustomize manifests under `config/`.

use std::sync::Arc;

use kubeforge_core::{
    application::{Filesystem, Plugin, ProjectStore, TemplateRenderer, Workspace},
    domain::{
        Capability, CapabilitySet, GenerationContext, Mutation, MutationPlan, PluginKey,
        PluginVersion, ProjectVersion, RelativePath, RenderContext, StepPlan,
    },
    error::ForgeResult,
};
use tracing::{debug, instrument};

use super::support::{
    DEFAULT_KUSTOMIZATION, MANAGER_YAML, begin_init, check_api_flags, check_webhook_flags,
    commit, fill, precondition, rel, require_resource,
};
use crate::builtin_templates::ids;

const SUPPORTED: &[ProjectVersion] = &[ProjectVersion::V3];

const CRD_KUSTOMIZATION: &str = "config/crd/kustomization.yaml";
const SAMPLES_KUSTOMIZATION: &str = "config/samples/kustomization.yaml";
const RBAC_KUSTOMIZATION: &str = "config/rbac/kustomization.yaml";

const CRD_MARKER: &str = "# +kubeforge:scaffold:crdkustomizeresource\n";
const SAMPLES_MARKER: &str = "# +kubeforge:scaffold:manifestskustomizesamples\n";
const RBAC_MARKER: &str = "# +kubeforge:scaffold:rbackustomizeresource\n";

const CRD_ENTRY: &str = "- bases/{{QUALIFIED_GROUP}}_{{KIND_PLURAL}}.yaml\n";
const SAMPLE_ENTRY: &str = "- {{GROUP}}_{{VERSION}}_{{KIND_LOWER}}.yaml\n";
const ROLE_ENTRIES: &str = "- {{KIND_LOWER}}_editor_role.yaml\n- {{KIND_LOWER}}_viewer_role.yaml\n";

const WEBHOOK_INCLUDE: &str = "#- ../webhook\n";
const CERTMANAGER_INCLUDE: &str = "#- ../certmanager\n";
const WEBHOOK_PATCH: &str = "#- path: manager_webhook_patch.yaml\n#  target:\n#    kind: Deployment\n";
const PROMETHEUS_INCLUDE: &str = "#- ../prometheus\n";
const METRICS_SERVICE: &str = "- metrics_service.yaml\n";
const METRICS_PATCH: &str = "- path: manager_metrics_patch.yaml\n  target:\n    kind: Deployment\n";

/// cert-manager CA injection: points the serving certificate's DNS names at
/// the webhook service.
const CERTMANAGER_REPLACEMENTS: &str = "#replacements:\n\
# - source: # Uncomment the following block if you have any webhook\n\
#     kind: Service\n\
#     version: v1\n\
#     name: webhook-service\n\
#     fieldPath: .metadata.name # Name of the service\n\
#   targets:\n\
#     - select:\n\
#         kind: Certificate\n\
#         group: cert-manager.io\n\
#         version: v1\n\
#         name: serving-cert\n\
#       fieldPaths:\n\
#         - .spec.dnsNames.0\n\
#         - .spec.dnsNames.1\n\
#       options:\n\
#         delimiter: '.'\n\
#         index: 0\n\
#         create: true\n\
# - source:\n\
#     kind: Service\n\
#     version: v1\n\
#     name: webhook-service\n\
#     fieldPath: .metadata.namespace # Namespace of the service\n\
#   targets:\n\
#     - select:\n\
#         kind: Certificate\n\
#         group: cert-manager.io\n\
#         version: v1\n\
#         name: serving-cert\n\
#       fieldPaths:\n\
#         - .spec.dnsNames.0\n\
#         - .spec.dnsNames.1\n\
#       options:\n\
#         delimiter: '.'\n\
#         index: 1\n\
#         create: true\n";

/// Commented `seccompProfile` block of the manager deployment.
pub(crate) const SECCOMP_COMMENTED: &str =
    "        # seccompProfile:\n        #   type: RuntimeDefault\n";
pub(crate) const SECCOMP_ENABLED: &str = "        seccompProfile:\n          type: RuntimeDefault\n";

/// Scaffolds the kustomize layout and keeps its kustomizations in sync with
/// the APIs and webhooks of the project.
pub struct KustomizePlugin {
    key: PluginKey,
    renderer: Arc<dyn TemplateRenderer>,
}

impl KustomizePlugin {
    pub const NAME: &'static str = "kustomize.common.kubeforge.io";

    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> ForgeResult<Self> {
        Ok(Self {
            key: PluginKey::new(Self::NAME, PluginVersion::stable(2))?,
            renderer,
        })
    }

    fn init(&self, ctx: &GenerationContext, fs: &dyn Filesystem) -> ForgeResult<()> {
        let workspace = Workspace::new(fs, self.renderer.as_ref(), ctx.root());
        let store = ProjectStore::new(fs, ctx.root());
        let config = begin_init(&store, ctx, &self.key)?;
        let render = RenderContext::new(&config, ctx);

        let mut step = StepPlan::new();
        step.files = workspace.render_all(
            &[
                ids::KUSTOMIZE_DEFAULT,
                ids::KUSTOMIZE_METRICS_PATCH,
                ids::KUSTOMIZE_METRICS_SERVICE,
                ids::KUSTOMIZE_MANAGER_KUSTOMIZATION,
                ids::KUSTOMIZE_MANAGER,
                ids::KUSTOMIZE_RBAC,
                ids::KUSTOMIZE_RBAC_ROLE,
                ids::KUSTOMIZE_RBAC_ROLE_BINDING,
                ids::KUSTOMIZE_RBAC_SERVICE_ACCOUNT,
                ids::KUSTOMIZE_PROMETHEUS,
                ids::KUSTOMIZE_PROMETHEUS_MONITOR,
                ids::KUSTOMIZE_CERTMANAGER,
                ids::KUSTOMIZE_CERTMANAGER_ISSUER,
                ids::KUSTOMIZE_CERTMANAGER_CERTIFICATE,
            ],
            &render,
        )?;
        if ctx.flags().restricted_pod_standards {
            step.mutations = restricted_pod_standards()?;
        }

        commit(
            &workspace,
            &store,
            config,
            &step,
            &self.key,
            Capability::Init,
            None,
            ctx.flags().force,
        )?;
        Ok(())
    }

    fn create_api(&self, ctx: &GenerationContext, fs: &dyn Filesystem) -> ForgeResult<()> {
        let workspace = Workspace::new(fs, self.renderer.as_ref(), ctx.root());
        let store = ProjectStore::new(fs, ctx.root());
        let config = store.require()?;
        let flags = ctx.flags();
        let id = require_resource(ctx)?;
        check_api_flags(flags)?;

        // Only a run that wrote manifests is recorded, so a controller-only
        // run does not block a later `--resource`.
        if !flags.resource {
            debug!("no resource requested, no manifests to scaffold");
            return Ok(());
        }
        if config.has_run(&self.key, Capability::CreateApi, Some(&id)) && !flags.force {
            return Err(precondition(format!(
                "manifests for {id} already exist; pass --force to regenerate them"
            )));
        }

        let render = RenderContext::new(&config, ctx);
        let step = StepPlan {
            files: workspace.render_all(
                &[
                    ids::KUSTOMIZE_CRD,
                    ids::KUSTOMIZE_SAMPLES,
                    ids::KUSTOMIZE_SAMPLE,
                    ids::KUSTOMIZE_EDITOR_ROLE,
                    ids::KUSTOMIZE_VIEWER_ROLE,
                ],
                &render,
            )?,
            mutations: MutationPlan::new()
                .with(Mutation::insert_once(
                    rel(CRD_KUSTOMIZATION)?,
                    CRD_MARKER,
                    fill(&render, "crd entry", CRD_ENTRY)?,
                ))
                .with(Mutation::insert_once(
                    rel(SAMPLES_KUSTOMIZATION)?,
                    SAMPLES_MARKER,
                    fill(&render, "sample entry", SAMPLE_ENTRY)?,
                ))
                .with(Mutation::insert_once(
                    rel(RBAC_KUSTOMIZATION)?,
                    RBAC_MARKER,
                    fill(&render, "role entries", ROLE_ENTRIES)?,
                )),
        };

        commit(
            &workspace,
            &store,
            config,
            &step,
            &self.key,
            Capability::CreateApi,
            Some(id),
            flags.force,
        )?;
        Ok(())
    }

    fn create_webhook(&self, ctx: &GenerationContext, fs: &dyn Filesystem) -> ForgeResult<()> {
        let workspace = Workspace::new(fs, self.renderer.as_ref(), ctx.root());
        let store = ProjectStore::new(fs, ctx.root());
        let config = store.require()?;
        let flags = ctx.flags();
        let id = require_resource(ctx)?;
        check_webhook_flags(flags)?;

        if !config.has_run(&self.key, Capability::CreateApi, Some(&id)) {
            return Err(precondition(format!(
                "no manifests recorded for {id}; run `kubeforge create api` first"
            )));
        }

        let render = RenderContext::new(&config, ctx);
        let default = rel(DEFAULT_KUSTOMIZATION)?;
        let step = StepPlan {
            files: workspace.render_all(
                &[
                    ids::KUSTOMIZE_WEBHOOK,
                    ids::KUSTOMIZE_WEBHOOK_SERVICE,
                    ids::KUSTOMIZE_WEBHOOK_CONFIG,
                    ids::KUSTOMIZE_MANAGER_WEBHOOK_PATCH,
                ],
                &render,
            )?,
            // A second webhook finds these already uncommented.
            mutations: MutationPlan::new()
                .with(uncomment(&default, WEBHOOK_INCLUDE).skip_if_missing())
                .with(uncomment(&default, CERTMANAGER_INCLUDE).skip_if_missing())
                .with(uncomment(&default, WEBHOOK_PATCH).skip_if_missing())
                .with(uncomment(&default, CERTMANAGER_REPLACEMENTS).skip_if_missing()),
        };

        commit(
            &workspace,
            &store,
            config,
            &step,
            &self.key,
            Capability::CreateWebhook,
            Some(id),
            flags.force,
        )?;
        Ok(())
    }

    fn edit(&self, ctx: &GenerationContext, fs: &dyn Filesystem) -> ForgeResult<()> {
        let workspace = Workspace::new(fs, self.renderer.as_ref(), ctx.root());
        let store = ProjectStore::new(fs, ctx.root());
        let config = store.require()?;
        let flags = ctx.flags();
        let default = rel(DEFAULT_KUSTOMIZATION)?;

        // Every option is a no-op when already in effect.
        let mut step = StepPlan::new();
        if flags.restricted_pod_standards {
            step.mutations = restricted_pod_standards()?;
        }
        if flags.prometheus {
            step.mutations
                .push(uncomment(&default, PROMETHEUS_INCLUDE).skip_if_missing());
        }
        if flags.disable_metrics {
            step.mutations.push(
                Mutation::comment(default.clone(), METRICS_SERVICE, "#").skip_if_missing(),
            );
            step.mutations
                .push(Mutation::comment(default, METRICS_PATCH, "#").skip_if_missing());
        }

        commit(
            &workspace,
            &store,
            config,
            &step,
            &self.key,
            Capability::Edit,
            None,
            flags.force,
        )?;
        Ok(())
    }
}

fn uncomment(path: &RelativePath, region: &str) -> Mutation {
    Mutation::uncomment(path.clone(), region, "#")
}

/// Enable the `RuntimeDefault` seccomp profile of the manager pod. Already
/// enabled is not an error.
fn restricted_pod_standards() -> ForgeResult<MutationPlan> {
    Ok(MutationPlan::new().with(
        Mutation::replace(rel(MANAGER_YAML)?, SECCOMP_COMMENTED, SECCOMP_ENABLED).skip_if_missing(),
    ))
}

impl Plugin for KustomizePlugin {
    fn key(&self) -> &PluginKey {
        &self.key
    }

    fn description(&self) -> &str {
        "Kustomize manifests: manager, RBAC, CRDs, samples, webhooks"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::all()
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
            Capability::Init => self.init(ctx, fs),
            Capability::CreateApi => self.create_api(ctx, fs),
            Capability::CreateWebhook => self.create_webhook(ctx, fs),
            Capability::Edit => self.edit(ctx, fs),
        }
        .map_err(|e| e.in_plugin(self.key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeforge_core::domain::FeatureFlags;
    use kubeforge_core::error::ErrorKind;
    use pretty_assertions::assert_eq;

    use crate::filesystem::MemoryFilesystem;
    use crate::renderer::SimpleRenderer;

    const ROOT: &str = "/work/cronjob";

    fn plugin() -> KustomizePlugin {
        KustomizePlugin::new(Arc::new(SimpleRenderer::new())).unwrap()
    }

    fn ctx(flags: FeatureFlags) -> GenerationContext {
        GenerationContext::builder(ROOT)
            .domain("example.com")
            .group("batch")
            .version("v1")
            .kind("CronJob")
            .flags(flags)
            .build()
            .unwrap()
    }

    fn webhook_flags() -> FeatureFlags {
        FeatureFlags {
            defaulting: true,
            ..FeatureFlags::default()
        }
    }

    fn read(fs: &MemoryFilesystem, rel: &str) -> String {
        fs.read_file(format!("{ROOT}/{rel}"))
            .unwrap_or_else(|| panic!("{rel} was not written"))
    }

    fn initialized() -> (KustomizePlugin, MemoryFilesystem) {
        let fs = MemoryFilesystem::new();
        let plugin = plugin();
        plugin
            .scaffold(Capability::Init, &ctx(FeatureFlags::default()), &fs)
            .unwrap();
        (plugin, fs)
    }

    #[test]
    fn init_writes_config_tree() {
        let (_, fs) = initialized();
        let default = read(&fs, DEFAULT_KUSTOMIZATION);
        assert!(default.starts_with("# Adds namespace to all resources.\nnamespace: cronjob-system\n"));
        assert!(read(&fs, MANAGER_YAML).contains(SECCOMP_COMMENTED));
        assert!(read(&fs, RBAC_KUSTOMIZATION).contains(RBAC_MARKER));
    }

    #[test]
    fn create_api_inserts_after_markers() {
        let (plugin, fs) = initialized();
        plugin
            .scaffold(Capability::CreateApi, &ctx(FeatureFlags::default()), &fs)
            .unwrap();

        assert!(read(&fs, CRD_KUSTOMIZATION).ends_with(
            "resources:\n# +kubeforge:scaffold:crdkustomizeresource\n- bases/batch.example.com_cronjobs.yaml\n"
        ));
        assert!(
            read(&fs, SAMPLES_KUSTOMIZATION)
                .contains("# +kubeforge:scaffold:manifestskustomizesamples\n- batch_v1_cronjob.yaml\n")
        );
        assert!(read(&fs, RBAC_KUSTOMIZATION).ends_with(
            "# +kubeforge:scaffold:rbackustomizeresource\n- cronjob_editor_role.yaml\n- cronjob_viewer_role.yaml\n"
        ));
        assert!(read(&fs, "config/samples/batch_v1_cronjob.yaml").contains("kind: CronJob\n"));
    }

    #[test]
    fn marker_engine_fails_closed_when_marker_was_removed() {
        let (plugin, fs) = initialized();
        fs.seed(format!("{ROOT}/{CRD_KUSTOMIZATION}"), "resources: []\n")
            .unwrap();

        let err = plugin
            .scaffold(Capability::CreateApi, &ctx(FeatureFlags::default()), &fs)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MarkerNotFound);
        assert_eq!(read(&fs, CRD_KUSTOMIZATION), "resources: []\n");
    }

    #[test]
    fn webhook_uncomments_includes_and_tolerates_a_second_webhook() {
        let (plugin, fs) = initialized();
        plugin
            .scaffold(Capability::CreateApi, &ctx(FeatureFlags::default()), &fs)
            .unwrap();
        plugin
            .scaffold(Capability::CreateWebhook, &ctx(webhook_flags()), &fs)
            .unwrap();

        let default = read(&fs, DEFAULT_KUSTOMIZATION);
        assert!(default.contains("\n- ../webhook\n"));
        assert!(default.contains("\n- ../certmanager\n"));
        assert!(default.contains("\n- path: manager_webhook_patch.yaml\n  target:\n    kind: Deployment\n"));
        assert!(default.contains("#- ../prometheus\n"));

        plugin
            .scaffold(Capability::CreateWebhook, &ctx(webhook_flags()), &fs)
            .unwrap();
        assert_eq!(read(&fs, DEFAULT_KUSTOMIZATION), default);
    }

    #[test]
    fn controller_only_run_leaves_room_for_manifests() {
        let (plugin, fs) = initialized();
        let controller_only = FeatureFlags {
            resource: false,
            ..FeatureFlags::default()
        };
        plugin
            .scaffold(Capability::CreateApi, &ctx(controller_only), &fs)
            .unwrap();
        assert!(!read(&fs, CRD_KUSTOMIZATION).contains("cronjobs.yaml"));

        let resource_only = FeatureFlags {
            controller: false,
            ..FeatureFlags::default()
        };
        plugin
            .scaffold(Capability::CreateApi, &ctx(resource_only), &fs)
            .unwrap();
        assert!(read(&fs, CRD_KUSTOMIZATION).contains("- bases/batch.example.com_cronjobs.yaml\n"));

        let err = plugin
            .scaffold(Capability::CreateApi, &ctx(resource_only), &fs)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn webhook_enables_certmanager_replacements() {
        let (plugin, fs) = initialized();
        plugin
            .scaffold(Capability::CreateApi, &ctx(FeatureFlags::default()), &fs)
            .unwrap();
        plugin
            .scaffold(Capability::CreateWebhook, &ctx(webhook_flags()), &fs)
            .unwrap();

        let default = read(&fs, DEFAULT_KUSTOMIZATION);
        assert!(default.contains("\nreplacements:\n - source: # Uncomment"));
        assert!(default.contains("     fieldPath: .metadata.namespace # Namespace of the service\n"));
        assert!(!default.contains("#         create: true"));
    }

    #[test]
    fn webhook_before_api_is_a_precondition_failure() {
        let (plugin, fs) = initialized();
        let err = plugin
            .scaffold(Capability::CreateWebhook, &ctx(webhook_flags()), &fs)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn edit_enables_seccomp_profile() {
        let (plugin, fs) = initialized();
        let flags = FeatureFlags {
            restricted_pod_standards: true,
            ..FeatureFlags::default()
        };
        plugin.scaffold(Capability::Edit, &ctx(flags), &fs).unwrap();

        let manager = read(&fs, MANAGER_YAML);
        assert!(manager.contains(SECCOMP_ENABLED));
        assert!(!manager.contains(SECCOMP_COMMENTED));

        // Running it again leaves the file as it is.
        plugin.scaffold(Capability::Edit, &ctx(flags), &fs).unwrap();
        assert_eq!(read(&fs, MANAGER_YAML), manager);
    }

    #[test]
    fn edit_enables_prometheus_monitor() {
        let (plugin, fs) = initialized();
        let flags = FeatureFlags {
            prometheus: true,
            ..FeatureFlags::default()
        };
        plugin.scaffold(Capability::Edit, &ctx(flags), &fs).unwrap();

        let default = read(&fs, DEFAULT_KUSTOMIZATION);
        assert!(default.contains("\n- ../prometheus\n"));
        assert!(!default.contains("#- ../prometheus"));
        assert!(read(&fs, "config/prometheus/monitor.yaml").contains("kind: ServiceMonitor"));

        plugin.scaffold(Capability::Edit, &ctx(flags), &fs).unwrap();
        assert_eq!(read(&fs, DEFAULT_KUSTOMIZATION), default);
    }

    #[test]
    fn edit_can_disable_metrics() {
        let (plugin, fs) = initialized();
        let flags = FeatureFlags {
            disable_metrics: true,
            ..FeatureFlags::default()
        };
        plugin.scaffold(Capability::Edit, &ctx(flags), &fs).unwrap();

        let default = read(&fs, DEFAULT_KUSTOMIZATION);
        assert!(default.contains("\n#- metrics_service.yaml\n"));
        assert!(default.contains(
            "\n#- path: manager_metrics_patch.yaml\n#  target:\n#    kind: Deployment\n"
        ));

        plugin.scaffold(Capability::Edit, &ctx(flags), &fs).unwrap();
        assert_eq!(read(&fs, DEFAULT_KUSTOMIZATION), default);
    }
}
