//! `base.go.kubeforge.io/v4`: Go sources of a controller-runtime project.

use std::sync::Arc;

use kubeforge_core::{
    application::{Filesystem, Plugin, ProjectStore, TemplateRenderer, Workspace},
    domain::{
        ApiSpec, Capability, CapabilitySet, GenerationContext, IfExists, Mutation, PluginKey,
        PluginVersion, ProjectVersion, RenderContext, ResourceEntry, ResourceId, StepPlan,
        WebhookSpec,
    },
    error::ForgeResult,
};
use tracing::{info, instrument};

use super::support::{
    MAIN_GO, begin_init, check_api_flags, check_webhook_flags, commit, fill, precondition, rel,
    require_api, require_resource,
};
use crate::builtin_templates::ids;

const SUPPORTED: &[ProjectVersion] = &[ProjectVersion::V3];

const IMPORTS_MARKER: &str = "// +kubeforge:scaffold:imports\n";
const SCHEME_MARKER: &str = "// +kubeforge:scaffold:scheme\n";
const BUILDER_MARKER: &str = "// +kubeforge:scaffold:builder\n";

const API_IMPORT: &str = "\t{{IMPORT_ALIAS}} \"{{API_IMPORT}}\"\n";
const SCHEME_REGISTRATION: &str = "\tutilruntime.Must({{IMPORT_ALIAS}}.AddToScheme(scheme))\n";
const CONTROLLER_IMPORT: &str = "\t{{CONTROLLER_ALIAS}} \"{{CONTROLLER_IMPORT}}\"\n";
const CONTROLLER_SETUP: &str = "\tif err := (&{{CONTROLLER_ALIAS}}.{{KIND}}Reconciler{
\t\tClient: mgr.GetClient(),
\t\tScheme: mgr.GetScheme(),
\t}).SetupWithManager(mgr); err != nil {
\t\tsetupLog.Error(err, \"unable to create controller\", \"controller\", \"{{KIND}}\")
\t\tos.Exit(1)
\t}
";
const WEBHOOK_IMPORT: &str = "\t{{WEBHOOK_ALIAS}} \"{{WEBHOOK_IMPORT}}\"\n";
const WEBHOOK_SETUP: &str = "\t// nolint:goconst
\tif os.Getenv(\"ENABLE_WEBHOOKS\") != \"false\" {
\t\tif err := {{WEBHOOK_ALIAS}}.Setup{{KIND}}WebhookWithManager(mgr); err != nil {
\t\t\tsetupLog.Error(err, \"unable to create webhook\", \"webhook\", \"{{KIND}}\")
\t\t\tos.Exit(1)
\t\t}
\t}
";

const DEFAULTER: &str = include_str!("../../templates/go/webhook_defaulter.go.tmpl");
const VALIDATOR: &str = include_str!("../../templates/go/webhook_validator.go.tmpl");
const ADMISSION: &str = "\t\"sigs.k8s.io/controller-runtime/pkg/webhook/admission\"";

/// Scaffolds `go.mod`, `cmd/main.go`, API types, controllers and webhooks,
/// and owns the resource entries of the `PROJECT` file.
pub struct GoPlugin {
    key: PluginKey,
    renderer: Arc<dyn TemplateRenderer>,
}

impl GoPlugin {
    pub const NAME: &'static str = "base.go.kubeforge.io";

    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> ForgeResult<Self> {
        Ok(Self {
            key: PluginKey::new(Self::NAME, PluginVersion::stable(4))?,
            renderer,
        })
    }

    fn init(&self, ctx: &GenerationContext, fs: &dyn Filesystem) -> ForgeResult<()> {
        let workspace = Workspace::new(fs, self.renderer.as_ref(), ctx.root());
        let store = ProjectStore::new(fs, ctx.root());
        let config = begin_init(&store, ctx, &self.key)?;
        let render = RenderContext::new(&config, ctx);

        let step = StepPlan {
            files: workspace.render_all(
                &[
                    ids::GO_MOD,
                    ids::GO_MAIN,
                    ids::GO_MAKEFILE,
                    ids::GO_DOCKERFILE,
                    ids::GO_BOILERPLATE,
                    ids::GO_GITIGNORE,
                ],
                &render,
            )?,
            ..StepPlan::default()
        };

        let report = commit(
            &workspace,
            &store,
            config,
            &step,
            &self.key,
            Capability::Init,
            None,
            ctx.flags().force,
        )?;
        info!(files = report.written.len(), "Go project scaffolded");
        Ok(())
    }

    fn create_api(&self, ctx: &GenerationContext, fs: &dyn Filesystem) -> ForgeResult<()> {
        let workspace = Workspace::new(fs, self.renderer.as_ref(), ctx.root());
        let store = ProjectStore::new(fs, ctx.root());
        let mut config = store.require()?;
        let flags = ctx.flags();
        let id = require_resource(ctx)?;
        check_api_flags(flags)?;

        if let Some(existing) = config.find_resource(&id) {
            if flags.resource && existing.has_api() && !flags.force {
                return Err(precondition(format!(
                    "API {id} already exists; pass --force to regenerate it"
                )));
            }
            if flags.controller && existing.controller && !flags.force {
                return Err(precondition(format!(
                    "a controller for {id} already exists; pass --force to regenerate it"
                )));
            }
        }

        let render = RenderContext::new(&config, ctx);
        let main = rel(MAIN_GO)?;
        let mut step = StepPlan::new();

        if flags.resource {
            step.files
                .extend(workspace.render_all(&[ids::GO_TYPES, ids::GO_GROUPVERSION], &render)?);
            step.mutations.push(Mutation::insert_once(
                main.clone(),
                IMPORTS_MARKER,
                fill(&render, "api import", API_IMPORT)?,
            ));
            step.mutations.push(Mutation::insert_once(
                main.clone(),
                SCHEME_MARKER,
                fill(&render, "scheme registration", SCHEME_REGISTRATION)?,
            ));
        }
        if flags.controller {
            step.files.push(workspace.render(ids::GO_CONTROLLER, &render)?);
            step.mutations.push(Mutation::insert_once(
                main.clone(),
                IMPORTS_MARKER,
                fill(&render, "controller import", CONTROLLER_IMPORT)?,
            ));
            step.mutations.push(Mutation::insert_once(
                main,
                BUILDER_MARKER,
                fill(&render, "controller setup", CONTROLLER_SETUP)?,
            ));
        }

        let mut entry = ResourceEntry::new(id.clone());
        entry.domain = config.domain().map(str::to_string);
        entry.plural = ctx.resource_plural();
        if flags.resource {
            entry.path = render.get("API_IMPORT").map(str::to_string);
            entry.api = Some(ApiSpec {
                crd_version: "v1".into(),
                namespaced: flags.namespaced,
            });
        }
        entry.controller = flags.controller;
        config.upsert_resource(entry);

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
        let mut config = store.require()?;
        let flags = ctx.flags();
        let id = require_resource(ctx)?;
        check_webhook_flags(flags)?;

        let existing = require_api(&config, &id)?.webhooks.clone();
        let (mut defaulting, mut validation) = (flags.defaulting, flags.programmatic_validation);
        if let Some(existing) = &existing {
            if !flags.force {
                if defaulting && existing.defaulting {
                    return Err(precondition(format!(
                        "a defaulting webhook for {id} already exists; pass --force to regenerate it"
                    )));
                }
                if validation && existing.validation {
                    return Err(precondition(format!(
                        "a validation webhook for {id} already exists; pass --force to regenerate it"
                    )));
                }
            }
            // The webhook file is regenerated as a whole, so it keeps what
            // was already there.
            defaulting |= existing.defaulting;
            validation |= existing.validation;
        }

        let base = RenderContext::new(&config, ctx).with_variable(
            "WEBHOOK_PATH_GROUP",
            render_group_path(&id, config.domain()),
        );
        let mut builder = String::new();
        if defaulting {
            builder.push_str(&fill(
                &base,
                "webhook builder",
                "\n\t\tWithDefaulter(&{{KIND}}CustomDefaulter{}).",
            )?);
        }
        if validation {
            builder.push_str(&fill(
                &base,
                "webhook builder",
                "\n\t\tWithValidator(&{{KIND}}CustomValidator{}).",
            )?);
        }
        let defaulter = if defaulting {
            fill(&base, "webhook defaulter", DEFAULTER)?
        } else {
            String::new()
        };
        let validator = if validation {
            fill(&base, "webhook validator", VALIDATOR)?
        } else {
            String::new()
        };
        let render = base
            .with_variable("ADMISSION_IMPORT", if validation { ADMISSION } else { "" })
            .with_variable("WEBHOOK_BUILDER", builder)
            .with_variable("WEBHOOK_DEFAULTER", defaulter)
            .with_variable("WEBHOOK_VALIDATOR", validator);

        let main = rel(MAIN_GO)?;
        let mut step = StepPlan::new();
        let mut webhook = workspace.render(ids::GO_WEBHOOK, &render)?;
        if existing.is_some() {
            webhook.if_exists = IfExists::Overwrite;
        }
        step.files.push(webhook);
        step.mutations.push(Mutation::insert_once(
            main.clone(),
            IMPORTS_MARKER,
            fill(&render, "webhook import", WEBHOOK_IMPORT)?,
        ));
        step.mutations.push(Mutation::insert_once(
            main,
            BUILDER_MARKER,
            fill(&render, "webhook setup", WEBHOOK_SETUP)?,
        ));

        let mut entry = ResourceEntry::new(id.clone());
        entry.webhooks = Some(WebhookSpec {
            defaulting,
            validation,
            webhook_version: "v1".into(),
        });
        config.upsert_resource(entry);

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
        let mut config = store.require()?;

        if ctx.flags().multigroup && !config.multigroup() {
            info!("enabling multigroup layout; new APIs go under api/<group>/<version>");
            config.set_multigroup(true);
        }

        commit(
            &workspace,
            &store,
            config,
            &StepPlan::new(),
            &self.key,
            Capability::Edit,
            None,
            ctx.flags().force,
        )?;
        Ok(())
    }
}

/// `batch` + `example.com` → `batch-example-com`, as used in webhook paths.
fn render_group_path(id: &ResourceId, domain: Option<&str>) -> String {
    id.qualified_group(domain.unwrap_or_default()).replace('.', "-")
}

impl Plugin for GoPlugin {
    fn key(&self) -> &PluginKey {
        &self.key
    }

    fn description(&self) -> &str {
        "Go sources for a controller-runtime manager: types, controllers, webhooks"
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
