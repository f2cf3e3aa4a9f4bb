//! Helpers shared by the built-in plugins.

use kubeforge_core::{
    application::{ApplicationError, ProjectStore, StepReport, Workspace},
    domain::{
        Capability, FeatureFlags, GenerationContext, PluginKey, ProjectConfig, RelativePath,
        RenderContext, ResourceEntry, ResourceId, StepPlan,
    },
    error::{ForgeError, ForgeResult},
};
use tracing::debug;

pub(crate) const MAIN_GO: &str = "cmd/main.go";
pub(crate) const DEFAULT_KUSTOMIZATION: &str = "config/default/kustomization.yaml";
pub(crate) const MANAGER_YAML: &str = "config/manager/manager.yaml";

pub(crate) fn precondition(requirement: impl Into<String>) -> ForgeError {
    ApplicationError::Precondition {
        requirement: requirement.into(),
    }
    .into()
}

pub(crate) fn rel(path: &str) -> ForgeResult<RelativePath> {
    Ok(RelativePath::new(path)?)
}

/// The configuration an init step starts from.
///
/// A bundle's later members find the `PROJECT` file written by the earlier
/// ones and add to it; running the same plugin's init twice is refused.
pub(crate) fn begin_init(
    store: &ProjectStore<'_>,
    ctx: &GenerationContext,
    key: &PluginKey,
) -> ForgeResult<ProjectConfig> {
    let mut config = match store.load()? {
        Some(config) if config.has_run(key, Capability::Init, None) => {
            return Err(precondition(format!(
                "{key} already initialized this project ({} exists)",
                store.path().display()
            )));
        }
        Some(config) => config,
        None => ProjectConfig::new(ctx.project_version()),
    };

    if config.domain().is_none() {
        let domain = ctx
            .domain()
            .ok_or_else(|| precondition("a domain is required to initialize a project (--domain)"))?;
        config.set_domain(domain);
    }
    if config.project_name().is_none() {
        if let Some(name) = ctx.project_name() {
            config.set_project_name(name);
        }
    }
    if config.repo().is_none() {
        let repo = match (ctx.repo(), config.domain(), config.project_name()) {
            (Some(repo), _, _) => Some(repo.to_string()),
            (None, Some(domain), Some(name)) => Some(format!("{domain}/{name}")),
            _ => None,
        };
        if let Some(repo) = repo {
            config.set_repo(repo);
        }
    }
    config.add_layout(key);
    Ok(config)
}

/// Group, version and kind of the step, all of which must be given.
pub(crate) fn require_resource(ctx: &GenerationContext) -> ForgeResult<ResourceId> {
    ctx.resource()
        .ok_or_else(|| precondition("group, version and kind are required (--group, --version, --kind)"))
}

/// The recorded resource, which must already have an API.
pub(crate) fn require_api<'c>(
    config: &'c ProjectConfig,
    id: &ResourceId,
) -> ForgeResult<&'c ResourceEntry> {
    config
        .find_resource(id)
        .filter(|entry| entry.has_api())
        .ok_or_else(|| {
            precondition(format!(
                "no API recorded for {id}; run `kubeforge create api` first"
            ))
        })
}

pub(crate) fn check_api_flags(flags: &FeatureFlags) -> ForgeResult<()> {
    if flags.resource || flags.controller {
        Ok(())
    } else {
        Err(precondition(
            "nothing to scaffold: enable --resource and/or --controller",
        ))
    }
}

pub(crate) fn check_webhook_flags(flags: &FeatureFlags) -> ForgeResult<()> {
    if flags.defaulting || flags.programmatic_validation {
        Ok(())
    } else {
        Err(precondition(
            "nothing to scaffold: enable --defaulting and/or --programmatic-validation",
        ))
    }
}

/// Render an inline fragment (a marker payload, a nested snippet) strictly.
pub(crate) fn fill(render: &RenderContext, what: &str, text: &str) -> ForgeResult<String> {
    render.render_strict(text).map_err(|names| {
        ApplicationError::TemplateRender {
            template: what.to_string(),
            reason: format!("unresolved placeholder(s): {}", names.join(", ")),
        }
        .into()
    })
}

/// Execute `step`, then record the plugin run and persist the configuration.
///
/// The `PROJECT` file is only written once every file and mutation of the
/// step succeeded.
#[allow(clippy::too_many_arguments)]
pub(crate) fn commit(
    workspace: &Workspace<'_>,
    store: &ProjectStore<'_>,
    mut config: ProjectConfig,
    step: &StepPlan,
    key: &PluginKey,
    capability: Capability,
    resource: Option<ResourceId>,
    force: bool,
) -> ForgeResult<StepReport> {
    let report = workspace.execute(step, force)?;
    config.record_plugin(key, capability, resource);
    store.save(&config)?;
    debug!(
        plugin = %key,
        written = report.written.len(),
        skipped = report.skipped.len(),
        "step committed"
    );
    Ok(report)
}
