//! `kubeforge create api` and `kubeforge create webhook`.

use tracing::instrument;

use kubeforge_core::{
    domain::{Capability, FeatureFlags, GenerationContext, GenerationContextBuilder},
    error::ForgeError,
};

use crate::{
    cli::{CreateApiArgs, CreateCommands, CreateWebhookArgs, GlobalArgs, ResourceArgs},
    commands::{build_registry, execute_step, project_layout, project_root, select_plugin},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    command: CreateCommands,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    match command {
        CreateCommands::Api(args) => api(args, global, config, output),
        CreateCommands::Webhook(args) => webhook(args, global, config, output),
    }
}

#[instrument(skip_all, fields(kind = %args.resource_id.kind))]
fn api(
    args: CreateApiArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let root = project_root(&global.dir, false)?;

    let flags = FeatureFlags {
        namespaced: args.namespaced,
        resource: args.resource,
        controller: args.controller,
        force: args.force,
        ..FeatureFlags::default()
    };
    let mut builder = with_resource(GenerationContext::builder(&root), &args.resource_id);
    if let Some(plural) = &args.plural {
        builder = builder.plural(plural.as_str());
    }
    let ctx = builder.flags(flags).build().map_err(ForgeError::from)?;

    let registry = build_registry(&config)?;
    let layout = project_layout(&root, &config)?;
    let plugin = select_plugin(&registry, &args.plugins.plugins, &layout)?;

    output.header(&format!("Creating API {}", describe(&args.resource_id)))?;
    execute_step(plugin.as_ref(), Capability::CreateApi, &ctx, &global, &output)
}

#[instrument(skip_all, fields(kind = %args.resource_id.kind))]
fn webhook(
    args: CreateWebhookArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let root = project_root(&global.dir, false)?;

    let flags = FeatureFlags {
        defaulting: args.defaulting,
        programmatic_validation: args.programmatic_validation,
        force: args.force,
        ..FeatureFlags::default()
    };
    let ctx = with_resource(GenerationContext::builder(&root), &args.resource_id)
        .flags(flags)
        .build()
        .map_err(ForgeError::from)?;

    let registry = build_registry(&config)?;
    let layout = project_layout(&root, &config)?;
    let plugin = select_plugin(&registry, &args.plugins.plugins, &layout)?;

    output.header(&format!("Creating webhook for {}", describe(&args.resource_id)))?;
    execute_step(plugin.as_ref(), Capability::CreateWebhook, &ctx, &global, &output)
}

fn with_resource(builder: GenerationContextBuilder, id: &ResourceArgs) -> GenerationContextBuilder {
    builder
        .group(id.group.as_str())
        .version(id.api_version.as_str())
        .kind(id.kind.as_str())
}

fn describe(id: &ResourceArgs) -> String {
    format!("{}/{} {}", id.group, id.api_version, id.kind)
}
