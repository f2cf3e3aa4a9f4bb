//! `kubeforge edit`: project-wide changes after init.

use tracing::{instrument, warn};

use kubeforge_core::{
    domain::{Capability, FeatureFlags, GenerationContext},
    error::ForgeError,
};

use crate::{
    cli::{EditArgs, GlobalArgs},
    commands::{build_registry, execute_step, project_layout, project_root, select_plugin},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(dir = %global.dir.display()))]
pub fn execute(
    args: EditArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let root = project_root(&global.dir, false)?;

    let requested = args.multigroup
        || args.restricted_pod_standards
        || args.prometheus
        || args.disable_metrics
        || !args.plugins.plugins.is_empty();
    if !requested {
        warn!("edit called without any change requested");
        output.warning(
            "Nothing to change: pass --multigroup, --restricted-pod-standards, --prometheus, \
             --disable-metrics or --plugins",
        )?;
        return Ok(());
    }

    let ctx = GenerationContext::builder(&root)
        .flags(FeatureFlags {
            multigroup: args.multigroup,
            restricted_pod_standards: args.restricted_pod_standards,
            prometheus: args.prometheus,
            disable_metrics: args.disable_metrics,
            force: args.force,
            ..FeatureFlags::default()
        })
        .build()
        .map_err(ForgeError::from)?;

    let registry = build_registry(&config)?;
    let layout = project_layout(&root, &config)?;
    let plugin = select_plugin(&registry, &args.plugins.plugins, &layout)?;

    output.header(&format!("Editing project in {}", root.display()))?;
    execute_step(plugin.as_ref(), Capability::Edit, &ctx, &global, &output)
}
