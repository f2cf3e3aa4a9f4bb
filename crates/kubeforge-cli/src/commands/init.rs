//! `kubeforge init`: lay out a new operator project.
//!
//! Responsibility: translate CLI arguments and configured defaults into a
//! `GenerationContext` and run the selected plugin's init. No business logic
//! lives here.

use chrono::Datelike;
use tracing::{debug, instrument};

use kubeforge_core::{
    domain::{Capability, FeatureFlags, GenerationContext, ProjectVersion},
    error::ForgeError,
};

use crate::{
    cli::{GlobalArgs, InitArgs},
    commands::{build_registry, execute_step, project_root, select_plugin},
    config::AppConfig,
    error::{CliResult, IntoCli},
    output::OutputManager,
};

#[instrument(skip_all, fields(dir = %global.dir.display()))]
pub fn execute(
    args: InitArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let root = project_root(&global.dir, true)?;
    if !global.dry_run {
        std::fs::create_dir_all(&root)
            .with_cli_context(|| format!("failed to create '{}'", root.display()))?;
    }

    let ctx = build_context(&args, &config, &root)?;
    debug!(
        domain = ctx.domain().unwrap_or("none"),
        project = ctx.project_name().unwrap_or("none"),
        version = %ctx.project_version(),
        "context resolved"
    );

    let registry = build_registry(&config)?;
    let plugin = select_plugin(&registry, &args.plugins.plugins, &config.defaults.plugins)?;

    output.header(&format!("Initializing project in {}", root.display()))?;
    execute_step(plugin.as_ref(), Capability::Init, &ctx, &global, &output)?;

    if !global.dry_run {
        output.print("")?;
        output.print("Next steps:")?;
        output.print("  kubeforge create api --group <group> --version <version> --kind <Kind>")?;
    }
    Ok(())
}

fn build_context(
    args: &InitArgs,
    config: &AppConfig,
    root: &std::path::Path,
) -> CliResult<GenerationContext> {
    let version = args
        .project_version
        .unwrap_or(ProjectVersion::new(config.defaults.project_version));

    let mut builder = GenerationContext::builder(root)
        .project_version(version)
        .year(chrono::Local::now().year())
        .flags(FeatureFlags {
            restricted_pod_standards: args.restricted_pod_standards,
            ..FeatureFlags::default()
        });

    let configured = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
    if let Some(domain) = args.domain.clone().or_else(|| configured(&config.defaults.domain)) {
        builder = builder.domain(domain.as_str());
    }
    if let Some(owner) = args.owner.clone().or_else(|| configured(&config.defaults.owner)) {
        builder = builder.owner(owner.as_str());
    }
    if let Some(repo) = &args.repo {
        builder = builder.repo(repo.as_str());
    }
    if let Some(name) = &args.project_name {
        builder = builder.project_name(name.as_str());
    }

    Ok(builder.build().map_err(ForgeError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PluginSelection;
    use std::path::Path;

    fn args() -> InitArgs {
        InitArgs {
            domain: None,
            repo: None,
            project_name: None,
            owner: None,
            plugins: PluginSelection::default(),
            project_version: None,
            restricted_pod_standards: false,
        }
    }

    #[test]
    fn flags_win_over_configured_defaults() {
        let mut config = AppConfig::default();
        config.defaults.domain = Some("example.org".into());
        config.defaults.owner = Some("Acme".into());

        let mut args = args();
        args.domain = Some("example.com".into());

        let ctx = build_context(&args, &config, Path::new("/work/cronjob")).unwrap();
        assert_eq!(ctx.domain(), Some("example.com"));
        assert_eq!(ctx.owner(), Some("Acme"));
        assert_eq!(ctx.project_name(), Some("cronjob"));
        assert_eq!(ctx.project_version(), ProjectVersion::V3);
        assert!(ctx.year().is_some());
    }

    #[test]
    fn invalid_domain_is_a_user_error() {
        let mut args = args();
        args.domain = Some("Example..com".into());
        let err = build_context(&args, &AppConfig::default(), Path::new("/work/x")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
