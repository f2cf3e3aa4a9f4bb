//! Command handlers.
//!
//! Each scaffolding handler turns its flags into a
//! [`GenerationContext`], picks a plugin from the registry and hands both to
//! [`execute_step`]. Plugins and the scaffolder do the rest.

pub mod completions;
pub mod create;
pub mod edit;
pub mod init;
pub mod plugins;
pub mod version;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use kubeforge_adapters::{
    DryRunFilesystem, FilesystemTemplateLoader, LocalFilesystem, PluginRegistry, SimpleRenderer,
    filesystem::ChangeKind,
};
use kubeforge_core::{
    application::{Filesystem, Plugin, ProjectStore, Scaffolder},
    domain::{Capability, GenerationContext},
};

use crate::{
    cli::GlobalArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Registry of the built-in plugins, rendering through the configured
/// template overrides if any.
pub(crate) fn build_registry(config: &AppConfig) -> CliResult<PluginRegistry> {
    let mut renderer = SimpleRenderer::new();

    if let Some(dir) = &config.templates.dir {
        debug!(dir = %dir.display(), "loading template overrides");
        let overrides = FilesystemTemplateLoader::new(dir)
            .load_all()
            .map_err(|e| CliError::ConfigError {
                message: format!("failed to load templates from '{}'", dir.display()),
                source: Some(Box::new(e)),
            })?;
        renderer = renderer
            .with_overrides(overrides)
            .map_err(|e| CliError::ConfigError {
                message: format!("invalid template override in '{}'", dir.display()),
                source: Some(Box::new(e)),
            })?;
    }

    Ok(PluginRegistry::builtin(Arc::new(renderer))?)
}

/// Absolute project root. `init` may name a directory that does not exist
/// yet; every other command needs an existing one.
pub(crate) fn project_root(dir: &Path, may_create: bool) -> CliResult<PathBuf> {
    if dir.is_dir() {
        return std::fs::canonicalize(dir)
            .with_cli_context(|| format!("failed to resolve '{}'", dir.display()));
    }
    if dir.exists() {
        return Err(CliError::InvalidInput {
            message: format!("'{}' is not a directory", dir.display()),
            source: None,
        });
    }
    if !may_create {
        return Err(CliError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    std::path::absolute(dir).with_cli_context(|| format!("failed to resolve '{}'", dir.display()))
}

/// The plugin chain for a command: `--plugins` if given, else `fallback`.
pub(crate) fn select_plugin(
    registry: &PluginRegistry,
    explicit: &[String],
    fallback: &[String],
) -> CliResult<Arc<dyn Plugin>> {
    let keys = if explicit.is_empty() { fallback } else { explicit };
    Ok(registry.compose(keys)?)
}

/// Plugins recorded in the project's layout, falling back to the configured
/// defaults for a PROJECT file that lists none.
pub(crate) fn project_layout(root: &Path, config: &AppConfig) -> CliResult<Vec<String>> {
    let fs = LocalFilesystem::new();
    let project = ProjectStore::new(&fs, root).require()?;
    if project.layout().is_empty() {
        Ok(config.defaults.plugins.clone())
    } else {
        Ok(project.layout().to_vec())
    }
}

#[derive(Debug, Serialize)]
struct PlannedChange {
    path: String,
    change: ChangeKind,
}

#[derive(Debug, Serialize)]
struct StepSummary<'a> {
    plugin: String,
    capability: String,
    root: &'a Path,
    dry_run: bool,
    changes: Vec<PlannedChange>,
}

/// Run one capability against the project tree, or against a dry-run
/// overlay of it, and report the outcome.
#[instrument(skip_all, fields(plugin = %plugin.key(), capability = %capability))]
pub(crate) fn execute_step(
    plugin: &dyn Plugin,
    capability: Capability,
    ctx: &GenerationContext,
    global: &GlobalArgs,
    output: &OutputManager,
) -> CliResult<()> {
    let root = ctx.root();

    if !global.dry_run {
        let scaffolder = Scaffolder::new(Box::new(LocalFilesystem::new()));
        scaffolder.run(plugin, capability, ctx)?;
        info!(root = %root.display(), "step completed");

        if output.is_json() {
            output.json(&StepSummary {
                plugin: plugin.key().to_string(),
                capability: capability.to_string(),
                root,
                dry_run: false,
                changes: Vec::new(),
            })?;
        } else {
            output.success(&format!(
                "{} completed with {} in {}",
                capability,
                plugin.key(),
                root.display()
            ))?;
        }
        return Ok(());
    }

    let base: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());
    let overlay = DryRunFilesystem::new(base);
    let scaffolder = Scaffolder::new(Box::new(overlay.clone()));
    scaffolder.run(plugin, capability, ctx)?;

    let changes: Vec<PlannedChange> = overlay
        .changes()
        .into_iter()
        .map(|change| PlannedChange {
            path: change
                .path
                .strip_prefix(root)
                .unwrap_or(&change.path)
                .display()
                .to_string(),
            change: change.kind,
        })
        .collect();
    info!(files = changes.len(), "dry run completed");

    if output.is_json() {
        output.json(&StepSummary {
            plugin: plugin.key().to_string(),
            capability: capability.to_string(),
            root,
            dry_run: true,
            changes,
        })?;
        return Ok(());
    }

    output.header(&format!(
        "Dry run: {} with {} would change {} file(s)",
        capability,
        plugin.key(),
        changes.len()
    ))?;
    for change in &changes {
        output.detail(&format!("{:<6} {}", change.change.to_string(), change.path))?;
    }
    output.info("No files were written.")?;
    Ok(())
}
