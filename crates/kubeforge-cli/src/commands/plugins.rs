//! `kubeforge plugins`: list what the registry can run.

use serde::Serialize;

use kubeforge_core::application::Plugin;

use crate::{
    cli::PluginsArgs,
    commands::build_registry,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct PluginInfo {
    key: String,
    description: String,
    capabilities: Vec<String>,
    project_versions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    members: Vec<String>,
}

impl PluginInfo {
    fn of(plugin: &dyn Plugin) -> Self {
        Self {
            key: plugin.key().to_string(),
            description: plugin.description().to_string(),
            capabilities: plugin.capabilities().iter().map(|c| c.to_string()).collect(),
            project_versions: plugin
                .supported_project_versions()
                .iter()
                .map(ToString::to_string)
                .collect(),
            members: plugin.members().iter().map(|m| m.key().to_string()).collect(),
        }
    }
}

pub fn execute(args: PluginsArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let registry = build_registry(&config)?;
    let plugins: Vec<PluginInfo> = registry
        .list()
        .iter()
        .map(|p| PluginInfo::of(p.as_ref()))
        .collect();

    if output.is_json() {
        output.json(&plugins)?;
        return Ok(());
    }

    output.header(&format!("{} plugins available", plugins.len()))?;
    for plugin in &plugins {
        output.print("")?;
        let kind = if plugin.members.is_empty() { "" } else { " (bundle)" };
        output.print(&format!("{}{}", plugin.key, kind))?;
        if !plugin.description.is_empty() {
            output.detail(&plugin.description)?;
        }
        output.detail(&format!("capabilities: {}", plugin.capabilities.join(", ")))?;
        output.detail(&format!(
            "project versions: {}",
            plugin.project_versions.join(", ")
        ))?;
        if args.members {
            for (step, member) in plugin.members.iter().enumerate() {
                output.detail(&format!("{}. {}", step + 1, member))?;
            }
        }
    }
    Ok(())
}
