//! `kubeforge version`.

use serde::Serialize;

use kubeforge_core::domain::ProjectVersion;

use crate::{error::CliResult, output::OutputManager};

#[derive(Debug, Serialize)]
struct VersionInfo {
    kubeforge: &'static str,
    core: &'static str,
    default_project_version: String,
}

pub fn execute(output: OutputManager) -> CliResult<()> {
    let info = VersionInfo {
        kubeforge: env!("CARGO_PKG_VERSION"),
        core: kubeforge_core::VERSION,
        default_project_version: ProjectVersion::default().to_string(),
    };

    if output.is_json() {
        output.json(&info)?;
    } else {
        output.print(&format!(
            "kubeforge {} (core {}, PROJECT version {})",
            info.kubeforge, info.core, info.default_project_version
        ))?;
    }
    Ok(())
}
