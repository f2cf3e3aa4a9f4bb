//! Scaffolder - runs one plugin capability against an injected filesystem.
//!
//! This is the single entry point the command layer uses:
//! 1. Check the plugin implements the capability
//! 2. Check the project lifecycle stage (init needs an empty project,
//!    everything else an initialized one)
//! 3. Check the plugin supports the project version
//! 4. Call the plugin once; its error chain is returned as is

use tracing::{info, instrument};

use crate::{
    application::{ApplicationError, Plugin, ports::Filesystem, services::ProjectStore},
    domain::{Capability, GenerationContext},
    error::ForgeResult,
};

/// Main scaffolding service.
pub struct Scaffolder {
    filesystem: Box<dyn Filesystem>,
}

impl Scaffolder {
    /// Create a scaffolder over the given filesystem adapter.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let scaffolder = Scaffolder::new(Box::new(LocalFilesystem::new()));
    /// scaffolder.run(&bundle, Capability::Init, &ctx)?;
    /// ```
    pub fn new(filesystem: Box<dyn Filesystem>) -> Self {
        Self { filesystem }
    }

    /// Replace the filesystem used by later runs.
    pub fn inject_filesystem(&mut self, filesystem: Box<dyn Filesystem>) {
        self.filesystem = filesystem;
    }

    pub fn filesystem(&self) -> &dyn Filesystem {
        self.filesystem.as_ref()
    }

    /// Run one capability of `plugin`. No retries.
    #[instrument(
        skip_all,
        fields(
            plugin = %plugin.key(),
            capability = %capability,
            root = %ctx.root().display()
        )
    )]
    pub fn run(
        &self,
        plugin: &dyn Plugin,
        capability: Capability,
        ctx: &GenerationContext,
    ) -> ForgeResult<()> {
        if !plugin.implements(capability) {
            return Err(ApplicationError::UnsupportedCapability {
                plugin: plugin.key().to_string(),
                capability,
            }
            .into());
        }

        let store = ProjectStore::new(self.filesystem.as_ref(), ctx.root());
        let config = store.load()?;

        let project_version = match (&config, capability) {
            (Some(_), Capability::Init) => {
                return Err(ApplicationError::Precondition {
                    requirement: format!(
                        "project is already initialized ({} exists)",
                        store.path().display()
                    ),
                }
                .into());
            }
            (None, Capability::Init) => ctx.project_version(),
            (Some(config), _) => config.version(),
            (None, _) => {
                store.require()?;
                ctx.project_version()
            }
        };

        if !plugin.supports(project_version) {
            let supported: Vec<String> = plugin
                .supported_project_versions()
                .iter()
                .map(ToString::to_string)
                .collect();
            return Err(ApplicationError::VersionMismatch {
                plugin: plugin.key().to_string(),
                project_version,
                supported: supported.join(", "),
            }
            .into());
        }

        info!("Running {} with {}", capability, plugin.key());
        plugin.scaffold(capability, ctx, self.filesystem.as_ref())?;
        info!("Scaffold completed successfully");
        Ok(())
    }
}
