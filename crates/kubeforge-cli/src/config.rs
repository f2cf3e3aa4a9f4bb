//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value. The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `KUBEFORGE_*` environment variables (`__` separates sections, e.g.
//!    `KUBEFORGE_DEFAULTS__DOMAIN`; `KUBEFORGE_TEMPLATES_DIR` is a shortcut)
//! 3. Config file (`--config`, else the platform config directory)
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Values used when a flag is omitted.
    pub defaults: Defaults,
    /// Output settings.
    pub output: OutputConfig,
    /// Template settings.
    pub templates: TemplateConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub domain: Option<String>,
    pub owner: Option<String>,
    /// Plugin keys `init` runs when `--plugins` is not given.
    pub plugins: Vec<String>,
    pub project_version: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory of template overrides (`*.toml` manifests).
    pub dir: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            domain: None,
            owner: None,
            plugins: vec!["go.kubeforge.io/v4".into()],
            project_version: 3,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: Defaults::default(),
            output: OutputConfig::default(),
            templates: TemplateConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration, starting from defaults.
    ///
    /// An explicit `config_file` must exist; the default location is optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };
        Self::load_from(&path, required)
    }

    fn load_from(path: &Path, required: bool) -> anyhow::Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .context("Failed to encode built-in configuration defaults")?;

        let mut config: AppConfig = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Toml).required(required))
            .add_source(
                Environment::with_prefix("KUBEFORGE")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("defaults.plugins")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from '{}'", path.display()))?
            .try_deserialize()
            .context("Invalid configuration")?;

        if let Ok(dir) = std::env::var("KUBEFORGE_TEMPLATES_DIR") {
            if !dir.trim().is_empty() {
                config.templates.dir = Some(PathBuf::from(dir));
            }
        }

        Ok(config)
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.kubeforge.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("io", "kubeforge", "kubeforge")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".kubeforge.toml"))
    }
}
