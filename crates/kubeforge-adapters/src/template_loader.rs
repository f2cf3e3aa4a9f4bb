//! Filesystem-based template overrides.
//!
//! Lets a team replace the bodies (and optionally the output paths) of the
//! built-in templates without rebuilding kubeforge.
//!
//! # Directory layout expected
//!
//! ```text
//! templates/
//! ├── templates.toml           ← optional manifest
//! ├── go/
//! │   └── types.tmpl           ← replaces the body of `go/types`
//! └── kustomize/
//!     └── sample.tmpl          ← replaces the body of `kustomize/sample`
//! ```
//!
//! A file's template id is its path relative to the directory without the
//! `.tmpl` extension. Files with any other extension are ignored.
//!
//! # `templates.toml` format
//!
//! ```toml
//! [[template]]
//! id        = "go/types"
//! path      = "apis/{{VERSION}}/{{KIND_LOWER}}.go"   # optional
//! if_exists = "overwrite"                          # error | skip | overwrite
//! executable = false                               # optional
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use kubeforge_core::{
    domain::{IfExists, Permissions, TemplateId},
    error::ForgeError,
};

const MANIFEST: &str = "templates.toml";
const EXTENSION: &str = "tmpl";

/// Errors raised while loading template overrides.
#[derive(Debug, Error)]
pub enum TemplateLoadError {
    #[error("templates directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to parse '{}': {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("'{id}' (from {}) does not override any built-in template", path.display())]
    UnknownTemplate { id: String, path: PathBuf },
}

impl From<TemplateLoadError> for ForgeError {
    fn from(e: TemplateLoadError) -> Self {
        ForgeError::Configuration {
            message: e.to_string(),
        }
    }
}

/// Replacement for parts of one built-in template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOverride {
    pub id: TemplateId,
    /// Where the override came from, for error messages.
    pub source: PathBuf,
    pub body: Option<String>,
    pub path: Option<String>,
    pub if_exists: Option<IfExists>,
    pub permissions: Option<Permissions>,
}

impl TemplateOverride {
    fn new(id: TemplateId, source: PathBuf) -> Self {
        Self {
            id,
            source,
            body: None,
            path: None,
            if_exists: None,
            permissions: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    template: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    id: String,
    path: Option<String>,
    if_exists: Option<IfExistsSetting>,
    executable: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum IfExistsSetting {
    Error,
    Skip,
    Overwrite,
}

impl From<IfExistsSetting> for IfExists {
    fn from(setting: IfExistsSetting) -> Self {
        match setting {
            IfExistsSetting::Error => IfExists::Error,
            IfExistsSetting::Skip => IfExists::Skip,
            IfExistsSetting::Overwrite => IfExists::Overwrite,
        }
    }
}

/// Loads [`TemplateOverride`]s from a directory.
pub struct FilesystemTemplateLoader {
    templates_dir: PathBuf,
}

impl FilesystemTemplateLoader {
    /// Create a loader pointed at `templates_dir`.
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    /// Read every `.tmpl` file and the optional manifest.
    ///
    /// Overrides are returned sorted by template id; a body file and a
    /// manifest entry for the same id are merged into one override.
    #[instrument(skip(self), fields(dir = %self.templates_dir.display()))]
    pub fn load_all(&self) -> Result<Vec<TemplateOverride>, TemplateLoadError> {
        if !self.templates_dir.is_dir() {
            return Err(TemplateLoadError::DirectoryNotFound {
                path: self.templates_dir.clone(),
            });
        }

        let mut overrides: Vec<TemplateOverride> = Vec::new();

        for entry in WalkDir::new(&self.templates_dir).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                if path.file_name().and_then(|n| n.to_str()) != Some(MANIFEST) {
                    warn!(path = %path.display(), "ignoring file without .tmpl extension");
                }
                continue;
            }

            let Some(id) = self.template_id(path) else {
                warn!(path = %path.display(), "cannot derive a template id, skipping");
                continue;
            };
            let body = fs::read_to_string(path).map_err(|source| TemplateLoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;

            debug!(id = %id, "loaded template body");
            let mut item = TemplateOverride::new(id, path.to_path_buf());
            item.body = Some(body);
            overrides.push(item);
        }

        let manifest_path = self.templates_dir.join(MANIFEST);
        if manifest_path.is_file() {
            for entry in read_manifest(&manifest_path)?.template {
                let id = TemplateId::new(entry.id);
                let index = match overrides.iter().position(|o| o.id == id) {
                    Some(index) => index,
                    None => {
                        overrides.push(TemplateOverride::new(id, manifest_path.clone()));
                        overrides.len() - 1
                    }
                };
                let item = &mut overrides[index];
                item.path = entry.path;
                item.if_exists = entry.if_exists.map(IfExists::from);
                item.permissions = entry.executable.map(|executable| {
                    if executable {
                        Permissions::executable()
                    } else {
                        Permissions::regular()
                    }
                });
            }
        }

        overrides.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(count = overrides.len(), "finished loading template overrides");
        Ok(overrides)
    }

    /// `go/types.tmpl` → `go/types`, with `/` separators on every platform.
    fn template_id(&self, path: &Path) -> Option<TemplateId> {
        let relative = path.strip_prefix(&self.templates_dir).ok()?.with_extension("");
        let segments: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(TemplateId::new(segments.join("/")))
    }
}

fn read_manifest(path: &Path) -> Result<Manifest, TemplateLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| TemplateLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| TemplateLoadError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}
