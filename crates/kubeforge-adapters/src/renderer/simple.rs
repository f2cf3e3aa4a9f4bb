//! Simple variable substitution renderer.

use std::collections::HashMap;

use kubeforge_core::{
    application::{ApplicationError, ports::TemplateRenderer},
    domain::{RelativePath, RenderContext, RenderedFile, TemplateId},
    error::{ForgeError, ForgeResult},
};
use tracing::{debug, instrument};

use crate::builtin_templates::{self, TemplateSpec};
use crate::template_loader::{TemplateLoadError, TemplateOverride};

/// Renderer using `{{VARIABLE}}` substitution over a fixed template set.
#[derive(Debug, Clone)]
pub struct SimpleRenderer {
    templates: HashMap<TemplateId, TemplateSpec>,
}

impl SimpleRenderer {
    /// Create a renderer over the built-in templates.
    pub fn new() -> Self {
        Self::from_templates(builtin_templates::all())
    }

    pub fn from_templates(templates: impl IntoIterator<Item = TemplateSpec>) -> Self {
        Self {
            templates: templates.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    /// Apply overrides on top of the current templates.
    ///
    /// Only existing templates can be overridden; an unknown id is an error
    /// so a typo in a file name does not go unnoticed.
    pub fn with_overrides(
        mut self,
        overrides: impl IntoIterator<Item = TemplateOverride>,
    ) -> Result<Self, TemplateLoadError> {
        for item in overrides {
            let Some(spec) = self.templates.get_mut(&item.id) else {
                return Err(TemplateLoadError::UnknownTemplate {
                    id: item.id.to_string(),
                    path: item.source,
                });
            };
            debug!(id = %item.id, "overriding built-in template");
            if let Some(body) = item.body {
                spec.body = body.into();
            }
            if let Some(path) = item.path {
                spec.path = path.into();
            }
            if let Some(policy) = item.if_exists {
                spec.if_exists = policy;
            }
            if let Some(permissions) = item.permissions {
                spec.permissions = permissions;
            }
        }
        Ok(self)
    }

    /// Known template ids, sorted.
    pub fn template_ids(&self) -> Vec<&TemplateId> {
        let mut ids: Vec<_> = self.templates.keys().collect();
        ids.sort();
        ids
    }
}

impl Default for SimpleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for SimpleRenderer {
    #[instrument(skip_all, fields(template = %template))]
    fn render(&self, template: &TemplateId, context: &RenderContext) -> ForgeResult<RenderedFile> {
        let spec = self
            .templates
            .get(template)
            .ok_or_else(|| render_error(template, "unknown template".into()))?;

        let missing: Vec<&str> = spec
            .requires
            .iter()
            .copied()
            .filter(|name| context.get(name).is_none_or(|v| v.trim().is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(render_error(
                template,
                format!("missing required variable(s): {}", missing.join(", ")),
            ));
        }

        let path = context
            .render_strict(&spec.path)
            .map_err(|names| unresolved(template, "path", &names))?;
        let content = context
            .render_strict(&spec.body)
            .map_err(|names| unresolved(template, "body", &names))?;
        let path = RelativePath::new(path).map_err(ForgeError::from)?;

        Ok(RenderedFile {
            path,
            content,
            permissions: spec.permissions,
            if_exists: spec.if_exists,
        })
    }

    fn has_template(&self, template: &TemplateId) -> bool {
        self.templates.contains_key(template)
    }
}

fn render_error(template: &TemplateId, reason: String) -> ForgeError {
    ApplicationError::TemplateRender {
        template: template.to_string(),
        reason,
    }
    .into()
}

fn unresolved(template: &TemplateId, part: &str, names: &[String]) -> ForgeError {
    render_error(
        template,
        format!("unresolved placeholder(s) in {part}: {}", names.join(", ")),
    )
}
