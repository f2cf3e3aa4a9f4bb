//! Template rendering values: the variable context and rendered output.

use std::collections::HashMap;
use std::fmt;

use crate::domain::{
    common::{Permissions, RelativePath},
    context::GenerationContext,
    naming::to_go_identifier,
    project_config::ProjectConfig,
};

/// Identifier of a template known to a renderer (`go/types`,
/// `kustomize/crd-kustomization`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// What to do when a rendered file's path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IfExists {
    #[default]
    Error,
    Skip,
    Overwrite,
}

/// A file produced by a renderer, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: RelativePath,
    pub content: String,
    pub permissions: Permissions,
    pub if_exists: IfExists,
}

/// Variables available to templates.
///
/// Built from the project configuration and the generation context. A
/// variable whose source is absent is not defined at all, so templates that
/// need it fail with its name instead of rendering an empty string.
///
/// ## Variables
///
/// | Variable | Example |
/// |----------|---------|
/// | `DOMAIN` | "example.com" |
/// | `REPO` | "example.com/cronjob" |
/// | `PROJECT_NAME` | "cronjob" |
/// | `COPYRIGHT` | "Copyright 2026 The Example Authors." |
/// | `GROUP` / `VERSION` / `KIND` | "batch" / "v1" / "CronJob" |
/// | `KIND_LOWER` / `KIND_PLURAL` | "cronjob" / "cronjobs" |
/// | `IMPORT_ALIAS` | "batchv1" |
/// | `QUALIFIED_GROUP` | "batch.example.com" |
/// | `API_PATH` | "api/v1" (or "api/batch/v1" with multigroup) |
/// | `CONTROLLER_DIR` | "internal/controller" |
/// | `WEBHOOK_DIR` | "internal/webhook/v1" |
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    variables: HashMap<String, String>,
}

impl RenderContext {
    pub fn new(config: &ProjectConfig, ctx: &GenerationContext) -> Self {
        let mut vars = HashMap::new();
        let mut set = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                vars.insert(key.to_string(), value);
            }
        };

        let domain = config.domain().or(ctx.domain()).map(str::to_string);
        let repo = config.repo().or(ctx.repo()).map(str::to_string);
        let multigroup = config.multigroup() || ctx.flags().multigroup;

        set("DOMAIN", domain.clone());
        set("REPO", repo.clone());
        set(
            "PROJECT_NAME",
            config.project_name().or(ctx.project_name()).map(str::to_string),
        );
        set("OWNER", ctx.owner().map(str::to_string));
        set("YEAR", ctx.year().map(|y| y.to_string()));
        set("COPYRIGHT", Some(copyright(ctx.year(), ctx.owner())));

        set("GROUP", ctx.group().map(str::to_string));
        set("VERSION", ctx.version().map(str::to_string));
        set("KIND", ctx.kind().map(str::to_string));

        if let Some(resource) = ctx.resource() {
            let group_ident = to_go_identifier(resource.group());
            let (api_path, controller_dir, webhook_dir) = if multigroup {
                (
                    format!("api/{}/{}", resource.group(), resource.version()),
                    format!("internal/controller/{}", resource.group()),
                    format!("internal/webhook/{}/{}", resource.group(), resource.version()),
                )
            } else {
                (
                    format!("api/{}", resource.version()),
                    "internal/controller".to_string(),
                    format!("internal/webhook/{}", resource.version()),
                )
            };
            let (controller_pkg, controller_alias) = if multigroup {
                (group_ident.clone(), format!("{group_ident}controller"))
            } else {
                ("controller".to_string(), "controller".to_string())
            };

            set("KIND_LOWER", Some(resource.kind_lower()));
            set("KIND_PLURAL", ctx.resource_plural());
            set("IMPORT_ALIAS", Some(resource.import_alias()));
            set(
                "QUALIFIED_GROUP",
                domain.as_deref().map(|d| resource.qualified_group(d)),
            );
            set(
                "API_IMPORT",
                repo.as_deref().map(|r| format!("{r}/{api_path}")),
            );
            set(
                "CONTROLLER_IMPORT",
                repo.as_deref().map(|r| format!("{r}/{controller_dir}")),
            );
            set(
                "WEBHOOK_IMPORT",
                repo.as_deref().map(|r| format!("{r}/{webhook_dir}")),
            );
            set("API_PATH", Some(api_path));
            set("CONTROLLER_DIR", Some(controller_dir));
            set("CONTROLLER_PKG", Some(controller_pkg));
            set("CONTROLLER_ALIAS", Some(controller_alias));
            set("WEBHOOK_DIR", Some(webhook_dir));
            set(
                "WEBHOOK_ALIAS",
                Some(format!("webhook{}", resource.import_alias())),
            );
            set(
                "SCOPE_MARKER",
                Some(if ctx.flags().namespaced {
                    String::new()
                } else {
                    "\n// +kubebuilder:resource:scope=Cluster".to_string()
                }),
            );
        }

        Self { variables: vars }
    }

    /// Add or override a variable.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Replace every known `{{VARIABLE}}` placeholder. Unknown ones are left
    /// as they are.
    pub fn render(&self, template: &str) -> String {
        let mut result = template.to_string();
        for (key, value) in &self.variables {
            let placeholder = format!("{{{{{key}}}}}");
            result = result.replace(&placeholder, value);
        }
        result
    }

    /// Like [`render`](Self::render), but fails with the names of any
    /// placeholders left unresolved.
    pub fn render_strict(&self, template: &str) -> Result<String, Vec<String>> {
        let rendered = self.render(template);
        let missing = unresolved_placeholders(&rendered);
        if missing.is_empty() {
            Ok(rendered)
        } else {
            Err(missing)
        }
    }
}

fn copyright(year: Option<i32>, owner: Option<&str>) -> String {
    let mut line = String::from("Copyright");
    if let Some(year) = year {
        line.push_str(&format!(" {year}"));
    }
    line.push(' ');
    line.push_str(owner.unwrap_or("The Kubeforge Authors"));
    line.push('.');
    line
}

/// Names of `{{NAME}}` placeholders (upper-case, digits, `_`) in order of
/// first appearance.
fn unresolved_placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            break;
        };
        let name = &after[..close];
        let is_placeholder = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if is_placeholder && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &after[close + 2..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plugin_key::ProjectVersion;

    fn config() -> ProjectConfig {
        let mut config = ProjectConfig::new(ProjectVersion::V3);
        config.set_domain("example.com");
        config.set_repo("example.com/cronjob");
        config.set_project_name("cronjob");
        config
    }

    fn ctx() -> GenerationContext {
        GenerationContext::builder("/work/cronjob")
            .year(2026)
            .group("batch")
            .version("v1")
            .kind("CronJob")
            .build()
            .unwrap()
    }

    #[test]
    fn resource_variables() {
        let rc = RenderContext::new(&config(), &ctx());
        assert_eq!(rc.get("KIND"), Some("CronJob"));
        assert_eq!(rc.get("KIND_PLURAL"), Some("cronjobs"));
        assert_eq!(rc.get("IMPORT_ALIAS"), Some("batchv1"));
        assert_eq!(rc.get("QUALIFIED_GROUP"), Some("batch.example.com"));
        assert_eq!(rc.get("API_PATH"), Some("api/v1"));
        assert_eq!(rc.get("API_IMPORT"), Some("example.com/cronjob/api/v1"));
        assert_eq!(rc.get("CONTROLLER_ALIAS"), Some("controller"));
        assert_eq!(rc.get("SCOPE_MARKER"), Some(""));
        assert_eq!(
            rc.get("COPYRIGHT"),
            Some("Copyright 2026 The Kubeforge Authors.")
        );
    }

    #[test]
    fn multigroup_layout() {
        let mut config = config();
        config.set_multigroup(true);
        let rc = RenderContext::new(&config, &ctx());
        assert_eq!(rc.get("API_PATH"), Some("api/batch/v1"));
        assert_eq!(rc.get("CONTROLLER_DIR"), Some("internal/controller/batch"));
        assert_eq!(rc.get("CONTROLLER_ALIAS"), Some("batchcontroller"));
        assert_eq!(rc.get("WEBHOOK_DIR"), Some("internal/webhook/batch/v1"));
    }

    #[test]
    fn missing_kind_leaves_derived_names_undefined() {
        let ctx = GenerationContext::builder("/w")
            .group("batch")
            .version("v1")
            .build()
            .unwrap();
        let rc = RenderContext::new(&config(), &ctx);
        assert_eq!(rc.get("KIND"), None);
        assert_eq!(rc.get("KIND_LOWER"), None);

        let err = rc
            .render_strict("type {{KIND}}Spec struct{} // {{GROUP}} {{KIND}}")
            .unwrap_err();
        assert_eq!(err, vec!["KIND".to_string()]);
    }

    #[test]
    fn strict_render_ignores_non_placeholder_braces() {
        let rc = RenderContext::default().with_variable("A", "x");
        assert_eq!(rc.render_strict("{{A}} {{ .Values }}").unwrap(), "x {{ .Values }}");
        assert_eq!(rc.render("{{UNKNOWN}}"), "{{UNKNOWN}}");
    }
}
