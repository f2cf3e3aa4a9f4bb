//! Templates that ship with kubeforge.
//!
//! Template bodies live under `templates/` in this crate and are embedded at
//! compile time. Each entry declares where the rendered file goes (the path
//! is itself a template), which variables it cannot render without, and
//! what happens when the file is already there.
//!
//! Bodies and output paths can be replaced at runtime from a directory, see
//! [`crate::template_loader`].

use std::borrow::Cow;

use kubeforge_core::domain::{IfExists, Permissions, TemplateId};

/// Template identifiers used by the built-in plugins.
pub mod ids {
    pub const GO_MOD: &str = "go/gomod";
    pub const GO_MAIN: &str = "go/main";
    pub const GO_MAKEFILE: &str = "go/makefile";
    pub const GO_DOCKERFILE: &str = "go/dockerfile";
    pub const GO_BOILERPLATE: &str = "go/boilerplate";
    pub const GO_GITIGNORE: &str = "go/gitignore";
    pub const GO_TYPES: &str = "go/types";
    pub const GO_GROUPVERSION: &str = "go/groupversion";
    pub const GO_CONTROLLER: &str = "go/controller";
    pub const GO_WEBHOOK: &str = "go/webhook";

    pub const KUSTOMIZE_DEFAULT: &str = "kustomize/default";
    pub const KUSTOMIZE_METRICS_PATCH: &str = "kustomize/metrics-patch";
    pub const KUSTOMIZE_METRICS_SERVICE: &str = "kustomize/metrics-service";
    pub const KUSTOMIZE_MANAGER: &str = "kustomize/manager";
    pub const KUSTOMIZE_MANAGER_KUSTOMIZATION: &str = "kustomize/manager-kustomization";
    pub const KUSTOMIZE_RBAC: &str = "kustomize/rbac-kustomization";
    pub const KUSTOMIZE_RBAC_ROLE: &str = "kustomize/rbac-role";
    pub const KUSTOMIZE_RBAC_ROLE_BINDING: &str = "kustomize/rbac-role-binding";
    pub const KUSTOMIZE_RBAC_SERVICE_ACCOUNT: &str = "kustomize/rbac-service-account";
    pub const KUSTOMIZE_PROMETHEUS: &str = "kustomize/prometheus-kustomization";
    pub const KUSTOMIZE_PROMETHEUS_MONITOR: &str = "kustomize/prometheus-monitor";
    pub const KUSTOMIZE_CERTMANAGER: &str = "kustomize/certmanager-kustomization";
    pub const KUSTOMIZE_CERTMANAGER_ISSUER: &str = "kustomize/certmanager-issuer";
    pub const KUSTOMIZE_CERTMANAGER_CERTIFICATE: &str = "kustomize/certmanager-certificate";
    pub const KUSTOMIZE_CRD: &str = "kustomize/crd-kustomization";
    pub const KUSTOMIZE_SAMPLES: &str = "kustomize/samples-kustomization";
    pub const KUSTOMIZE_SAMPLE: &str = "kustomize/sample";
    pub const KUSTOMIZE_EDITOR_ROLE: &str = "kustomize/editor-role";
    pub const KUSTOMIZE_VIEWER_ROLE: &str = "kustomize/viewer-role";
    pub const KUSTOMIZE_WEBHOOK: &str = "kustomize/webhook-kustomization";
    pub const KUSTOMIZE_WEBHOOK_SERVICE: &str = "kustomize/webhook-service";
    pub const KUSTOMIZE_WEBHOOK_CONFIG: &str = "kustomize/webhook-kustomizeconfig";
    pub const KUSTOMIZE_MANAGER_WEBHOOK_PATCH: &str = "kustomize/manager-webhook-patch";

    pub const NETWORK_POLICY: &str = "network-policy/kustomization";
    pub const NETWORK_POLICY_METRICS: &str = "network-policy/allow-metrics-traffic";
    pub const NETWORK_POLICY_WEBHOOK: &str = "network-policy/allow-webhook-traffic";
}

const RESOURCE: &[&str] = &["GROUP", "VERSION", "KIND"];

/// One renderable template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpec {
    pub id: TemplateId,
    /// Output path relative to the project root; may contain placeholders.
    pub path: Cow<'static, str>,
    pub body: Cow<'static, str>,
    /// Variables that must be present and non-empty.
    pub requires: &'static [&'static str],
    pub permissions: Permissions,
    pub if_exists: IfExists,
}

impl TemplateSpec {
    pub fn new(
        id: &str,
        path: impl Into<Cow<'static, str>>,
        body: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            id: TemplateId::new(id),
            path: path.into(),
            body: body.into(),
            requires: &[],
            permissions: Permissions::default(),
            if_exists: IfExists::default(),
        }
    }

    pub fn requires(mut self, variables: &'static [&'static str]) -> Self {
        self.requires = variables;
        self
    }

    pub fn if_exists(mut self, policy: IfExists) -> Self {
        self.if_exists = policy;
        self
    }
}

/// Every built-in template.
pub fn all() -> Vec<TemplateSpec> {
    let mut templates = go_templates();
    templates.extend(kustomize_templates());
    templates.extend(network_policy_templates());
    templates
}

fn go_templates() -> Vec<TemplateSpec> {
    vec![
        TemplateSpec::new(
            ids::GO_MOD,
            "go.mod",
            include_str!("../templates/go/go.mod.tmpl"),
        )
        .requires(&["REPO"]),
        TemplateSpec::new(
            ids::GO_MAIN,
            "cmd/main.go",
            include_str!("../templates/go/main.go.tmpl"),
        )
        .requires(&["DOMAIN", "PROJECT_NAME"]),
        TemplateSpec::new(
            ids::GO_MAKEFILE,
            "Makefile",
            include_str!("../templates/go/Makefile.tmpl"),
        )
        .requires(&["PROJECT_NAME"]),
        TemplateSpec::new(
            ids::GO_DOCKERFILE,
            "Dockerfile",
            include_str!("../templates/go/Dockerfile.tmpl"),
        ),
        TemplateSpec::new(
            ids::GO_BOILERPLATE,
            "hack/boilerplate.go.txt",
            include_str!("../templates/go/boilerplate.go.txt.tmpl"),
        ),
        TemplateSpec::new(
            ids::GO_GITIGNORE,
            ".gitignore",
            include_str!("../templates/go/gitignore.tmpl"),
        )
        .if_exists(IfExists::Skip),
        TemplateSpec::new(
            ids::GO_TYPES,
            "{{API_PATH}}/{{KIND_LOWER}}_types.go",
            include_str!("../templates/go/types.go.tmpl"),
        )
        .requires(RESOURCE),
        TemplateSpec::new(
            ids::GO_GROUPVERSION,
            "{{API_PATH}}/groupversion_info.go",
            include_str!("../templates/go/groupversion_info.go.tmpl"),
        )
        .requires(&["GROUP", "VERSION", "KIND", "DOMAIN"])
        .if_exists(IfExists::Skip),
        TemplateSpec::new(
            ids::GO_CONTROLLER,
            "{{CONTROLLER_DIR}}/{{KIND_LOWER}}_controller.go",
            include_str!("../templates/go/controller.go.tmpl"),
        )
        .requires(&["GROUP", "VERSION", "KIND", "DOMAIN", "REPO"]),
        TemplateSpec::new(
            ids::GO_WEBHOOK,
            "{{WEBHOOK_DIR}}/{{KIND_LOWER}}_webhook.go",
            include_str!("../templates/go/webhook.go.tmpl"),
        )
        .requires(&["GROUP", "VERSION", "KIND", "DOMAIN", "REPO"]),
    ]
}

fn kustomize_templates() -> Vec<TemplateSpec> {
    vec![
        TemplateSpec::new(
            ids::KUSTOMIZE_DEFAULT,
            "config/default/kustomization.yaml",
            include_str!("../templates/kustomize/default_kustomization.yaml.tmpl"),
        )
        .requires(&["PROJECT_NAME"]),
        TemplateSpec::new(
            ids::KUSTOMIZE_METRICS_PATCH,
            "config/default/manager_metrics_patch.yaml",
            include_str!("../templates/kustomize/manager_metrics_patch.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_METRICS_SERVICE,
            "config/default/metrics_service.yaml",
            include_str!("../templates/kustomize/metrics_service.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_MANAGER_KUSTOMIZATION,
            "config/manager/kustomization.yaml",
            include_str!("../templates/kustomize/manager_kustomization.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_MANAGER,
            "config/manager/manager.yaml",
            include_str!("../templates/kustomize/manager.yaml.tmpl"),
        )
        .requires(&["PROJECT_NAME"]),
        TemplateSpec::new(
            ids::KUSTOMIZE_RBAC,
            "config/rbac/kustomization.yaml",
            include_str!("../templates/kustomize/rbac_kustomization.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_RBAC_ROLE,
            "config/rbac/role.yaml",
            include_str!("../templates/kustomize/role.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_RBAC_ROLE_BINDING,
            "config/rbac/role_binding.yaml",
            include_str!("../templates/kustomize/role_binding.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_RBAC_SERVICE_ACCOUNT,
            "config/rbac/service_account.yaml",
            include_str!("../templates/kustomize/service_account.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_PROMETHEUS,
            "config/prometheus/kustomization.yaml",
            include_str!("../templates/kustomize/prometheus_kustomization.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_PROMETHEUS_MONITOR,
            "config/prometheus/monitor.yaml",
            include_str!("../templates/kustomize/monitor.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_CERTMANAGER,
            "config/certmanager/kustomization.yaml",
            include_str!("../templates/kustomize/certmanager_kustomization.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_CERTMANAGER_ISSUER,
            "config/certmanager/issuer.yaml",
            include_str!("../templates/kustomize/issuer.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_CERTMANAGER_CERTIFICATE,
            "config/certmanager/certificate.yaml",
            include_str!("../templates/kustomize/certificate.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::KUSTOMIZE_CRD,
            "config/crd/kustomization.yaml",
            include_str!("../templates/kustomize/crd_kustomization.yaml.tmpl"),
        )
        .if_exists(IfExists::Skip),
        TemplateSpec::new(
            ids::KUSTOMIZE_SAMPLES,
            "config/samples/kustomization.yaml",
            include_str!("../templates/kustomize/samples_kustomization.yaml.tmpl"),
        )
        .if_exists(IfExists::Skip),
        TemplateSpec::new(
            ids::KUSTOMIZE_SAMPLE,
            "config/samples/{{GROUP}}_{{VERSION}}_{{KIND_LOWER}}.yaml",
            include_str!("../templates/kustomize/sample.yaml.tmpl"),
        )
        .requires(&["GROUP", "VERSION", "KIND", "DOMAIN"]),
        TemplateSpec::new(
            ids::KUSTOMIZE_EDITOR_ROLE,
            "config/rbac/{{KIND_LOWER}}_editor_role.yaml",
            include_str!("../templates/kustomize/editor_role.yaml.tmpl"),
        )
        .requires(&["GROUP", "VERSION", "KIND", "DOMAIN"]),
        TemplateSpec::new(
            ids::KUSTOMIZE_VIEWER_ROLE,
            "config/rbac/{{KIND_LOWER}}_viewer_role.yaml",
            include_str!("../templates/kustomize/viewer_role.yaml.tmpl"),
        )
        .requires(&["GROUP", "VERSION", "KIND", "DOMAIN"]),
        TemplateSpec::new(
            ids::KUSTOMIZE_WEBHOOK,
            "config/webhook/kustomization.yaml",
            include_str!("../templates/kustomize/webhook_kustomization.yaml.tmpl"),
        )
        .if_exists(IfExists::Skip),
        TemplateSpec::new(
            ids::KUSTOMIZE_WEBHOOK_SERVICE,
            "config/webhook/service.yaml",
            include_str!("../templates/kustomize/webhook_service.yaml.tmpl"),
        )
        .if_exists(IfExists::Skip),
        TemplateSpec::new(
            ids::KUSTOMIZE_WEBHOOK_CONFIG,
            "config/webhook/kustomizeconfig.yaml",
            include_str!("../templates/kustomize/webhook_kustomizeconfig.yaml.tmpl"),
        )
        .if_exists(IfExists::Skip),
        TemplateSpec::new(
            ids::KUSTOMIZE_MANAGER_WEBHOOK_PATCH,
            "config/default/manager_webhook_patch.yaml",
            include_str!("../templates/kustomize/manager_webhook_patch.yaml.tmpl"),
        )
        .if_exists(IfExists::Skip),
    ]
}

fn network_policy_templates() -> Vec<TemplateSpec> {
    vec![
        TemplateSpec::new(
            ids::NETWORK_POLICY,
            "config/network-policy/kustomization.yaml",
            include_str!("../templates/network-policy/kustomization.yaml.tmpl"),
        ),
        TemplateSpec::new(
            ids::NETWORK_POLICY_METRICS,
            "config/network-policy/allow-metrics-traffic.yaml",
            include_str!("../templates/network-policy/allow-metrics-traffic.yaml.tmpl"),
        )
        .requires(&["PROJECT_NAME"]),
        TemplateSpec::new(
            ids::NETWORK_POLICY_WEBHOOK,
            "config/network-policy/allow-webhook-traffic.yaml",
            include_str!("../templates/network-policy/allow-webhook-traffic.yaml.tmpl"),
        )
        .requires(&["PROJECT_NAME"]),
    ]
}
