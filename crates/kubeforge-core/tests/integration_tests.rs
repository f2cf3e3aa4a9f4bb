//! Integration tests for kubeforge-core driven through the built-in plugins.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kubeforge_adapters::{
    DryRunFilesystem, LocalFilesystem, MemoryFilesystem, PluginRegistry, SimpleRenderer,
};
use kubeforge_core::domain::ProjectStage;
use kubeforge_core::prelude::*;
use pretty_assertions::assert_eq;

const ROOT: &str = "/work/cronjob";

fn registry() -> PluginRegistry {
    let renderer: Arc<dyn TemplateRenderer> = Arc::new(SimpleRenderer::new());
    PluginRegistry::builtin(renderer).unwrap()
}

fn init_ctx(root: &Path) -> GenerationContext {
    GenerationContext::builder(root)
        .domain("example.com")
        .repo("example.com/cronjob")
        .owner("The CronJob Authors")
        .year(2026)
        .build()
        .unwrap()
}

fn api_ctx(root: &Path) -> GenerationContext {
    GenerationContext::builder(root)
        .group("batch")
        .version("v1")
        .kind("CronJob")
        .build()
        .unwrap()
}

fn webhook_ctx(root: &Path) -> GenerationContext {
    GenerationContext::builder(root)
        .group("batch")
        .version("v1")
        .kind("CronJob")
        .flags(FeatureFlags {
            defaulting: true,
            programmatic_validation: true,
            ..FeatureFlags::default()
        })
        .build()
        .unwrap()
}

fn read(fs: &MemoryFilesystem, rel: &str) -> String {
    fs.read_file(Path::new(ROOT).join(rel))
        .unwrap_or_else(|| panic!("{rel} was not generated"))
}

fn project(fs: &MemoryFilesystem) -> ProjectConfig {
    ProjectConfig::from_yaml(&read(fs, "PROJECT")).unwrap()
}

/// Run `init` then `create api batch/v1 CronJob` with the default bundle.
fn scaffold_cronjob(fs: &MemoryFilesystem) {
    let registry = registry();
    let bundle = registry.resolve("go/v4").unwrap();
    let scaffolder = Scaffolder::new(Box::new(fs.clone()));
    let root = Path::new(ROOT);

    scaffolder
        .run(bundle.as_ref(), Capability::Init, &init_ctx(root))
        .unwrap();
    scaffolder
        .run(bundle.as_ref(), Capability::CreateApi, &api_ctx(root))
        .unwrap();
}

#[test]
fn test_init_and_create_api_end_to_end() {
    let fs = MemoryFilesystem::new();
    scaffold_cronjob(&fs);

    for file in [
        "go.mod",
        "cmd/main.go",
        "Makefile",
        "Dockerfile",
        "hack/boilerplate.go.txt",
        "config/default/kustomization.yaml",
        "config/manager/manager.yaml",
        "config/rbac/role.yaml",
        "api/v1/cronjob_types.go",
        "api/v1/groupversion_info.go",
        "internal/controller/cronjob_controller.go",
        "config/crd/kustomization.yaml",
        "config/samples/batch_v1_cronjob.yaml",
        "config/rbac/cronjob_editor_role.yaml",
        "config/rbac/cronjob_viewer_role.yaml",
    ] {
        assert!(
            fs.read_file(Path::new(ROOT).join(file)).is_some(),
            "{file} missing"
        );
    }

    let main = read(&fs, "cmd/main.go");
    assert!(main.contains("\tbatchv1 \"example.com/cronjob/api/v1\"\n"));
    assert!(main.contains("\tutilruntime.Must(batchv1.AddToScheme(scheme))\n"));
    assert!(main.contains("if err := (&controller.CronJobReconciler{"));
    for marker in ["imports", "scheme", "builder"] {
        assert_eq!(
            main.matches(&format!("// +kubeforge:scaffold:{marker}\n")).count(),
            1,
            "marker {marker} must survive"
        );
    }

    assert!(read(&fs, "api/v1/cronjob_types.go").contains("type CronJobSpec struct {"));
    assert!(read(&fs, "hack/boilerplate.go.txt").contains("Copyright 2026 The CronJob Authors."));
    assert!(
        read(&fs, "config/crd/kustomization.yaml")
            .contains("- bases/batch.example.com_cronjobs.yaml\n")
    );

    let config = project(&fs);
    assert_eq!(config.stage(), ProjectStage::ApiAdded);
    assert_eq!(config.domain(), Some("example.com"));
    assert_eq!(config.repo(), Some("example.com/cronjob"));
    assert_eq!(config.resources().len(), 1);
    let entry = &config.resources()[0];
    assert_eq!(entry.id, ResourceId::new("batch", "v1", "CronJob").unwrap());
    assert!(entry.controller);
    assert_eq!(
        config.plugins().iter().map(|p| p.key.as_str()).collect::<Vec<_>>(),
        vec![
            "kustomize.common.kubeforge.io/v2",
            "base.go.kubeforge.io/v4",
            "kustomize.common.kubeforge.io/v2",
            "base.go.kubeforge.io/v4",
        ]
    );
}

#[test]
fn test_bundle_equals_members_applied_in_sequence() {
    let registry = registry();
    let root = Path::new(ROOT);

    let bundled = MemoryFilesystem::new();
    scaffold_cronjob(&bundled);

    let sequential = MemoryFilesystem::new();
    let bundle = registry.resolve("go/v4").unwrap();
    for (capability, ctx) in [
        (Capability::Init, init_ctx(root)),
        (Capability::CreateApi, api_ctx(root)),
    ] {
        for member in bundle.members() {
            member.scaffold(capability, &ctx, &sequential).unwrap();
        }
    }

    assert_eq!(bundled.list_files(), sequential.list_files());
    for path in bundled.list_files() {
        assert_eq!(bundled.read_file(&path), sequential.read_file(&path), "{}", path.display());
    }
}

#[test]
fn test_webhook_after_api() {
    let fs = MemoryFilesystem::new();
    scaffold_cronjob(&fs);

    let registry = registry();
    let scaffolder = Scaffolder::new(Box::new(fs.clone()));
    scaffolder
        .run(
            registry.resolve("go/v4").unwrap().as_ref(),
            Capability::CreateWebhook,
            &webhook_ctx(Path::new(ROOT)),
        )
        .unwrap();

    let webhook = read(&fs, "internal/webhook/v1/cronjob_webhook.go");
    assert!(webhook.contains("WithDefaulter(&CronJobCustomDefaulter{})."));
    assert!(webhook.contains("WithValidator(&CronJobCustomValidator{})."));
    assert!(webhook.contains("\"sigs.k8s.io/controller-runtime/pkg/webhook/admission\""));

    let default = read(&fs, "config/default/kustomization.yaml");
    assert!(default.contains("\n- ../webhook\n"));
    assert!(default.contains("\n- ../certmanager\n"));

    assert_eq!(project(&fs).stage(), ProjectStage::WebhookAdded);
}

#[test]
fn test_create_api_before_init_is_refused() {
    let fs = MemoryFilesystem::new();
    let registry = registry();
    let scaffolder = Scaffolder::new(Box::new(fs.clone()));

    let err = scaffolder
        .run(
            registry.resolve("go/v4").unwrap().as_ref(),
            Capability::CreateApi,
            &api_ctx(Path::new(ROOT)),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(fs.list_files().is_empty());
}

#[test]
fn test_second_init_is_refused() {
    let fs = MemoryFilesystem::new();
    scaffold_cronjob(&fs);

    let registry = registry();
    let err = Scaffolder::new(Box::new(fs.clone()))
        .run(
            registry.resolve("go/v4").unwrap().as_ref(),
            Capability::Init,
            &init_ctx(Path::new(ROOT)),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test]
fn test_unsupported_project_version() {
    let registry = registry();
    let ctx = GenerationContext::builder(ROOT)
        .domain("example.com")
        .project_version(ProjectVersion::new(2))
        .build()
        .unwrap();

    let err = Scaffolder::new(Box::new(MemoryFilesystem::new()))
        .run(
            registry.resolve("go/v4").unwrap().as_ref(),
            Capability::Init,
            &ctx,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VersionMismatch);
}

#[test]
fn test_failure_in_second_member_is_wrapped_by_bundle() {
    let fs = MemoryFilesystem::new();
    let registry = registry();
    let bundle = registry.resolve("go/v4").unwrap();
    let scaffolder = Scaffolder::new(Box::new(fs.clone()));
    let root = Path::new(ROOT);

    scaffolder
        .run(bundle.as_ref(), Capability::Init, &init_ctx(root))
        .unwrap();
    let main = read(&fs, "cmd/main.go").replace("\t// +kubeforge:scaffold:scheme\n", "");
    fs.seed(root.join("cmd/main.go"), &main).unwrap();

    let err = scaffolder
        .run(bundle.as_ref(), Capability::CreateApi, &api_ctx(root))
        .unwrap_err();

    match &err {
        ForgeError::Bundle {
            bundle, step, member, ..
        } => {
            assert_eq!(bundle.to_string(), "go.kubeforge.io/v4");
            assert_eq!(*step, 2);
            assert_eq!(member.to_string(), "base.go.kubeforge.io/v4");
        }
        other => panic!("expected a bundle error, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::MarkerNotFound);
    assert_eq!(
        err.plugin_chain()
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>(),
        vec![
            "go.kubeforge.io/v4",
            "base.go.kubeforge.io/v4",
            "base.go.kubeforge.io/v4"
        ]
    );
    // main.go is left exactly as it was, and the step wrote no sources.
    assert_eq!(read(&fs, "cmd/main.go"), main);
    assert!(fs.read_file(root.join("api/v1/cronjob_types.go")).is_none());
}

#[test]
fn test_dry_run_reports_what_a_real_run_writes() {
    let fs = MemoryFilesystem::new();
    let registry = registry();
    let bundle = registry.resolve("go/v4").unwrap();
    let root = Path::new(ROOT);

    let mut scaffolder = Scaffolder::new(Box::new(fs.clone()));
    scaffolder
        .run(bundle.as_ref(), Capability::Init, &init_ctx(root))
        .unwrap();

    let before: Vec<(PathBuf, Option<String>)> = fs
        .list_files()
        .into_iter()
        .map(|p| {
            let content = fs.read_file(&p);
            (p, content)
        })
        .collect();

    let base: Arc<dyn Filesystem> = Arc::new(fs.clone());
    let dry_run = DryRunFilesystem::new(base);
    scaffolder.inject_filesystem(Box::new(dry_run.clone()));
    scaffolder
        .run(bundle.as_ref(), Capability::CreateApi, &api_ctx(root))
        .unwrap();

    let untouched: Vec<(PathBuf, Option<String>)> = fs
        .list_files()
        .into_iter()
        .map(|p| {
            let content = fs.read_file(&p);
            (p, content)
        })
        .collect();
    assert_eq!(before, untouched);

    let reported: BTreeSet<PathBuf> = dry_run.changes().into_iter().map(|c| c.path).collect();

    scaffolder.inject_filesystem(Box::new(fs.clone()));
    scaffolder
        .run(bundle.as_ref(), Capability::CreateApi, &api_ctx(root))
        .unwrap();
    let written: BTreeSet<PathBuf> = fs
        .list_files()
        .into_iter()
        .filter(|p| {
            before
                .iter()
                .find(|(q, _)| q == p)
                .is_none_or(|(_, content)| *content != fs.read_file(p))
        })
        .collect();

    assert_eq!(reported, written);
}

#[test]
fn test_local_filesystem_round_trip() {
    let temp = tempfile::TempDir::new().unwrap();
    let root = temp.path().join("cronjob");
    std::fs::create_dir_all(&root).unwrap();

    let registry = registry();
    let bundle = registry.resolve("go/v4").unwrap();
    let scaffolder = Scaffolder::new(Box::new(LocalFilesystem::new()));

    scaffolder
        .run(bundle.as_ref(), Capability::Init, &init_ctx(&root))
        .unwrap();
    scaffolder
        .run(bundle.as_ref(), Capability::CreateApi, &api_ctx(&root))
        .unwrap();
    scaffolder
        .run(bundle.as_ref(), Capability::CreateWebhook, &webhook_ctx(&root))
        .unwrap();

    let main = std::fs::read_to_string(root.join("cmd/main.go")).unwrap();
    assert!(main.contains("webhookbatchv1.SetupCronJobWebhookWithManager(mgr)"));

    let config = ProjectConfig::from_yaml(&std::fs::read_to_string(root.join("PROJECT")).unwrap())
        .unwrap();
    assert_eq!(config.stage(), ProjectStage::WebhookAdded);

    let edit = GenerationContext::builder(&root)
        .flags(FeatureFlags {
            restricted_pod_standards: true,
            ..FeatureFlags::default()
        })
        .build()
        .unwrap();
    scaffolder
        .run(bundle.as_ref(), Capability::Edit, &edit)
        .unwrap();
    let manager = std::fs::read_to_string(root.join("config/manager/manager.yaml")).unwrap();
    assert!(manager.contains("        seccompProfile:\n          type: RuntimeDefault\n"));
    assert!(!manager.contains("# seccompProfile:"));
}

#[test]
fn test_network_policy_overlay_after_bundle() {
    let fs = MemoryFilesystem::new();
    scaffold_cronjob(&fs);

    let registry = registry();
    let overlay = registry.resolve("network-policy").unwrap();
    let scaffolder = Scaffolder::new(Box::new(fs.clone()));
    let ctx = GenerationContext::builder(ROOT).build().unwrap();

    scaffolder.run(overlay.as_ref(), Capability::Edit, &ctx).unwrap();
    assert!(read(&fs, "config/default/kustomization.yaml").contains("\n- ../network-policy\n"));
    assert!(project(&fs).edits_applied());

    let err = scaffolder
        .run(overlay.as_ref(), Capability::Init, &ctx)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedCapability);
}
