//! Tests for error messages, suggestions and exit codes.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn kubeforge(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("kubeforge");
    cmd.current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("KUBEFORGE_TEMPLATES_DIR")
        .arg("--dir")
        .arg(dir);
    cmd
}

fn init(dir: &Path) {
    kubeforge(dir)
        .args(["init", "--domain", "example.com", "--repo", "example.com/cronjob"])
        .assert()
        .success();
}

const API: [&str; 8] = [
    "create", "api", "--group", "batch", "--version", "v1", "--kind", "CronJob",
];

#[test]
fn test_create_api_before_init_is_a_precondition_error() {
    let temp = TempDir::new().unwrap();
    kubeforge(temp.path())
        .args(API)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not initialized"))
        .stderr(predicate::str::contains("kubeforge init"));
}

#[test]
fn test_second_init_is_refused() {
    let temp = TempDir::new().unwrap();
    init(temp.path());

    kubeforge(temp.path())
        .args(["init", "--domain", "example.com"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_missing_explicit_config_file_is_a_configuration_error() {
    let temp = TempDir::new().unwrap();
    kubeforge(temp.path())
        .args(["--config", "absent.toml", "init", "--domain", "example.com"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("absent.toml"));
}

#[test]
fn test_init_without_domain_is_refused() {
    let temp = TempDir::new().unwrap();
    kubeforge(temp.path())
        .args(["init"])
        .env("KUBEFORGE_DEFAULTS__DOMAIN", "")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--domain"));
}

#[test]
fn test_invalid_domain_is_a_user_error() {
    let temp = TempDir::new().unwrap();
    kubeforge(temp.path())
        .args(["init", "--domain", "Example_Com"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Example_Com"));
}

#[test]
fn test_unknown_plugin_is_not_found() {
    let temp = TempDir::new().unwrap();
    kubeforge(temp.path())
        .args(["init", "--domain", "example.com", "--plugins", "helm/v1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("helm/v1"))
        .stderr(predicate::str::contains("kubeforge plugins"));
}

#[test]
fn test_unsupported_project_version_is_a_version_mismatch() {
    let temp = TempDir::new().unwrap();
    kubeforge(temp.path())
        .args(["init", "--domain", "example.com", "--project-version", "2"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("go.kubeforge.io/v4"));

    assert!(!temp.path().join("PROJECT").exists());
}

#[test]
fn test_missing_project_directory_is_not_found() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nowhere");
    let mut cmd = cargo_bin_cmd!("kubeforge");
    cmd.current_dir(temp.path())
        .env("NO_COLOR", "1")
        .arg("--dir")
        .arg(&missing)
        .args(API)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("nowhere"));
}

#[test]
fn test_removed_marker_fails_closed_with_plugin_chain() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    init(dir);

    let main_path = dir.join("cmd/main.go");
    let edited = fs::read_to_string(&main_path)
        .unwrap()
        .replace("\t// +kubeforge:scaffold:scheme\n", "");
    fs::write(&main_path, &edited).unwrap();

    kubeforge(dir)
        .arg("-v")
        .args(API)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("+kubeforge:scaffold:scheme"))
        .stderr(predicate::str::contains("cmd/main.go"))
        .stderr(predicate::str::contains(
            "Plugins: go.kubeforge.io/v4 -> base.go.kubeforge.io/v4",
        ));

    assert_eq!(fs::read_to_string(&main_path).unwrap(), edited);
}

#[test]
fn test_webhook_without_kind_of_webhook_is_refused() {
    let temp = TempDir::new().unwrap();
    init(temp.path());
    kubeforge(temp.path()).args(API).assert().success();

    kubeforge(temp.path())
        .args([
            "create", "webhook", "--group", "batch", "--version", "v1", "--kind", "CronJob",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--defaulting"));
}

#[test]
fn test_duplicate_api_requires_force() {
    let temp = TempDir::new().unwrap();
    init(temp.path());
    kubeforge(temp.path()).args(API).assert().success();

    kubeforge(temp.path())
        .args(API)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));

    kubeforge(temp.path()).args(API).arg("--force").assert().success();
}

#[test]
fn test_bad_template_directory_is_a_configuration_error() {
    let temp = TempDir::new().unwrap();
    kubeforge(temp.path())
        .env("KUBEFORGE_TEMPLATES_DIR", temp.path().join("no-templates"))
        .args(["plugins"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("no-templates"));
}

#[test]
fn test_unknown_subcommand_exits_with_usage_error() {
    let temp = TempDir::new().unwrap();
    kubeforge(temp.path())
        .arg("frobnicate")
        .assert()
        .code(2);
}
