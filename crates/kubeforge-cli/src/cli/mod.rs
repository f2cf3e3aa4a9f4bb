//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums. No business logic lives here.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use kubeforge_core::domain::ProjectVersion;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "kubeforge",
    bin_name = "kubeforge",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Scaffold Kubernetes operator projects",
    long_about = "kubeforge lays out Go operator projects and grows them one \
                  API and webhook at a time through versioned plugins.",
    after_help = "EXAMPLES:\n\
        \x20 kubeforge init --domain example.com --repo example.com/cronjob\n\
        \x20 kubeforge create api --group batch --version v1 --kind CronJob\n\
        \x20 kubeforge create webhook --group batch --version v1 --kind CronJob --defaulting\n\
        \x20 kubeforge edit --plugins network-policy/v1-alpha\n\
        \x20 kubeforge completions bash > /usr/share/bash-completion/completions/kubeforge",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize a new operator project.
    #[command(
        about = "Initialize a new project",
        after_help = "EXAMPLES:\n\
            \x20 kubeforge init --domain example.com\n\
            \x20 kubeforge init --domain example.com --repo github.com/acme/cronjob --owner \"The CronJob Authors\"\n\
            \x20 kubeforge init --domain example.com --plugins kustomize/v2,base.go/v4"
    )]
    Init(InitArgs),

    /// Scaffold an API or a webhook.
    #[command(about = "Scaffold a Kubernetes API or webhook", subcommand)]
    Create(CreateCommands),

    /// Change project-wide settings.
    #[command(
        about = "Update the project configuration",
        after_help = "EXAMPLES:\n\
            \x20 kubeforge edit --multigroup\n\
            \x20 kubeforge edit --restricted-pod-standards\n\
            \x20 kubeforge edit --plugins network-policy/v1-alpha"
    )]
    Edit(EditArgs),

    /// List the available plugins and bundles.
    #[command(visible_alias = "ls", about = "List available plugins")]
    Plugins(PluginsArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 kubeforge completions bash > ~/.local/share/bash-completion/completions/kubeforge\n\
            \x20 kubeforge completions zsh  > ~/.zfunc/_kubeforge\n\
            \x20 kubeforge completions fish > ~/.config/fish/completions/kubeforge.fish"
    )]
    Completions(CompletionsArgs),

    /// Print version information.
    #[command(about = "Print version information")]
    Version,
}

/// Subcommands of `kubeforge create`.
#[derive(Debug, Subcommand)]
pub enum CreateCommands {
    /// Scaffold a resource type and its controller.
    #[command(
        about = "Scaffold a Kubernetes API",
        after_help = "EXAMPLES:\n\
            \x20 kubeforge create api --group batch --version v1 --kind CronJob\n\
            \x20 kubeforge create api --group ship --version v1beta1 --kind Frigate --namespaced=false\n\
            \x20 kubeforge create api --group batch --version v1 --kind CronJob --controller=false"
    )]
    Api(CreateApiArgs),

    /// Scaffold admission webhooks for an existing API.
    #[command(
        about = "Scaffold a webhook for an API",
        after_help = "EXAMPLES:\n\
            \x20 kubeforge create webhook --group batch --version v1 --kind CronJob --defaulting\n\
            \x20 kubeforge create webhook --group batch --version v1 --kind CronJob --programmatic-validation"
    )]
    Webhook(CreateWebhookArgs),
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `kubeforge init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Domain for the project's API groups.
    #[arg(long = "domain", value_name = "DOMAIN", help = "Domain for API groups")]
    pub domain: Option<String>,

    /// Go module path. Defaults to `<domain>/<project-name>`.
    #[arg(long = "repo", value_name = "MODULE", help = "Go module path")]
    pub repo: Option<String>,

    /// Project name. Defaults to the directory name.
    #[arg(long = "project-name", value_name = "NAME", help = "Project name")]
    pub project_name: Option<String>,

    /// Name used in copyright headers.
    #[arg(long = "owner", value_name = "OWNER", help = "Copyright owner")]
    pub owner: Option<String>,

    #[command(flatten)]
    pub plugins: PluginSelection,

    /// PROJECT file version.
    #[arg(
        long = "project-version",
        value_name = "VERSION",
        help = "PROJECT file version"
    )]
    pub project_version: Option<ProjectVersion>,

    /// Enforce the restricted Pod Security Standard on the manager.
    #[arg(
        long = "restricted-pod-standards",
        help = "Apply restricted pod security settings to the manager"
    )]
    pub restricted_pod_standards: bool,
}

// ── create api ────────────────────────────────────────────────────────────────

/// Group, version and kind of the resource being scaffolded.
#[derive(Debug, Args)]
pub struct ResourceArgs {
    /// API group (the part before the domain).
    #[arg(long = "group", value_name = "GROUP", help = "API group")]
    pub group: String,

    /// API version, e.g. `v1` or `v1beta1`.
    #[arg(long = "version", value_name = "VERSION", help = "API version")]
    pub api_version: String,

    /// Kind, in PascalCase.
    #[arg(long = "kind", value_name = "KIND", help = "Resource kind")]
    pub kind: String,
}

/// Arguments for `kubeforge create api`.
#[derive(Debug, Args)]
pub struct CreateApiArgs {
    #[command(flatten)]
    pub resource_id: ResourceArgs,

    /// Resource plural. Derived from the kind when omitted.
    #[arg(long = "plural", value_name = "PLURAL", help = "Resource plural")]
    pub plural: Option<String>,

    #[arg(
        long = "namespaced",
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        help = "Whether the resource is namespaced"
    )]
    pub namespaced: bool,

    #[arg(
        long = "resource",
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        help = "Scaffold the resource types"
    )]
    pub resource: bool,

    #[arg(
        long = "controller",
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        help = "Scaffold the controller"
    )]
    pub controller: bool,

    #[command(flatten)]
    pub plugins: PluginSelection,

    /// Regenerate files that already exist.
    #[arg(long = "force", help = "Overwrite existing files")]
    pub force: bool,
}

// ── create webhook ────────────────────────────────────────────────────────────

/// Arguments for `kubeforge create webhook`.
#[derive(Debug, Args)]
pub struct CreateWebhookArgs {
    #[command(flatten)]
    pub resource_id: ResourceArgs,

    #[arg(long = "defaulting", help = "Scaffold a defaulting webhook")]
    pub defaulting: bool,

    #[arg(
        long = "programmatic-validation",
        help = "Scaffold a validating webhook"
    )]
    pub programmatic_validation: bool,

    #[command(flatten)]
    pub plugins: PluginSelection,

    /// Regenerate files that already exist.
    #[arg(long = "force", help = "Overwrite existing files")]
    pub force: bool,
}

// ── edit ──────────────────────────────────────────────────────────────────────

/// Arguments for `kubeforge edit`.
#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(long = "multigroup", help = "Enable the multi-group layout")]
    pub multigroup: bool,

    #[arg(
        long = "restricted-pod-standards",
        help = "Apply restricted pod security settings to the manager"
    )]
    pub restricted_pod_standards: bool,

    #[arg(long = "prometheus", help = "Enable the Prometheus ServiceMonitor")]
    pub prometheus: bool,

    #[arg(
        long = "disable-metrics",
        help = "Stop exposing the manager metrics service"
    )]
    pub disable_metrics: bool,

    #[command(flatten)]
    pub plugins: PluginSelection,

    /// Re-run an edit that was already applied.
    #[arg(long = "force", help = "Re-apply an edit that already ran")]
    pub force: bool,
}

/// `--plugins`, shared by every scaffolding subcommand.
#[derive(Debug, Default, Args)]
pub struct PluginSelection {
    /// Comma-separated plugin keys, run in the order given.
    #[arg(
        long = "plugins",
        value_name = "KEYS",
        value_delimiter = ',',
        help = "Plugins to run, e.g. go/v4 or kustomize/v2,base.go/v4"
    )]
    pub plugins: Vec<String>,
}

// ── plugins ───────────────────────────────────────────────────────────────────

/// Arguments for `kubeforge plugins`.
#[derive(Debug, Args)]
pub struct PluginsArgs {
    /// Show bundle members under each bundle.
    #[arg(long = "members", help = "Show the members of each bundle")]
    pub members: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `kubeforge completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── tests ─────────────────────────────────────────────────────────────────────
