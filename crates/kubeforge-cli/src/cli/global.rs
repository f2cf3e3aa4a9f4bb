//! Flags shared by every subcommand.

use std::path::PathBuf;

use clap::{ArgAction, Args, ValueEnum};

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Log more: `-v` info, `-vv` debug (files and markers), `-vvv` trace.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Never emit ANSI colors. Also enabled by `NO_COLOR`.
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Read settings from FILE instead of the per-user config.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Operator project root.
    #[arg(short = 'C', long, global = true, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// List the files a command would create or modify, and write none.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human on a terminal, plain otherwise.
    #[default]
    Auto,
    Human,
    Plain,
    /// One JSON document on stdout; logs become JSON lines on stderr.
    Json,
}
