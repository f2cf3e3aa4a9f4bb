//! Tracing subscriber for the `kubeforge` binary.
//!
//! The library crates only emit events. `-q` maps to ERROR, no flag to WARN,
//! and each `-v` raises the level one step up to TRACE. A `RUST_LOG` value
//! replaces the derived filter entirely.

use std::io::IsTerminal as _;

use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::cli::{GlobalArgs, OutputFormat};

const TARGETS: &[&str] = &["kubeforge", "kubeforge_core", "kubeforge_adapters"];

/// Install the global subscriber. Call once, before the first event.
pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(level(args))));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs always go to stderr so stdout stays machine-readable.
    let installed = match args.output_format {
        OutputFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        _ => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(!args.no_color && std::io::stderr().is_terminal())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("cannot install tracing subscriber: {e}"))
}

fn level(args: &GlobalArgs) -> LevelFilter {
    if args.quiet {
        return LevelFilter::ERROR;
    }
    match args.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn directives(level: LevelFilter) -> String {
    let level = level.to_string().to_lowercase();
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Cli;

    fn global(flags: &[&str]) -> GlobalArgs {
        let mut argv = vec!["kubeforge"];
        argv.extend_from_slice(flags);
        argv.push("version");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn verbosity_steps_through_levels() {
        assert_eq!(level(&global(&[])), LevelFilter::WARN);
        assert_eq!(level(&global(&["-v"])), LevelFilter::INFO);
        assert_eq!(level(&global(&["-vv"])), LevelFilter::DEBUG);
        assert_eq!(level(&global(&["-vvvvv"])), LevelFilter::TRACE);
    }

    #[test]
    fn quiet_logs_errors_only() {
        assert_eq!(level(&global(&["--quiet"])), LevelFilter::ERROR);
    }

    #[test]
    fn every_crate_gets_the_same_level() {
        assert_eq!(
            directives(LevelFilter::DEBUG),
            "kubeforge=debug,kubeforge_core=debug,kubeforge_adapters=debug"
        );
    }
}
