//! `kubeforge`: plugin-driven scaffolding for Kubernetes operator projects.
//!
//! Exit codes: `0` success, `1` internal or I/O failure, `2` invalid input
//! or unmet precondition, `3` something was not found (directory, plugin,
//! marker, text), `4` configuration problem or project version mismatch.

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};

use crate::{
    cli::{Cli, Commands},
    config::AppConfig,
    error::{CliError, CliResult},
    logging::init_logging,
    output::OutputManager,
};

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap reports --help and --version through the error path on stdout.
            let code = if e.use_stderr() { 2 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    if let Err(e) = init_logging(&cli.global) {
        eprintln!("kubeforge: {e:#}");
        return ExitCode::from(1);
    }
    debug!(
        command = ?cli.command,
        dir = %cli.global.dir.display(),
        dry_run = cli.global.dry_run,
        "starting"
    );

    let verbose = cli.global.verbose > 0;
    let config = match AppConfig::load(cli.global.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            let err = CliError::ConfigError {
                message: format!("{e:#}"),
                source: None,
            };
            return handle_error(err, verbose);
        }
    };
    let output = OutputManager::new(&cli.global, &config);

    match run(cli, config, output) {
        Ok(()) => {
            info!("done");
            ExitCode::SUCCESS
        }
        Err(e) => handle_error(e, verbose),
    }
}

#[instrument(skip_all)]
fn run(cli: Cli, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.global, config, output),
        Commands::Create(command) => commands::create::execute(command, cli.global, config, output),
        Commands::Edit(args) => commands::edit::execute(args, cli.global, config, output),
        Commands::Plugins(args) => commands::plugins::execute(args, config, output),
        Commands::Completions(args) => commands::completions::execute(args),
        Commands::Version => commands::version::execute(output),
    }
}

fn handle_error(err: CliError, verbose: bool) -> ExitCode {
    err.log();
    let color = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    eprint!("{}", err.report(verbose, color));
    ExitCode::from(err.exit_code())
}
