use clap::Parser;
use sshtab::cli::Cli;
use sshtab::commands::{self, Failure};
use sshtab::logging::init_tracing;
use sshtab_store::Config;
use std::process::ExitCode;
use tracing::debug;

fn main() -> ExitCode {
    if let Err(err) = init_tracing() {
        eprintln!("Failed to initialize tracing: {err}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    let op = cli.command.name();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{op} failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    debug!("data dir {}", config.data_dir().display());

    let mut stdout = std::io::stdout().lock();
    match commands::run(cli.command, &config, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Quiet) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{op} failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
