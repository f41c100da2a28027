mod cli;

use crate::cli::Cli;
use car_core::config::{Mode, RunConfig};
use clap::Parser;
use eyre::Result;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("car: failed to install error handler: {e}");
        return ExitCode::from(2);
    }

    let cli = Cli::parse();
    if let Err(msg) = cli.validate() {
        eprintln!("car: {msg}");
        return ExitCode::from(2);
    }

    init_logging(cli.verbose);

    match run(&cli) {
        Ok(exit_flag) if exit_flag.is_raised() => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("car: {e:?}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<car_core::errors::ExitFlag> {
    let mode = if cli.list {
        Mode::List
    } else if cli.extract {
        Mode::Extract
    } else {
        Mode::Create
    };
    let config = RunConfig::new(mode, cli.verbose, cli.file.clone());

    match mode {
        Mode::Create => car_core::create(&config, &cli.paths),
        Mode::Extract => {
            let dest_root = cli.directory.clone().unwrap_or_else(|| PathBuf::from("."));
            car_core::extract(&config, &dest_root)
        }
        Mode::List => car_core::list(&config),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
