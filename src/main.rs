use std::process::ExitCode;

use clap::Parser;

use provision_cli::cli::{Cli, Command};
use provision_cli::commands;
use provision_cli::logging::{self, Logger};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let name = args.command.name();
    logging::init_subscriber(args.verbose, name);

    // An interrupted run is the user's choice, not a failure.
    if let Err(e) = ctrlc::set_handler(|| std::process::exit(0)) {
        tracing::debug!("could not install interrupt handler: {e}");
    }

    let log = Logger::new(name);
    let result = match &args.command {
        Command::Check => commands::check::run(&log),
        Command::Install(opts) => commands::install::run(&args.global, opts, &log),
        Command::Apply(opts) => commands::apply::run(&args.global, opts, &log),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            log.error("provisioning failed");
            ExitCode::FAILURE
        }
    }
}
