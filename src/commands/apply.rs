//! Command: install everything listed in the manifest.
use anyhow::Result;

use super::{CommandSetup, finish, run_request};
use crate::cli::{ApplyOpts, GlobalOpts};
use crate::config::Config;
use crate::logging::Logger;
use crate::managers::{PackageClass, Registry};

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or any package fails.
pub fn run(global: &GlobalOpts, opts: &ApplyOpts, log: &Logger) -> Result<()> {
    log.info(&format!("provision {}", crate::VERSION));
    let setup = CommandSetup::init(global, log)?;
    execute(&setup.config, &setup.registry, opts.all_or_nothing, log)
}

/// Install each manifest section with its manager.
///
/// Managers that cannot run here are skipped; a manager whose setup fails
/// fails its own packages while the remaining sections still run.
///
/// # Errors
///
/// Returns an error if any package failed.
pub fn execute(
    config: &Config,
    registry: &Registry,
    all_or_nothing: bool,
    log: &Logger,
) -> Result<()> {
    let requests = config.requests();
    if requests.is_empty() {
        log.info("manifest lists no packages, nothing to do");
        return Ok(());
    }

    for request in &requests {
        let what = match request.class {
            PackageClass::Standard => "packages".to_string(),
            class => format!("{class} packages"),
        };
        log.stage(&format!(
            "Installing {} {what} with {}",
            request.packages.len(),
            request.manager
        ));
        run_request(registry, request, all_or_nothing, log);
    }

    finish(log)
}
