pub mod apply;
pub mod check;
pub mod install;

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{self, Config, InstallRequest};
use crate::error::{ExecError, ManagerError};
use crate::exec::{Shell, StatusSink, StreamSink, SystemExecutor};
use crate::logging::{InstallStatus, Logger};
use crate::managers::{Context, InstallOptions, Registry};

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates manifest loading and executor construction so that each
/// command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// The loaded manifest.
    pub config: Config,
    /// Managers for this host, constructed on first use.
    pub registry: Registry,
}

impl CommandSetup {
    /// Load the manifest and build a registry over the real host.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest exists but cannot be read or parsed.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let path = config::resolve_path(global.config.as_deref());

        log.stage("Loading configuration");
        let config = Config::load(&path)
            .with_context(|| format!("loading manifest {}", path.display()))?;
        log.debug(&format!("manifest: {}", path.display()));

        let warnings = config.validate();
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!(
                    "  {} [{}]: {}",
                    warning.section, warning.item, warning.message
                ));
            }
        }

        let mut executor = SystemExecutor::new();
        if let Some(shell) = &config.shell {
            log.debug(&format!("shell override: {}", shell.display()));
            executor = executor.with_shell(Shell::from_path(shell.clone()));
        }
        log.debug(&format!("shell: {}", executor.shell().program().display()));

        let ctx = Context::system(Arc::new(executor));
        let ctx = if global.quiet || config.quiet {
            ctx.with_sink(StatusSink::new())
        } else {
            ctx.with_sink(StreamSink)
        };
        log.debug(&format!("platform: {}", ctx.platform));

        Ok(Self::from_parts(config, ctx))
    }

    /// Assemble a setup from an already loaded manifest and context.
    #[must_use]
    pub fn from_parts(config: Config, ctx: Context) -> Self {
        Self {
            config,
            registry: Registry::new(ctx),
        }
    }
}

/// Resolve the manager for `request` and install its packages, recording
/// one summary entry per package.
///
/// Setup failures mark every package of the request failed; an unsupported
/// manager marks them skipped. Neither stops the caller from continuing with
/// the next request.
pub fn run_request(
    registry: &Registry,
    request: &InstallRequest,
    all_or_nothing: bool,
    log: &Logger,
) {
    let label = |package: &str| format!("{}: {package}", request.manager);
    let record_all = |status: InstallStatus, reason: &str| {
        for package in &request.packages {
            log.record(&label(package), status, Some(reason));
        }
    };

    let manager = match registry.get(request.manager) {
        Ok(manager) => manager,
        Err(ManagerError::Unsupported { platform, .. }) => {
            log.info(&format!(
                "{} is not supported on {platform}, skipping",
                request.manager
            ));
            record_all(InstallStatus::Skipped, "unsupported");
            return;
        }
        Err(e) => {
            log.error(&error_chain(&e));
            record_all(InstallStatus::Failed, &setup_reason(&e));
            return;
        }
    };

    let mut options = InstallOptions::new().class(request.class);
    if all_or_nothing {
        options = options.all_or_nothing();
    }

    match manager.install(request.packages.as_slice(), &options) {
        Ok(report) => {
            for package in &report.installed {
                log.record(&label(package), InstallStatus::Ok, None);
            }
            for failure in &report.failed {
                log.record(
                    &label(&failure.package),
                    InstallStatus::Failed,
                    Some(&failure_reason(&failure.error)),
                );
            }
        }
        Err(ManagerError::Install {
            package, source, ..
        }) => {
            // All-or-nothing stops at the first failure: everything before it
            // was installed, nothing after it was attempted.
            let mut reached = false;
            for name in &request.packages {
                if reached {
                    log.record(&label(name), InstallStatus::Skipped, Some("not attempted"));
                } else if *name == package {
                    reached = true;
                    log.record(
                        &label(name),
                        InstallStatus::Failed,
                        Some(&failure_reason(&source)),
                    );
                } else {
                    log.record(&label(name), InstallStatus::Ok, None);
                }
            }
        }
        Err(e) => {
            log.error(&e.to_string());
            record_all(InstallStatus::Failed, &e.to_string());
        }
    }
}

fn failure_reason(error: &ExecError) -> String {
    error
        .exit_code()
        .map_or_else(|| error.to_string(), |code| format!("exit {code}"))
}

fn setup_reason(error: &ManagerError) -> String {
    match error {
        ManagerError::Setup { manager, .. } => format!("{manager} setup failed"),
        ManagerError::Dependency { dependency, .. } => format!("{dependency} setup failed"),
        ManagerError::PreviouslyFailed { manager } => format!("{manager} setup failed earlier"),
        other => other.to_string(),
    }
}

/// Render an error followed by each of its causes, `: `-separated.
#[must_use]
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Print the summary and bail if any package failed.
///
/// # Errors
///
/// Returns an error if one or more packages recorded a failure.
pub fn finish(log: &Logger) -> Result<()> {
    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} package(s) failed");
    }
    Ok(())
}
