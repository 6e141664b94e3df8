//! Command: install packages with one named package manager.
use anyhow::Result;

use super::{CommandSetup, finish, run_request};
use crate::cli::{GlobalOpts, InstallOpts};
use crate::config::InstallRequest;
use crate::error::ManagerError;
use crate::logging::Logger;
use crate::managers::Registry;

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, the manager is not
/// supported on this host, or any package fails.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    log.info(&format!("provision {}", crate::VERSION));
    let setup = CommandSetup::init(global, log)?;
    execute(&setup.registry, opts, log)
}

/// Install `opts.packages` through `registry`.
///
/// Unlike `apply`, an unsupported manager is an error here: it was asked for
/// by name.
///
/// # Errors
///
/// Returns an error if the manager is unsupported or any package fails.
pub fn execute(registry: &Registry, opts: &InstallOpts, log: &Logger) -> Result<()> {
    let ctx = registry.context();
    if !opts.manager.is_supported(ctx) {
        return Err(ManagerError::Unsupported {
            manager: opts.manager,
            platform: ctx.platform,
        }
        .into());
    }

    log.stage(&format!("Installing with {}", opts.manager));
    let request = InstallRequest {
        manager: opts.manager,
        class: opts.class(),
        packages: opts.packages.clone(),
    };
    run_request(registry, &request, opts.all_or_nothing, log);
    finish(log)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use crate::logging::{InstallStatus, isolated_logger};
    use crate::managers::test_helpers::{MockExecutor, context, context_with};
    use crate::operations::MockFileSystemOps;
    use crate::platform::{Arch, Os, Platform};
    use clap::Parser as _;

    const MAC: Platform = Platform::new(Os::MacOs, Arch::Aarch64);

    fn opts(args: &[&str]) -> InstallOpts {
        let mut argv = vec!["provision", "install"];
        argv.extend_from_slice(args);
        let Command::Install(opts) = Cli::parse_from(argv).command else {
            panic!("expected install");
        };
        opts
    }

    fn brew() -> MockFileSystemOps {
        MockFileSystemOps::new().with_existing("/opt/homebrew/bin/brew")
    }

    #[test]
    fn installs_casks_through_homebrew() {
        let (log, _tmp, _guard) = isolated_logger();
        let (ctx, exec) = context(MAC, brew());
        let registry = Registry::new(ctx);

        execute(&registry, &opts(&["brew", "--cask", "iterm2", "rectangle"]), &log).unwrap();

        insta::assert_debug_snapshot!(exec.rendered(), @r#"
        [
            "/opt/homebrew/bin/brew update",
            "/opt/homebrew/bin/brew install --cask iterm2",
            "/opt/homebrew/bin/brew install --cask rectangle",
        ]
        "#);
        assert!(
            log.entries()
                .iter()
                .all(|e| e.status == InstallStatus::Ok)
        );
    }

    #[test]
    fn unsupported_manager_is_an_error() {
        let (log, _tmp, _guard) = isolated_logger();
        let (ctx, exec) = context(MAC, brew());
        let registry = Registry::new(ctx);

        let err = execute(&registry, &opts(&["winget", "Git.Git"]), &log).unwrap_err();

        assert_eq!(err.to_string(), "winget is not supported on macos-aarch64");
        assert_eq!(exec.call_count(), 0);
    }

    #[test]
    fn failed_package_fails_the_command() {
        let (log, _tmp, _guard) = isolated_logger();
        let exec = MockExecutor::new()
            .then(0, "")
            .then(1, "Error: No available formula with the name \"nope\".");
        let (ctx, _exec) = context_with(MAC, brew(), exec);
        let registry = Registry::new(ctx);

        let err = execute(&registry, &opts(&["brew", "nope", "git"]), &log).unwrap_err();

        assert_eq!(err.to_string(), "1 package(s) failed");
        assert_eq!(log.entries().len(), 2);
    }
}
