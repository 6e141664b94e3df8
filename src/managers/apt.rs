//! APT on Debian-family Linux.
use super::{Context, ManagerKind, PackageClass, PackageManager, ensure_supported};
use crate::error::ManagerError;
use crate::exec::Command;

/// APT. Every command it runs is elevated.
#[derive(Debug)]
pub struct Apt {
    ctx: Context,
}

impl Apt {
    /// Set up APT by refreshing the package index.
    ///
    /// There is no bootstrap: support already requires `apt-get` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Unsupported`] off Debian-family Linux and
    /// [`ManagerError::Setup`] if `apt-get update` fails or is not authorized.
    pub fn new(ctx: Context) -> Result<Self, ManagerError> {
        ensure_supported(ManagerKind::Apt, &ctx)?;
        ctx.run(&Command::new("apt-get").arg("update").elevated())
            .map_err(|e| ManagerError::setup(ManagerKind::Apt, e))?;
        Ok(Self { ctx })
    }
}

impl PackageManager for Apt {
    fn kind(&self) -> ManagerKind {
        ManagerKind::Apt
    }

    fn context(&self) -> &Context {
        &self.ctx
    }

    fn install_command(&self, package: &str, _class: PackageClass) -> Command {
        Command::new("apt-get")
            .args(["install", "-y", package])
            .env("DEBIAN_FRONTEND", "noninteractive")
            .elevated()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ExecError;
    use crate::managers::InstallOptions;
    use crate::managers::test_helpers::{MockExecutor, context, context_with};
    use crate::operations::MockFileSystemOps;
    use crate::platform::{Arch, Os, Platform};

    const LINUX: Platform = Platform::new(Os::Linux, Arch::X86_64);

    fn with_apt() -> MockFileSystemOps {
        MockFileSystemOps::new().with_program("apt-get", "/usr/bin/apt-get")
    }

    #[test]
    fn setup_refreshes_index_elevated() {
        let (ctx, exec) = context(LINUX, with_apt());
        Apt::new(ctx).unwrap();
        assert_eq!(exec.rendered(), ["sudo apt-get update"]);
    }

    #[test]
    fn unsupported_without_apt_get() {
        let (ctx, exec) = context(LINUX, MockFileSystemOps::new());
        let err = Apt::new(ctx).unwrap_err();
        assert!(matches!(err, ManagerError::Unsupported { .. }));
        assert_eq!(exec.call_count(), 0);
    }

    #[test]
    fn denied_elevation_is_setup_failure() {
        let (ctx, _exec) = context_with(LINUX, with_apt(), MockExecutor::new().denying_elevation());
        let err = Apt::new(ctx).unwrap_err();
        assert!(err.is_setup_failure());
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<ExecError>().is_some());
    }

    #[test]
    fn install_is_noninteractive_and_elevated() {
        let (ctx, exec) = context(LINUX, with_apt());
        let apt = Apt::new(ctx).unwrap();
        apt.install("build-essential", &InstallOptions::new()).unwrap();
        assert_eq!(
            exec.rendered()[1],
            "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y build-essential"
        );
    }

    #[test]
    fn reinstalling_present_package_succeeds() {
        let exec = MockExecutor::new()
            .then(0, "")
            .then(0, "Setting up git ...")
            .then(0, "zsh is already the newest version (5.9-4).");
        let (ctx, _exec) = context_with(LINUX, with_apt(), exec);
        let apt = Apt::new(ctx).unwrap();
        let report = apt.install(["git", "zsh"], &InstallOptions::new()).unwrap();
        assert_eq!(report.installed, ["git", "zsh"]);
        assert!(report.is_success());
    }

    #[test]
    fn failed_package_does_not_invalidate_manager() {
        let exec = MockExecutor::new().then(0, "").then(100, "E: Unable to locate package nope");
        let (ctx, _exec) = context_with(LINUX, with_apt(), exec);
        let apt = Apt::new(ctx).unwrap();

        let first = apt.install("nope", &InstallOptions::new()).unwrap();
        assert_eq!(first.failed[0].error.exit_code(), Some(100));

        let second = apt.install("git", &InstallOptions::new()).unwrap();
        assert_eq!(second.installed, ["git"]);
    }
}
