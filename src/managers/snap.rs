//! Snap, bootstrapped through APT.
use std::sync::Arc;

use super::{
    Apt, Context, InstallOptions, ManagerKind, PackageClass, PackageManager, ensure_supported,
};
use crate::error::ManagerError;
use crate::exec::Command;

/// Snap, holding the APT instance that installed `snapd`.
#[derive(Debug)]
pub struct Snap {
    ctx: Context,
    apt: Arc<Apt>,
}

impl Snap {
    /// Set up Snap: install `snapd` with `apt` if `snap` is missing,
    /// otherwise check for refreshes.
    ///
    /// `apt` is an already constructed manager; its own setup is not
    /// repeated.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Unsupported`] when Snap or APT is unsupported
    /// (before anything runs) and [`ManagerError::Setup`] if installing
    /// `snapd` or the refresh fails.
    pub fn new(ctx: Context, apt: Arc<Apt>) -> Result<Self, ManagerError> {
        ensure_supported(ManagerKind::Snap, &ctx)?;

        if ctx.fs_ops.which("snap").is_some() {
            ctx.run(&Command::new("snap").args(["refresh", "--list"]))
                .map_err(|e| ManagerError::setup(ManagerKind::Snap, e))?;
        } else {
            tracing::info!("snap not found, installing snapd with apt");
            apt.install("snapd", &InstallOptions::new().all_or_nothing())
                .map_err(|e| ManagerError::setup(ManagerKind::Snap, e))?;
        }

        Ok(Self { ctx, apt })
    }

    /// The APT instance Snap was bootstrapped through.
    #[must_use]
    pub const fn apt(&self) -> &Arc<Apt> {
        &self.apt
    }
}

impl PackageManager for Snap {
    fn kind(&self) -> ManagerKind {
        ManagerKind::Snap
    }

    fn context(&self) -> &Context {
        &self.ctx
    }

    fn supports_class(&self, class: PackageClass) -> bool {
        matches!(class, PackageClass::Standard | PackageClass::Classic)
    }

    fn install_command(&self, package: &str, class: PackageClass) -> Command {
        let cmd = Command::new("snap").args(["install", package]);
        let cmd = if class == PackageClass::Classic {
            cmd.arg("--classic")
        } else {
            cmd
        };
        cmd.elevated()
    }
}
