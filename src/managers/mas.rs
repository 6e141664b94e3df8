//! Mac App Store through the `mas` CLI, bootstrapped through Homebrew.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{
    Context, Homebrew, InstallOptions, ManagerKind, PackageClass, PackageManager,
    ensure_supported,
};
use crate::error::ManagerError;
use crate::exec::Command;

/// Mac App Store, holding the Homebrew instance that installed `mas`.
///
/// Packages are numeric App Store ids.
#[derive(Debug)]
pub struct MacAppStore {
    ctx: Context,
    brew: Arc<Homebrew>,
    mas: PathBuf,
}

impl MacAppStore {
    /// Set up the App Store CLI: install `mas` with `brew` if it is missing.
    ///
    /// `mas` keeps no local index, so an existing install needs no refresh.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Unsupported`] off macOS (before anything runs)
    /// and [`ManagerError::Setup`] if Homebrew fails to install `mas`.
    pub fn new(ctx: Context, brew: Arc<Homebrew>) -> Result<Self, ManagerError> {
        ensure_supported(ManagerKind::MacAppStore, &ctx)?;
        let mas = brew.bin_dir().join("mas");

        if ctx.fs_ops.exists(&mas) {
            tracing::debug!("mas found at {}, nothing to refresh", mas.display());
        } else {
            tracing::info!("mas not found, installing with homebrew");
            brew.install("mas", &InstallOptions::new().all_or_nothing())
                .map_err(|e| ManagerError::setup(ManagerKind::MacAppStore, e))?;
        }

        Ok(Self { ctx, brew, mas })
    }

    /// The Homebrew instance `mas` was installed through.
    #[must_use]
    pub const fn homebrew(&self) -> &Arc<Homebrew> {
        &self.brew
    }

    /// Path of the `mas` binary.
    #[must_use]
    pub fn mas(&self) -> &Path {
        &self.mas
    }
}

impl PackageManager for MacAppStore {
    fn kind(&self) -> ManagerKind {
        ManagerKind::MacAppStore
    }

    fn context(&self) -> &Context {
        &self.ctx
    }

    fn install_command(&self, package: &str, _class: PackageClass) -> Command {
        Command::new(self.mas.display().to_string()).args(["install", package])
    }
}
