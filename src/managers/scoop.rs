//! Scoop on Windows.
use super::{Context, ManagerKind, PackageClass, PackageManager, ensure_supported};
use crate::error::ManagerError;
use crate::exec::Command;

/// Installs Scoop for the current user.
const BOOTSTRAP: &str =
    "Set-ExecutionPolicy RemoteSigned -Scope CurrentUser -Force; irm get.scoop.sh | iex";

/// Scoop. Its commands are PowerShell shims, so they run through the shell.
#[derive(Debug)]
pub struct Scoop {
    ctx: Context,
}

impl Scoop {
    /// Set up Scoop: install it if `scoop` is not on `PATH`, otherwise
    /// update it and its buckets.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Unsupported`] off Windows and
    /// [`ManagerError::Setup`] if the bootstrap or update fails.
    pub fn new(ctx: Context) -> Result<Self, ManagerError> {
        ensure_supported(ManagerKind::Scoop, &ctx)?;
        let step = if ctx.fs_ops.which("scoop").is_some() {
            Command::shell("scoop update")
        } else {
            tracing::info!("scoop not found, installing");
            Command::shell(BOOTSTRAP)
        };
        ctx.run(&step)
            .map_err(|e| ManagerError::setup(ManagerKind::Scoop, e))?;
        Ok(Self { ctx })
    }
}

impl PackageManager for Scoop {
    fn kind(&self) -> ManagerKind {
        ManagerKind::Scoop
    }

    fn context(&self) -> &Context {
        &self.ctx
    }

    fn install_command(&self, package: &str, _class: PackageClass) -> Command {
        Command::shell("scoop install").arg(package)
    }
}
