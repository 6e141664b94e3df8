//! Windows Package Manager.
use super::{Context, ManagerKind, PackageClass, PackageManager, ensure_supported};
use crate::error::{ExecError, ManagerError};
use crate::exec::Command;

/// Registers App Installer, which ships `winget`.
const BOOTSTRAP: &str =
    "Add-AppxPackage -RegisterByFamilyName -MainPackage Microsoft.DesktopAppInstaller_8wekyb3d8bbwe";

/// WinGet, always installing from the `winget` source by exact id.
#[derive(Debug)]
pub struct WinGet {
    ctx: Context,
}

impl WinGet {
    /// `APPINSTALLER_CLI_ERROR_PACKAGE_ALREADY_INSTALLED` (`0x8A150061`).
    pub const ALREADY_INSTALLED: i32 = -1_978_335_135;

    /// `APPINSTALLER_CLI_ERROR_UPDATE_NOT_APPLICABLE` (`0x8A15002B`).
    pub const NO_APPLICABLE_UPGRADE: i32 = -1_978_335_189;

    /// Set up WinGet: register App Installer if `winget` is missing,
    /// otherwise update its sources.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Unsupported`] off Windows and
    /// [`ManagerError::Setup`] if registration or the source update fails.
    pub fn new(ctx: Context) -> Result<Self, ManagerError> {
        ensure_supported(ManagerKind::WinGet, &ctx)?;
        let step = if ctx.fs_ops.which("winget").is_some() {
            Command::new("winget").args(["source", "update"])
        } else {
            tracing::info!("winget not found, registering App Installer");
            Command::shell(BOOTSTRAP)
        };
        ctx.run(&step)
            .map_err(|e| ManagerError::setup(ManagerKind::WinGet, e))?;
        Ok(Self { ctx })
    }
}

impl PackageManager for WinGet {
    fn kind(&self) -> ManagerKind {
        ManagerKind::WinGet
    }

    fn context(&self) -> &Context {
        &self.ctx
    }

    fn install_command(&self, package: &str, _class: PackageClass) -> Command {
        Command::new("winget")
            .args([
                "install",
                "--id",
                package,
                "--exact",
                "--source",
                "winget",
                "--accept-source-agreements",
                "--accept-package-agreements",
            ])
            .safe()
    }

    fn install_one(&self, package: &str, class: PackageClass) -> Result<(), ExecError> {
        let cmd = self.install_command(package, class);
        let result = self.ctx.run(&cmd)?;
        match result.code {
            0 => Ok(()),
            Self::ALREADY_INSTALLED | Self::NO_APPLICABLE_UPGRADE => {
                tracing::debug!("winget: {package} already installed");
                Ok(())
            }
            code => Err(ExecError::NonZeroExit {
                command: cmd.to_string(),
                exit_code: code,
                output: result.output,
            }),
        }
    }
}
