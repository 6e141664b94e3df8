//! Homebrew on macOS and Linux.
use std::path::{Path, PathBuf};

use super::{Context, ManagerKind, PackageClass, PackageManager, ensure_supported};
use crate::error::ManagerError;
use crate::exec::Command;
use crate::platform::{Arch, Os, Platform};

/// Official unattended installer.
const INSTALL_SCRIPT: &str =
    r#"/bin/bash -c "$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)""#;

/// Homebrew, addressed by the absolute path of its `brew` binary.
#[derive(Debug)]
pub struct Homebrew {
    ctx: Context,
    brew: PathBuf,
}

impl Homebrew {
    /// Where `brew` lives on `platform`.
    #[must_use]
    pub fn binary_path(platform: Platform) -> PathBuf {
        match (platform.os, platform.arch) {
            (Os::MacOs, Arch::Aarch64) => PathBuf::from("/opt/homebrew/bin/brew"),
            (Os::MacOs, _) => PathBuf::from("/usr/local/bin/brew"),
            _ => PathBuf::from("/home/linuxbrew/.linuxbrew/bin/brew"),
        }
    }

    /// Set up Homebrew: install it if `brew` is missing, otherwise update it.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Unsupported`] on unsupported hosts and
    /// [`ManagerError::Setup`] if the install or update fails, or if `brew`
    /// is still missing after the installer ran.
    pub fn new(ctx: Context) -> Result<Self, ManagerError> {
        ensure_supported(ManagerKind::Homebrew, &ctx)?;
        let brew = Self::binary_path(ctx.platform);

        if ctx.fs_ops.exists(&brew) {
            tracing::debug!("homebrew found at {}, updating", brew.display());
            ctx.run(&Command::new(brew.display().to_string()).arg("update"))
                .map_err(|e| ManagerError::setup(ManagerKind::Homebrew, e))?;
        } else {
            tracing::info!("homebrew not found, installing");
            // The installer calls sudo itself and cannot prompt when
            // NONINTERACTIVE is set, so the session must be authorized first.
            ctx.authorize()
                .map_err(|e| ManagerError::setup(ManagerKind::Homebrew, e))?;
            ctx.run(&Command::shell(INSTALL_SCRIPT).env("NONINTERACTIVE", "1"))
                .map_err(|e| ManagerError::setup(ManagerKind::Homebrew, e))?;
            if !ctx.fs_ops.exists(&brew) {
                return Err(ManagerError::setup(
                    ManagerKind::Homebrew,
                    format!("installer finished but {} is missing", brew.display()),
                ));
            }
        }

        Ok(Self { ctx, brew })
    }

    /// Path of the `brew` binary.
    #[must_use]
    pub fn brew(&self) -> &Path {
        &self.brew
    }

    /// Directory holding binaries installed by Homebrew.
    #[must_use]
    pub fn bin_dir(&self) -> &Path {
        self.brew.parent().unwrap_or_else(|| Path::new("/"))
    }
}

impl PackageManager for Homebrew {
    fn kind(&self) -> ManagerKind {
        ManagerKind::Homebrew
    }

    fn context(&self) -> &Context {
        &self.ctx
    }

    fn supports_class(&self, class: PackageClass) -> bool {
        matches!(class, PackageClass::Standard | PackageClass::Cask)
    }

    fn install_command(&self, package: &str, class: PackageClass) -> Command {
        let cmd = Command::new(self.brew.display().to_string()).arg("install");
        let cmd = if class == PackageClass::Cask {
            cmd.arg("--cask")
        } else {
            cmd
        };
        cmd.arg(package)
    }
}
