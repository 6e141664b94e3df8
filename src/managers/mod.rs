//! Package-manager abstraction.
//!
//! Each native manager is a variant of [`Manager`] backed by its own type
//! implementing [`PackageManager`]. Construction is capability-checked and
//! performs setup: a manager value only exists once its binary is present
//! and its index has been refreshed. Installing packages afterwards never
//! invalidates the manager; per-package failures are reported in an
//! [`InstallReport`].
//!
//! | Kind        | Supported when                         | Depends on |
//! |-------------|----------------------------------------|------------|
//! | Homebrew    | macOS, or Linux on `x86_64`            |            |
//! | APT         | Linux with `apt-get` on `PATH`         |            |
//! | Snap        | Linux with APT supported               | APT        |
//! | Scoop       | Windows                                |            |
//! | WinGet      | Windows                                |            |
//! | MacAppStore | macOS with Homebrew supported          | Homebrew   |
mod apt;
mod context;
mod homebrew;
mod mas;
mod registry;
mod scoop;
mod snap;
mod winget;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use apt::Apt;
pub use context::Context;
pub use homebrew::Homebrew;
pub use mas::MacAppStore;
pub use registry::{ManagerState, Registry};
pub use scoop::Scoop;
pub use snap::Snap;
pub use winget::WinGet;

use crate::error::{ExecError, ManagerError};
use crate::exec::Command;
use crate::platform::Arch;

/// Identity of a package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManagerKind {
    /// Homebrew (`brew`).
    Homebrew,
    /// Debian/Ubuntu APT (`apt-get`).
    Apt,
    /// Snapcraft (`snap`).
    Snap,
    /// Scoop for Windows.
    Scoop,
    /// Windows Package Manager (`winget`).
    WinGet,
    /// Mac App Store CLI (`mas`).
    MacAppStore,
}

impl ManagerKind {
    /// Every kind, dependencies before their dependents.
    pub const ALL: [Self; 6] = [
        Self::Homebrew,
        Self::Apt,
        Self::Snap,
        Self::Scoop,
        Self::WinGet,
        Self::MacAppStore,
    ];

    /// Whether this manager can run on the host described by `ctx`.
    ///
    /// Pure: reads only the platform and the file-system view, never spawns,
    /// and does not need a constructed manager.
    #[must_use]
    pub fn is_supported(self, ctx: &Context) -> bool {
        let platform = ctx.platform;
        match self {
            Self::Homebrew => {
                platform.is_macos() || (platform.is_linux() && platform.arch == Arch::X86_64)
            }
            Self::Apt => platform.is_linux() && ctx.fs_ops.which("apt-get").is_some(),
            Self::Snap => platform.is_linux() && Self::Apt.is_supported(ctx),
            Self::Scoop | Self::WinGet => platform.is_windows(),
            Self::MacAppStore => platform.is_macos() && Self::Homebrew.is_supported(ctx),
        }
    }

    /// The manager this one bootstraps itself through, if any.
    #[must_use]
    pub const fn dependency(self) -> Option<Self> {
        match self {
            Self::Snap => Some(Self::Apt),
            Self::MacAppStore => Some(Self::Homebrew),
            Self::Homebrew | Self::Apt | Self::Scoop | Self::WinGet => None,
        }
    }
}

impl fmt::Display for ManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Homebrew => write!(f, "homebrew"),
            Self::Apt => write!(f, "apt"),
            Self::Snap => write!(f, "snap"),
            Self::Scoop => write!(f, "scoop"),
            Self::WinGet => write!(f, "winget"),
            Self::MacAppStore => write!(f, "mas"),
        }
    }
}

impl FromStr for ManagerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "homebrew" | "brew" => Ok(Self::Homebrew),
            "apt" | "apt-get" => Ok(Self::Apt),
            "snap" => Ok(Self::Snap),
            "scoop" => Ok(Self::Scoop),
            "winget" => Ok(Self::WinGet),
            "mas" | "appstore" => Ok(Self::MacAppStore),
            other => Err(format!(
                "unknown package manager '{other}' \
                 (expected one of: homebrew, apt, snap, scoop, winget, mas)"
            )),
        }
    }
}

/// Kind of package, selecting the install command template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageClass {
    /// A regular package.
    #[default]
    Standard,
    /// A Homebrew cask (GUI application).
    Cask,
    /// A snap installed with classic confinement.
    Classic,
}

impl fmt::Display for PackageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Cask => write!(f, "cask"),
            Self::Classic => write!(f, "classic"),
        }
    }
}

/// One or more package identifiers, in install order.
///
/// ```
/// use provision_cli::managers::PackageList;
///
/// assert_eq!(PackageList::from("git").len(), 1);
/// assert_eq!(PackageList::from(["git", "zsh"]).len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageList(Vec<String>);

impl PackageList {
    /// Number of packages.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Packages in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for PackageList {
    fn from(package: &str) -> Self {
        Self(vec![package.to_string()])
    }
}

impl From<String> for PackageList {
    fn from(package: String) -> Self {
        Self(vec![package])
    }
}

impl From<Vec<String>> for PackageList {
    fn from(packages: Vec<String>) -> Self {
        Self(packages)
    }
}

impl From<Vec<&str>> for PackageList {
    fn from(packages: Vec<&str>) -> Self {
        Self(packages.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for PackageList {
    fn from(packages: &[&str]) -> Self {
        Self(packages.iter().map(|p| (*p).to_string()).collect())
    }
}

impl From<&[String]> for PackageList {
    fn from(packages: &[String]) -> Self {
        Self(packages.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for PackageList {
    fn from(packages: [&str; N]) -> Self {
        Self(packages.iter().map(|p| (*p).to_string()).collect())
    }
}

/// How a batch of packages is installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Package class for every package in the batch.
    pub class: PackageClass,
    /// Stop at the first failure and return it as an error.
    pub all_or_nothing: bool,
}

impl InstallOptions {
    /// Standard packages, continuing past failures.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            class: PackageClass::Standard,
            all_or_nothing: false,
        }
    }

    /// Set the package class.
    #[must_use]
    pub const fn class(mut self, class: PackageClass) -> Self {
        self.class = class;
        self
    }

    /// Stop at the first failure.
    #[must_use]
    pub const fn all_or_nothing(mut self) -> Self {
        self.all_or_nothing = true;
        self
    }
}

/// A package that failed to install.
#[derive(Debug)]
pub struct PackageFailure {
    /// Package identifier.
    pub package: String,
    /// Why it failed.
    pub error: ExecError,
}

/// Outcome of one [`PackageManager::install`] call.
#[derive(Debug, Default)]
pub struct InstallReport {
    /// Packages installed (or already present), in order.
    pub installed: Vec<String>,
    /// Packages that failed, in order.
    pub failed: Vec<PackageFailure>,
}

impl InstallReport {
    /// Returns `true` when nothing failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Behavior shared by every package manager.
///
/// Implementors describe *how* one package is installed; the batch loop,
/// class checking and failure policy live in [`install`](Self::install).
pub trait PackageManager: Send + Sync + fmt::Debug {
    /// Which manager this is.
    fn kind(&self) -> ManagerKind;

    /// Context the manager was constructed with.
    fn context(&self) -> &Context;

    /// Whether `class` has a command template for this manager.
    fn supports_class(&self, class: PackageClass) -> bool {
        class == PackageClass::Standard
    }

    /// Command installing one package.
    fn install_command(&self, package: &str, class: PackageClass) -> Command;

    /// Install one package.
    ///
    /// # Errors
    ///
    /// Returns the execution error of the install command.
    fn install_one(&self, package: &str, class: PackageClass) -> Result<(), ExecError> {
        self.context()
            .run(&self.install_command(package, class))
            .map(|_| ())
    }

    /// Install `packages` one command at a time.
    ///
    /// By default a failed package is logged, recorded in the report, and
    /// the remaining packages are still installed. With
    /// [`InstallOptions::all_or_nothing`] the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnsupportedClass`] before running anything if
    /// the class has no template here, and [`ManagerError::Install`] for the
    /// first failure in all-or-nothing mode.
    fn install(
        &self,
        packages: impl Into<PackageList>,
        options: &InstallOptions,
    ) -> Result<InstallReport, ManagerError>
    where
        Self: Sized,
    {
        install_each(self, &packages.into(), options)
    }
}

/// The batch loop behind [`PackageManager::install`].
fn install_each(
    manager: &dyn PackageManager,
    packages: &PackageList,
    options: &InstallOptions,
) -> Result<InstallReport, ManagerError> {
    let kind = manager.kind();
    if !manager.supports_class(options.class) {
        return Err(ManagerError::UnsupportedClass {
            manager: kind,
            class: options.class,
        });
    }

    let mut report = InstallReport::default();
    for package in packages.iter() {
        tracing::info!("{kind}: installing {package}");
        match manager.install_one(package, options.class) {
            Ok(()) => report.installed.push(package.to_string()),
            Err(source) if options.all_or_nothing => {
                return Err(ManagerError::Install {
                    manager: kind,
                    package: package.to_string(),
                    source,
                });
            }
            Err(error) => {
                tracing::warn!("{kind}: failed to install {package}: {error}");
                report.failed.push(PackageFailure {
                    package: package.to_string(),
                    error,
                });
            }
        }
    }
    Ok(report)
}

/// Fail with [`ManagerError::Unsupported`] unless `kind` runs on this host.
fn ensure_supported(kind: ManagerKind, ctx: &Context) -> Result<(), ManagerError> {
    if kind.is_supported(ctx) {
        Ok(())
    } else {
        Err(ManagerError::Unsupported {
            manager: kind,
            platform: ctx.platform,
        })
    }
}

/// A constructed, ready package manager.
///
/// Cloning shares the underlying manager.
#[derive(Debug, Clone)]
pub enum Manager {
    /// Homebrew.
    Homebrew(Arc<Homebrew>),
    /// APT.
    Apt(Arc<Apt>),
    /// Snap, holding its APT.
    Snap(Arc<Snap>),
    /// Scoop.
    Scoop(Arc<Scoop>),
    /// WinGet.
    WinGet(Arc<WinGet>),
    /// Mac App Store, holding its Homebrew.
    MacAppStore(Arc<MacAppStore>),
}

impl Manager {
    /// The variant as a trait object.
    #[must_use]
    pub fn as_package_manager(&self) -> &dyn PackageManager {
        match self {
            Self::Homebrew(m) => m.as_ref(),
            Self::Apt(m) => m.as_ref(),
            Self::Snap(m) => m.as_ref(),
            Self::Scoop(m) => m.as_ref(),
            Self::WinGet(m) => m.as_ref(),
            Self::MacAppStore(m) => m.as_ref(),
        }
    }

    /// Which manager this is.
    #[must_use]
    pub fn kind(&self) -> ManagerKind {
        self.as_package_manager().kind()
    }

    /// Install packages with this manager.
    ///
    /// # Errors
    ///
    /// See [`PackageManager::install`].
    pub fn install(
        &self,
        packages: impl Into<PackageList>,
        options: &InstallOptions,
    ) -> Result<InstallReport, ManagerError> {
        install_each(self.as_package_manager(), &packages.into(), options)
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::test_helpers::{MockExecutor, context, context_with};
    use super::*;
    use crate::operations::MockFileSystemOps;
    use crate::platform::{Os, Platform};

    const LINUX: Platform = Platform::new(Os::Linux, Arch::X86_64);
    const LINUX_ARM: Platform = Platform::new(Os::Linux, Arch::Aarch64);
    const MAC: Platform = Platform::new(Os::MacOs, Arch::Aarch64);
    const WINDOWS: Platform = Platform::new(Os::Windows, Arch::X86_64);

    fn supported(platform: Platform, fs: MockFileSystemOps) -> Vec<ManagerKind> {
        let (ctx, exec) = context(platform, fs);
        let kinds = ManagerKind::ALL
            .into_iter()
            .filter(|k| k.is_supported(&ctx))
            .collect();
        assert_eq!(exec.call_count(), 0, "support checks must not spawn");
        kinds
    }

    #[test]
    fn support_matrix_debian_x86() {
        let fs = MockFileSystemOps::new().with_program("apt-get", "/usr/bin/apt-get");
        assert_eq!(
            supported(LINUX, fs),
            [ManagerKind::Homebrew, ManagerKind::Apt, ManagerKind::Snap]
        );
    }

    #[test]
    fn support_matrix_linux_arm_without_apt() {
        assert!(supported(LINUX_ARM, MockFileSystemOps::new()).is_empty());
    }

    #[test]
    fn support_matrix_macos() {
        assert_eq!(
            supported(MAC, MockFileSystemOps::new()),
            [ManagerKind::Homebrew, ManagerKind::MacAppStore]
        );
    }

    #[test]
    fn support_matrix_windows() {
        assert_eq!(
            supported(WINDOWS, MockFileSystemOps::new()),
            [ManagerKind::Scoop, ManagerKind::WinGet]
        );
    }

    #[test]
    fn is_supported_is_repeatable() {
        let fs = MockFileSystemOps::new().with_program("apt-get", "/usr/bin/apt-get");
        let (ctx, _exec) = context(LINUX, fs);
        for kind in ManagerKind::ALL {
            assert_eq!(kind.is_supported(&ctx), kind.is_supported(&ctx));
        }
    }

    #[test]
    fn dependencies() {
        assert_eq!(ManagerKind::Snap.dependency(), Some(ManagerKind::Apt));
        assert_eq!(
            ManagerKind::MacAppStore.dependency(),
            Some(ManagerKind::Homebrew)
        );
        assert_eq!(ManagerKind::WinGet.dependency(), None);
    }

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("brew".parse::<ManagerKind>(), Ok(ManagerKind::Homebrew));
        assert_eq!("WinGet".parse::<ManagerKind>(), Ok(ManagerKind::WinGet));
        assert_eq!("mas".parse::<ManagerKind>(), Ok(ManagerKind::MacAppStore));
        assert!("pacman".parse::<ManagerKind>().is_err());
    }

    #[test]
    fn kind_display_round_trips_through_from_str() {
        for kind in ManagerKind::ALL {
            assert_eq!(kind.to_string().parse::<ManagerKind>(), Ok(kind));
        }
    }

    #[test]
    fn package_list_conversions_keep_order() {
        let from_vec: PackageList = vec!["git".to_string(), "zsh".to_string()].into();
        let from_slice: PackageList = (&["git", "zsh"][..]).into();
        let from_array: PackageList = ["git", "zsh"].into();
        assert_eq!(from_vec, from_slice);
        assert_eq!(from_slice, from_array);
        assert_eq!(from_array.iter().collect::<Vec<_>>(), ["git", "zsh"]);
        assert!(PackageList::default().is_empty());
    }

    #[test]
    fn install_options_builder() {
        let opts = InstallOptions::new()
            .class(PackageClass::Cask)
            .all_or_nothing();
        assert_eq!(opts.class, PackageClass::Cask);
        assert!(opts.all_or_nothing);
        assert_eq!(InstallOptions::default(), InstallOptions::new());
    }

    /// A minimal manager for exercising the shared install loop.
    #[derive(Debug)]
    struct Echo {
        ctx: Context,
    }

    impl PackageManager for Echo {
        fn kind(&self) -> ManagerKind {
            ManagerKind::Apt
        }

        fn context(&self) -> &Context {
            &self.ctx
        }

        fn install_command(&self, package: &str, _class: PackageClass) -> Command {
            Command::new("install").arg(package)
        }
    }

    #[test]
    fn install_continues_past_failure_by_default() {
        let exec = MockExecutor::new()
            .then(0, "")
            .then(1, "E: Unable to locate package nope")
            .then(0, "");
        let (ctx, exec) = context_with(LINUX, MockFileSystemOps::new(), exec);
        let echo = Echo { ctx };

        let report = echo
            .install(["git", "nope", "zsh"], &InstallOptions::new())
            .unwrap();

        assert_eq!(report.installed, ["git", "zsh"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].package, "nope");
        assert_eq!(report.failed[0].error.exit_code(), Some(1));
        assert!(!report.is_success());
        assert_eq!(exec.call_count(), 3);
    }

    #[test]
    fn all_or_nothing_stops_at_first_failure() {
        let exec = MockExecutor::new().then(0, "").then(1, "").then(0, "");
        let (ctx, exec) = context_with(LINUX, MockFileSystemOps::new(), exec);
        let echo = Echo { ctx };

        let err = echo
            .install(
                ["git", "nope", "zsh"],
                &InstallOptions::new().all_or_nothing(),
            )
            .unwrap_err();

        assert!(matches!(err, ManagerError::Install { ref package, .. } if package == "nope"));
        assert!(!err.is_setup_failure());
        assert_eq!(exec.call_count(), 2);
    }

    #[test]
    fn unsupported_class_runs_nothing() {
        let (ctx, exec) = context(LINUX, MockFileSystemOps::new());
        let echo = Echo { ctx };
        let err = echo
            .install("code", &InstallOptions::new().class(PackageClass::Classic))
            .unwrap_err();
        assert!(matches!(
            err,
            ManagerError::UnsupportedClass {
                class: PackageClass::Classic,
                ..
            }
        ));
        assert_eq!(exec.call_count(), 0);
    }

    #[test]
    fn empty_list_is_a_successful_no_op() {
        let (ctx, exec) = context(LINUX, MockFileSystemOps::new());
        let echo = Echo { ctx };
        let report = echo
            .install(Vec::<String>::new(), &InstallOptions::new())
            .unwrap();
        assert!(report.is_success());
        assert!(report.installed.is_empty());
        assert_eq!(exec.call_count(), 0);
    }
}
