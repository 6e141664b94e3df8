//! Provisioning manifest: which packages to install with which manager.
//!
//! ```toml
//! quiet = true
//!
//! [homebrew]
//! packages = ["git", "zsh"]
//! casks = ["visual-studio-code"]
//!
//! [snap]
//! classic = ["code"]
//! ```
pub mod toml_loader;

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::managers::{ManagerKind, PackageClass};

/// Environment variable naming the manifest path.
pub const CONFIG_ENV: &str = "PROVISION_CONFIG";

/// Manifest file name used when nothing else is specified.
pub const DEFAULT_CONFIG_FILE: &str = "provision.toml";

/// A section holding one plain package list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSection {
    /// Package identifiers, installed in order.
    pub packages: Vec<String>,
}

/// The `[homebrew]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HomebrewSection {
    /// Formulae.
    pub packages: Vec<String>,
    /// GUI applications installed with `--cask`.
    pub casks: Vec<String>,
}

/// The `[snap]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapSection {
    /// Strictly confined snaps.
    pub packages: Vec<String>,
    /// Snaps installed with `--classic`.
    pub classic: Vec<String>,
}

/// The whole manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Shell for shell-string commands, overriding detection.
    pub shell: Option<PathBuf>,
    /// Show a single status row instead of streaming command output.
    pub quiet: bool,
    /// `[homebrew]`
    pub homebrew: HomebrewSection,
    /// `[apt]`
    pub apt: PackageSection,
    /// `[snap]`
    pub snap: SnapSection,
    /// `[scoop]`
    pub scoop: PackageSection,
    /// `[winget]`
    pub winget: PackageSection,
    /// `[mas]`, App Store numeric ids.
    pub mas: PackageSection,
}

/// One batch of packages for a single manager and class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Manager to install with.
    pub manager: ManagerKind,
    /// Package class for the whole batch.
    pub class: PackageClass,
    /// Package identifiers in manifest order.
    pub packages: Vec<String>,
}

/// A non-fatal problem found in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Manifest section, e.g. `homebrew.casks`.
    pub section: String,
    /// Offending entry.
    pub item: String,
    /// Human-readable message.
    pub message: String,
}

impl Config {
    /// Load the manifest at `path`; a missing file is an empty manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid manifest.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        toml_loader::load_config(path)
    }

    /// Every non-empty package list paired with its manager and class.
    ///
    /// Order is fixed: Homebrew before MAS and APT before Snap, so a
    /// dependency is always set up by its own batch first.
    #[must_use]
    pub fn requests(&self) -> Vec<InstallRequest> {
        self.sections()
            .into_iter()
            .filter(|(_, _, _, packages)| !packages.is_empty())
            .map(|(manager, class, _, packages)| InstallRequest {
                manager,
                class,
                packages: packages.to_vec(),
            })
            .collect()
    }

    /// Check for blank and duplicate package identifiers.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        for (_, _, section, packages) in self.sections() {
            let mut seen = HashSet::new();
            for package in packages {
                if package.trim().is_empty() {
                    warnings.push(ValidationWarning {
                        section: section.to_string(),
                        item: package.clone(),
                        message: "blank package identifier".to_string(),
                    });
                } else if !seen.insert(package.as_str()) {
                    warnings.push(ValidationWarning {
                        section: section.to_string(),
                        item: package.clone(),
                        message: "listed more than once".to_string(),
                    });
                }
            }
        }
        warnings
    }

    fn sections(&self) -> [(ManagerKind, PackageClass, &'static str, &[String]); 8] {
        [
            (
                ManagerKind::Homebrew,
                PackageClass::Standard,
                "homebrew.packages",
                self.homebrew.packages.as_slice(),
            ),
            (
                ManagerKind::Homebrew,
                PackageClass::Cask,
                "homebrew.casks",
                self.homebrew.casks.as_slice(),
            ),
            (
                ManagerKind::Apt,
                PackageClass::Standard,
                "apt.packages",
                self.apt.packages.as_slice(),
            ),
            (
                ManagerKind::Snap,
                PackageClass::Standard,
                "snap.packages",
                self.snap.packages.as_slice(),
            ),
            (
                ManagerKind::Snap,
                PackageClass::Classic,
                "snap.classic",
                self.snap.classic.as_slice(),
            ),
            (
                ManagerKind::Scoop,
                PackageClass::Standard,
                "scoop.packages",
                self.scoop.packages.as_slice(),
            ),
            (
                ManagerKind::WinGet,
                PackageClass::Standard,
                "winget.packages",
                self.winget.packages.as_slice(),
            ),
            (
                ManagerKind::MacAppStore,
                PackageClass::Standard,
                "mas.packages",
                self.mas.packages.as_slice(),
            ),
        ]
    }
}

/// Resolve the manifest path: an explicit override, else `$PROVISION_CONFIG`,
/// else `provision.toml` in the working directory.
#[must_use]
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
}
