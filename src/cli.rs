use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::managers::{InstallOptions, ManagerKind, PackageClass};

/// Top-level CLI entry point for the provisioning engine.
#[derive(Parser, Debug)]
#[command(
    name = "provision",
    about = "Cross-platform developer machine provisioning",
    version = crate::VERSION
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Show a single status line per command instead of its full output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the provisioning manifest (defaults to $PROVISION_CONFIG or ./provision.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show which package managers this host supports
    Check,
    /// Install packages with one package manager
    Install(InstallOpts),
    /// Install everything listed in the manifest
    Apply(ApplyOpts),
}

impl Command {
    /// Name used for the log file and the log header.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Install(_) => "install",
            Self::Apply(_) => "apply",
        }
    }
}

/// Options for the `install` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InstallOpts {
    /// Package manager (homebrew, apt, snap, scoop, winget, mas)
    pub manager: ManagerKind,

    /// Package identifiers
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Install Homebrew casks
    #[arg(long, conflicts_with = "classic")]
    pub cask: bool,

    /// Install snaps with classic confinement
    #[arg(long)]
    pub classic: bool,

    /// Stop at the first package that fails
    #[arg(long)]
    pub all_or_nothing: bool,
}

impl InstallOpts {
    /// Package class selected by the flags.
    #[must_use]
    pub const fn class(&self) -> PackageClass {
        if self.cask {
            PackageClass::Cask
        } else if self.classic {
            PackageClass::Classic
        } else {
            PackageClass::Standard
        }
    }

    /// Install options selected by the flags.
    #[must_use]
    pub const fn options(&self) -> InstallOptions {
        let opts = InstallOptions::new().class(self.class());
        if self.all_or_nothing {
            opts.all_or_nothing()
        } else {
            opts
        }
    }
}

/// Options for the `apply` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ApplyOpts {
    /// Stop each manager at the first package that fails
    #[arg(long)]
    pub all_or_nothing: bool,
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
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_check() {
        let cli = Cli::parse_from(["provision", "check"]);
        assert!(matches!(cli.command, Command::Check));
        assert_eq!(cli.command.name(), "check");
    }

    #[test]
    fn parse_install_with_packages() {
        let cli = Cli::parse_from(["provision", "install", "apt", "git", "zsh"]);
        let Command::Install(opts) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.manager, ManagerKind::Apt);
        assert_eq!(opts.packages, ["git", "zsh"]);
        assert_eq!(opts.class(), PackageClass::Standard);
        assert!(!opts.options().all_or_nothing);
    }

    #[test]
    fn parse_install_alias_and_cask() {
        let cli = Cli::parse_from(["provision", "install", "brew", "--cask", "iterm2"]);
        let Command::Install(opts) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.manager, ManagerKind::Homebrew);
        assert_eq!(opts.options().class, PackageClass::Cask);
    }

    #[test]
    fn parse_install_all_or_nothing() {
        let cli = Cli::parse_from([
            "provision",
            "install",
            "snap",
            "code",
            "--classic",
            "--all-or-nothing",
        ]);
        let Command::Install(opts) = cli.command else {
            panic!("expected install");
        };
        let options = opts.options();
        assert_eq!(options.class, PackageClass::Classic);
        assert!(options.all_or_nothing);
    }

    #[test]
    fn cask_and_classic_conflict() {
        let result = Cli::try_parse_from([
            "provision",
            "install",
            "snap",
            "x",
            "--cask",
            "--classic",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn install_requires_a_package() {
        assert!(Cli::try_parse_from(["provision", "install", "apt"]).is_err());
    }

    #[test]
    fn unknown_manager_is_rejected() {
        assert!(Cli::try_parse_from(["provision", "install", "pacman", "git"]).is_err());
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "provision",
            "apply",
            "-q",
            "-v",
            "--config",
            "/tmp/provision.toml",
        ]);
        assert!(cli.verbose);
        assert!(cli.global.quiet);
        assert_eq!(
            cli.global.config,
            Some(PathBuf::from("/tmp/provision.toml"))
        );
        assert_eq!(cli.command.name(), "apply");
    }
}
