//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return typed errors while command handlers at the CLI
//! boundary convert them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ProvisionError
//! ├── Exec(ExecError)       : a spawned command failed or could not start
//! ├── Manager(ManagerError) : unsupported platform, setup, or install failure
//! └── Config(ConfigError)   : manifest I/O and TOML parsing
//! ```
//!
//! The split between [`ManagerError::Setup`] and per-package failures is
//! load-bearing: setup failures are fatal to a manager, while a package that
//! fails to install is only reported (see [`crate::managers::InstallReport`]).

use thiserror::Error;

use crate::managers::{ManagerKind, PackageClass};
use crate::platform::Platform;

/// Top-level error type for the provisioning engine.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Command execution error.
    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    /// Package manager error.
    #[error("Package manager error: {0}")]
    Manager(#[from] ManagerError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the execution engine.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The process could not be started at all (missing binary, bad shell, ...).
    #[error("failed to execute '{command}': {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error from the spawn or pipe setup.
        source: std::io::Error,
    },

    /// The process exited non-zero and the command was not marked safe.
    #[error("'{command}' failed (exit {exit_code})")]
    NonZeroExit {
        /// Rendered command line.
        command: String,
        /// Exit code reported by the process (`128 + signal` on Unix signal death).
        exit_code: i32,
        /// Everything the process wrote to stdout and stderr.
        output: String,
    },

    /// Elevated authorization was requested and not granted.
    #[error("administrator authorization was not granted for '{command}'")]
    Unauthorized {
        /// Rendered command line.
        command: String,
    },
}

impl ExecError {
    /// Exit code of the failed process, if it ran to completion.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { exit_code, .. } => Some(*exit_code),
            Self::Spawn { .. } | Self::Unauthorized { .. } => None,
        }
    }

    /// Captured output of the failed process, if any.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::NonZeroExit { output, .. } => Some(output),
            Self::Spawn { .. } | Self::Unauthorized { .. } => None,
        }
    }
}

/// Errors raised by package manager construction and installation.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// The manager cannot run on this host.
    #[error("{manager} is not supported on {platform}")]
    Unsupported {
        /// Manager that was requested.
        manager: ManagerKind,
        /// Host platform.
        platform: Platform,
    },

    /// The manager's own bootstrap or refresh step failed.
    #[error("{manager} setup failed")]
    Setup {
        /// Manager whose setup failed.
        manager: ManagerKind,
        /// Underlying cause (an [`ExecError`] or a dependency's [`ManagerError`]).
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A manager this one depends on could not be constructed.
    #[error("{manager} requires {dependency}")]
    Dependency {
        /// Dependent manager.
        manager: ManagerKind,
        /// Manager it depends on.
        dependency: ManagerKind,
        /// Why the dependency failed.
        source: Box<Self>,
    },

    /// Setup already failed earlier in this run; failed managers are not retried.
    #[error("{manager} setup already failed in this run")]
    PreviouslyFailed {
        /// Manager whose setup failed.
        manager: ManagerKind,
    },

    /// The requested package class has no command template for this manager.
    #[error("{manager} cannot install {class} packages")]
    UnsupportedClass {
        /// Manager that was asked.
        manager: ManagerKind,
        /// Requested package class.
        class: PackageClass,
    },

    /// A package failed while installing with all-or-nothing semantics.
    #[error("{manager} failed to install '{package}'")]
    Install {
        /// Manager that ran the install.
        manager: ManagerKind,
        /// Package that failed.
        package: String,
        /// Execution failure.
        source: ExecError,
    },
}

impl ManagerError {
    /// Returns `true` if the manager itself (rather than one package) failed.
    #[must_use]
    pub const fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::Setup { .. } | Self::Dependency { .. } | Self::PreviouslyFailed { .. }
        )
    }

    /// Build a [`ManagerError::Setup`] from any error or message.
    pub fn setup(
        manager: ManagerKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Setup {
            manager,
            source: source.into(),
        }
    }
}

/// Errors that arise from loading the provisioning manifest.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The manifest exists but could not be read.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest is not valid TOML or does not match the schema.
    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        /// Path to the file that failed to parse.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}
