//! Cross-platform developer machine provisioning engine.
//!
//! Installs packages through whichever native package managers the host
//! supports (Homebrew, APT, Snap, Scoop, WinGet and the Mac App Store),
//! bootstrapping a missing manager on first use and sharing one elevated
//! privilege session across every command.
//!
//! The public API is organised into layers:
//!
//! - **[`exec`]**: run external commands, stream their output, elevate
//! - **[`managers`]**: capability checks, setup and installs per package manager
//! - **[`config`]**: the TOML manifest describing what to install
//! - **[`commands`]**: top-level subcommand orchestration (`check`, `install`, `apply`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod managers;
pub mod operations;
pub mod platform;

/// Version reported by `--version` and the log file header.
pub const VERSION: &str = match option_env!("PROVISION_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
