//! Command execution engine.
//!
//! Runs one external command at a time, streams its combined output to an
//! [`OutputSink`] as it arrives, and turns non-zero exits into
//! [`ExecError::NonZeroExit`] unless the command is marked safe.
//!
//! The [`Executor`] trait is the seam everything above this module talks to;
//! [`SystemExecutor`] is the production implementation and owns the
//! process-wide [`PrivilegeSession`].
mod engine;
pub mod privilege;
pub mod shell;
pub mod sink;

use std::fmt;

pub use engine::SystemExecutor;
pub use privilege::{Authorizer, PrivilegeSession, SystemAuthorizer};
pub use shell::Shell;
pub use sink::{CollectSink, NullSink, OutputSink, StatusSink, StreamSink};

use crate::error::ExecError;

/// An external command invocation.
///
/// Built with the consuming builder methods below and immutable afterwards.
///
/// # Examples
///
/// ```
/// use provision_cli::exec::Command;
///
/// let cmd = Command::new("apt-get")
///     .args(["install", "-y", "git"])
///     .env("DEBIAN_FRONTEND", "noninteractive")
///     .elevated();
/// assert_eq!(cmd.to_string(), "apt-get install -y git");
/// assert!(cmd.is_elevated());
///
/// let script = Command::shell("brew list | wc -l").safe();
/// assert!(script.uses_shell());
/// assert!(script.is_safe());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    use_shell: bool,
    elevated: bool,
    safe: bool,
}

impl Command {
    /// A program executed directly, without a shell.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            use_shell: false,
            elevated: false,
            safe: false,
        }
    }

    /// A script handed verbatim to the platform shell.
    #[must_use]
    pub fn shell(script: impl Into<String>) -> Self {
        Self {
            use_shell: true,
            ..Self::new(script)
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Overlay one environment variable on the inherited environment.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Require administrator/root authorization.
    #[must_use]
    pub const fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    /// Return non-zero exits to the caller instead of raising them.
    #[must_use]
    pub const fn safe(mut self) -> Self {
        self.safe = true;
        self
    }

    /// Program name, or the script for shell commands.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments in order.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Environment overlay in insertion order.
    #[must_use]
    pub fn env_overlay(&self) -> &[(String, String)] {
        &self.env
    }

    /// Whether the command runs through the platform shell.
    #[must_use]
    pub const fn uses_shell(&self) -> bool {
        self.use_shell
    }

    /// Whether the command needs elevated authorization.
    #[must_use]
    pub const fn is_elevated(&self) -> bool {
        self.elevated
    }

    /// Whether a non-zero exit is returned rather than raised.
    #[must_use]
    pub const fn is_safe(&self) -> bool {
        self.safe
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Interleaved stdout/stderr lines joined by `\n`, trailing whitespace trimmed.
    pub output: String,
    /// Process exit code.
    pub code: i32,
}

impl ExecResult {
    /// Returns `true` for a zero exit code.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.code == 0
    }
}

/// Whether output lines are forwarded to the sink while the command runs.
///
/// Output is captured in full in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Deliver every line to the sink as it arrives.
    Stream,
    /// Capture only; the sink is never called.
    #[default]
    Capture,
}

/// Abstraction over command execution.
///
/// Implement this trait to swap in a recording or scripted executor during
/// tests; production code uses [`SystemExecutor`].
pub trait Executor: Send + Sync + fmt::Debug {
    /// Run `cmd` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Spawn`] if the process cannot start,
    /// [`ExecError::Unauthorized`] if an elevated command is not authorized,
    /// and [`ExecError::NonZeroExit`] for a non-zero exit of a command that is
    /// not marked [`safe`](Command::safe).
    fn run(
        &self,
        cmd: &Command,
        sink: &mut dyn OutputSink,
        mode: OutputMode,
    ) -> Result<ExecResult, ExecError>;

    /// Run `cmd` capturing its output without delivering it anywhere.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    fn run_captured(&self, cmd: &Command) -> Result<ExecResult, ExecError> {
        self.run(cmd, &mut NullSink, OutputMode::Capture)
    }

    /// Make sure the privilege session is authorized without running anything
    /// elevated. Used before scripts that call `sudo` themselves.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Unauthorized`] if authorization is refused.
    fn authorize(&self) -> Result<(), ExecError>;
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_args_in_order() {
        let cmd = Command::new("brew").arg("install").args(["--cask", "iterm2"]);
        assert_eq!(cmd.program(), "brew");
        assert_eq!(cmd.arguments(), ["install", "--cask", "iterm2"]);
        assert!(!cmd.uses_shell());
        assert!(!cmd.is_elevated());
        assert!(!cmd.is_safe());
    }

    #[test]
    fn shell_constructor_sets_flag() {
        let cmd = Command::shell("echo $HOME");
        assert!(cmd.uses_shell());
        assert_eq!(cmd.to_string(), "echo $HOME");
    }

    #[test]
    fn env_overlay_keeps_insertion_order() {
        let cmd = Command::new("x").env("B", "2").env("A", "1");
        assert_eq!(
            cmd.env_overlay(),
            [
                ("B".to_string(), "2".to_string()),
                ("A".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn display_quotes_args_with_whitespace() {
        let cmd = Command::new("git").args(["commit", "-m", "two words", ""]);
        assert_eq!(cmd.to_string(), "git commit -m 'two words' ''");
    }

    #[test]
    fn exec_result_success_only_for_zero() {
        let ok = ExecResult {
            output: String::new(),
            code: 0,
        };
        let failed = ExecResult {
            output: String::new(),
            code: 2,
        };
        assert!(ok.success());
        assert!(!failed.success());
    }

    #[test]
    fn output_mode_defaults_to_capture() {
        assert_eq!(OutputMode::default(), OutputMode::Capture);
    }
}
