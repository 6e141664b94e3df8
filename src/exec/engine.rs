use std::io::{BufRead as _, BufReader, PipeReader, Read};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;

use super::privilege::{PrivilegeSession, SystemAuthorizer};
use super::shell::Shell;
use super::sink::OutputSink;
use super::{Command, ExecResult, Executor, OutputMode};
use crate::error::ExecError;

/// Production [`Executor`] that spawns real processes.
///
/// Owns the process-wide [`PrivilegeSession`]; create one per run and share it
/// behind an `Arc<dyn Executor>`.
#[derive(Debug)]
pub struct SystemExecutor {
    shell: Shell,
    privilege: PrivilegeSession,
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemExecutor {
    /// Executor using the detected platform shell and the system authorizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shell: Shell::detect(),
            privilege: PrivilegeSession::new(Box::new(SystemAuthorizer)),
        }
    }

    /// Replace the shell used for [`Command::shell`] commands.
    #[must_use]
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Replace the privilege session (e.g. with a non-interactive authorizer).
    #[must_use]
    pub fn with_privilege(mut self, privilege: PrivilegeSession) -> Self {
        self.privilege = privilege;
        self
    }

    /// The shell in use.
    #[must_use]
    pub const fn shell(&self) -> &Shell {
        &self.shell
    }

    /// The privilege session.
    #[must_use]
    pub const fn privilege(&self) -> &PrivilegeSession {
        &self.privilege
    }

    /// Translate a [`Command`] into a ready-to-spawn process description.
    fn build(&self, cmd: &Command) -> std::process::Command {
        let mut argv: Vec<String> = Vec::new();
        if cmd.uses_shell() {
            argv.push(self.shell.program().to_string_lossy().into_owned());
            argv.extend(self.shell.flags().iter().cloned());
            argv.push(self.shell.script(cmd));
        } else {
            argv.push(cmd.program().to_string());
            argv.extend(cmd.arguments().iter().cloned());
        }

        // sudo resets the environment, so the overlay rides along through `env`.
        if cmd.is_elevated() && cfg!(unix) {
            let mut wrapped = vec!["sudo".to_string()];
            if !cmd.env_overlay().is_empty() {
                wrapped.push("env".to_string());
                wrapped.extend(cmd.env_overlay().iter().map(|(k, v)| format!("{k}={v}")));
            }
            wrapped.append(&mut argv);
            argv = wrapped;
        }

        let (program, rest) = argv.split_first().map_or_else(
            || (cmd.program().to_string(), Vec::new()),
            |(p, r)| (p.clone(), r.to_vec()),
        );
        let mut process = std::process::Command::new(program);
        process.args(rest);
        for (key, value) in cmd.env_overlay() {
            process.env(key, value);
        }
        process.stdin(Stdio::inherit());
        process
    }

    /// Spawn `cmd` with stdout and stderr sharing one pipe, so lines from
    /// both streams reach the reader in the order the child wrote them.
    fn spawn(&self, cmd: &Command) -> std::io::Result<(Child, PipeReader)> {
        let (reader, writer) = std::io::pipe()?;
        let mut process = self.build(cmd);
        process.stdout(writer.try_clone()?).stderr(writer);
        let child = process.spawn()?;
        // `process` owns the parent's write ends; EOF only arrives once
        // they are closed, which happens when it goes out of scope here.
        Ok((child, reader))
    }

    fn authorize_for(&self, cmd: &Command) -> Result<(), ExecError> {
        if self.privilege.ensure() {
            Ok(())
        } else {
            Err(ExecError::Unauthorized {
                command: cmd.to_string(),
            })
        }
    }
}

impl Executor for SystemExecutor {
    fn run(
        &self,
        cmd: &Command,
        sink: &mut dyn OutputSink,
        mode: OutputMode,
    ) -> Result<ExecResult, ExecError> {
        if cmd.is_elevated() {
            self.authorize_for(cmd)?;
        }

        let label = cmd.to_string();
        tracing::debug!("running: {label}");
        let streaming = mode == OutputMode::Stream;
        if streaming {
            sink.begin(cmd);
        }

        let (mut child, pipe) = match self.spawn(cmd) {
            Ok(spawned) => spawned,
            Err(source) => {
                if streaming {
                    sink.end(-1);
                }
                return Err(ExecError::Spawn {
                    command: label,
                    source,
                });
            }
        };

        // The reader keeps draining the pipe while the sink is busy, so a slow
        // sink can never fill the pipe buffer and stall the child.
        let (tx, rx) = mpsc::channel::<String>();
        let reader = thread::spawn(move || forward_lines(pipe, &tx));

        let mut captured = Vec::new();
        for line in rx {
            if streaming {
                sink.line(&line);
            }
            captured.push(line);
        }
        if reader.join().is_err() {
            tracing::warn!("output reader for '{label}' panicked");
        }

        // The pipe is at EOF here; only now is it safe to reap the child.
        let status = child.wait().map_err(|source| ExecError::Spawn {
            command: label.clone(),
            source,
        })?;
        let code = exit_code(status);
        if streaming {
            sink.end(code);
        }
        tracing::debug!("finished (exit {code}): {label}");

        let output = captured.join("\n").trim_end().to_string();
        if code != 0 && !cmd.is_safe() {
            return Err(ExecError::NonZeroExit {
                command: label,
                exit_code: code,
                output,
            });
        }
        Ok(ExecResult { output, code })
    }

    fn authorize(&self) -> Result<(), ExecError> {
        if self.privilege.ensure() {
            Ok(())
        } else {
            Err(ExecError::Unauthorized {
                command: "administrator session".to_string(),
            })
        }
    }
}

/// Read `pipe` line by line until EOF, sending each line (without its line
/// terminator) down `tx`. Invalid UTF-8 is replaced rather than aborting.
fn forward_lines(pipe: impl Read, tx: &mpsc::Sender<String>) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
        }
    }
}

/// Exit code of a finished process; Unix signal deaths map to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
