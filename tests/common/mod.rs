// Shared helpers for integration tests.
//
// The crate's own mocks are `#[cfg(test)]` and invisible here, so this module
// provides public-API fakes: a file system with a fixed set of binaries, a
// scripted executor that records every command, and an authorizer that
// counts how often it is asked.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use provision_cli::error::ExecError;
use provision_cli::exec::{Authorizer, Command, ExecResult, Executor, OutputMode, OutputSink};
use provision_cli::managers::Context;
use provision_cli::operations::FileSystemOps;
use provision_cli::platform::{Arch, Os, Platform};

pub const DEBIAN: Platform = Platform::new(Os::Linux, Arch::X86_64);
pub const LINUX_ARM: Platform = Platform::new(Os::Linux, Arch::Aarch64);
pub const MAC: Platform = Platform::new(Os::MacOs, Arch::Aarch64);
pub const WINDOWS: Platform = Platform::new(Os::Windows, Arch::X86_64);

/// A file system where only the listed paths exist.
#[derive(Debug, Default)]
pub struct FakeFs {
    existing: HashSet<PathBuf>,
    programs: HashMap<String, PathBuf>,
    /// Missing on the first lookup, present afterwards.
    appearing: Mutex<HashMap<PathBuf, bool>>,
    lookups: AtomicUsize,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.existing.insert(path.into());
        self
    }

    pub fn with_program(mut self, program: &str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.programs.insert(program.to_string(), path.clone());
        self.with_file(path)
    }

    pub fn with_appearing(self, path: impl Into<PathBuf>) -> Self {
        self.appearing
            .lock()
            .expect("appearing lock")
            .insert(path.into(), false);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl FileSystemOps for FakeFs {
    fn exists(&self, path: &Path) -> bool {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(seen) = self.appearing.lock().expect("appearing lock").get_mut(path) {
            let present = *seen;
            *seen = true;
            return present;
        }
        self.existing.contains(path)
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.programs.get(program).cloned()
    }
}

/// Debian-family host with APT and snap installed.
pub fn debian_fs() -> FakeFs {
    FakeFs::new()
        .with_program("apt-get", "/usr/bin/apt-get")
        .with_program("snap", "/usr/bin/snap")
}

/// Records commands and answers them from a FIFO of `(exit_code, output)`.
///
/// An empty queue answers success with no output. Non-zero codes fail unless
/// the command is safe, the same contract the real engine follows.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<(i32, String)>>,
    calls: Mutex<Vec<Command>>,
    deny_elevation: bool,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, code: i32, output: &str) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back((code, output.to_string()));
        self
    }

    pub fn denying_elevation(mut self) -> Self {
        self.deny_elevation = true;
        self
    }

    pub fn calls(&self) -> Vec<Command> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Each command as typed at a terminal, `sudo` and environment included.
    pub fn rendered(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|cmd| {
                let mut line = String::new();
                if cmd.is_elevated() {
                    line.push_str("sudo ");
                }
                for (key, value) in cmd.env_overlay() {
                    line.push_str(&format!("{key}={value} "));
                }
                line.push_str(&cmd.to_string());
                line
            })
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

impl Executor for ScriptedExecutor {
    fn run(
        &self,
        cmd: &Command,
        sink: &mut dyn OutputSink,
        mode: OutputMode,
    ) -> Result<ExecResult, ExecError> {
        if cmd.is_elevated() && self.deny_elevation {
            return Err(ExecError::Unauthorized {
                command: cmd.to_string(),
            });
        }
        self.calls.lock().expect("calls lock").push(cmd.clone());
        let (code, output) = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_default();
        if mode == OutputMode::Stream {
            sink.begin(cmd);
            for line in output.lines() {
                sink.line(line);
            }
            sink.end(code);
        }
        if code != 0 && !cmd.is_safe() {
            return Err(ExecError::NonZeroExit {
                command: cmd.to_string(),
                exit_code: code,
                output,
            });
        }
        Ok(ExecResult { output, code })
    }

    fn authorize(&self) -> Result<(), ExecError> {
        if self.deny_elevation {
            Err(ExecError::Unauthorized {
                command: "administrator session".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Build a capture-mode context over fakes.
pub fn context(
    platform: Platform,
    fs: FakeFs,
    exec: ScriptedExecutor,
) -> (Context, Arc<FakeFs>, Arc<ScriptedExecutor>) {
    let fs = Arc::new(fs);
    let exec = Arc::new(exec);
    let ctx = Context::new(
        platform,
        Arc::clone(&fs) as Arc<dyn FileSystemOps>,
        Arc::clone(&exec) as Arc<dyn Executor>,
    );
    (ctx, fs, exec)
}

/// Authorizer that never touches the real system and counts its calls.
#[derive(Debug, Clone, Default)]
pub struct CountingAuthorizer {
    pub already_authorized: bool,
    pub grant: bool,
    pub probes: Arc<AtomicUsize>,
    pub prompts: Arc<AtomicUsize>,
    pub refreshes: Arc<AtomicUsize>,
}

impl CountingAuthorizer {
    pub fn granting() -> Self {
        Self {
            grant: true,
            ..Self::default()
        }
    }

    pub fn refusing() -> Self {
        Self::default()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl Authorizer for CountingAuthorizer {
    fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.already_authorized
    }

    fn prompt(&self) -> std::io::Result<bool> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        Ok(self.grant)
    }

    fn refresh(&self) -> bool {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        true
    }
}
