//! Host file-system queries behind a trait for dependency injection.
//!
//! Capability checks and manager setup only ever ask two questions of the
//! host: "does this path exist?" and "where is this program on `PATH`?".
//! Production code answers them with [`SystemFileSystemOps`]; tests use
//! `MockFileSystemOps` to fake a bootstrapped (or bare) machine.

use std::path::{Path, PathBuf};

/// Abstraction over the file-system queries used by package managers.
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Resolve `program` against `PATH`, returning its full path if found.
    fn which(&self, program: &str) -> Option<PathBuf>;
}

/// Production [`FileSystemOps`] implementation backed by [`std::fs`] and
/// the [`which`] crate.
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Mock [`FileSystemOps`] for unit tests.
///
/// # Example
///
/// ```ignore
/// let fs = MockFileSystemOps::new()
///     .with_existing("/opt/homebrew/bin/brew")
///     .with_program("apt-get", "/usr/bin/apt-get");
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFileSystemOps {
    existing: Vec<PathBuf>,
    programs: std::collections::HashMap<String, PathBuf>,
    /// Paths that report missing on their first lookup and present afterwards,
    /// simulating a bootstrap that installs them.
    appearing: std::sync::Mutex<std::collections::HashMap<PathBuf, bool>>,
    lookups: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockFileSystemOps {
    /// Create an empty mock: nothing exists and nothing is on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as existing.
    #[must_use]
    pub fn with_existing(mut self, path: impl Into<PathBuf>) -> Self {
        let p = path.into();
        if !self.existing.contains(&p) {
            self.existing.push(p);
        }
        self
    }

    /// Put `program` on the fake `PATH` at `path` (also marks `path` as existing).
    #[must_use]
    pub fn with_program(mut self, program: &str, path: impl Into<PathBuf>) -> Self {
        let p = path.into();
        self.programs.insert(program.to_string(), p.clone());
        self.with_existing(p)
    }

    /// Make `path` missing on the first [`FileSystemOps::exists`] call and
    /// present on every call after that.
    #[must_use]
    pub fn with_appearing(self, path: impl Into<PathBuf>) -> Self {
        if let Ok(mut guard) = self.appearing.lock() {
            guard.insert(path.into(), false);
        }
        self
    }

    /// Total number of `exists`/`which` lookups served.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl FileSystemOps for MockFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        self.lookups
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Ok(mut guard) = self.appearing.lock()
            && let Some(seen) = guard.get_mut(path)
        {
            let present = *seen;
            *seen = true;
            return present;
        }
        self.existing.iter().any(|p| p == path)
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.lookups
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.programs.get(program).cloned()
    }
}
