//! Console/file logger with per-package summary collection.
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::subscriber::STAGE_TARGET;
use super::types::{InstallEntry, InstallStatus};
use super::utils::log_file_path;

/// Front end used by the command handlers.
///
/// Messages go through `tracing`, so they reach both the console and the
/// persistent log file at `$XDG_CACHE_HOME/provision/<command>.log`. Results
/// recorded with [`record`](Self::record) are printed by
/// [`print_summary`](Self::print_summary) and decide the exit status.
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<InstallEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a logger for `command`.
    ///
    /// The log file itself is created by
    /// [`init_subscriber`](super::init_subscriber); this only remembers its
    /// path for the summary.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Path of the log file, if the cache directory is available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Log a stage header.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (console only with `-v`; always in the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a warning.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log an error.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Record a result for the summary.
    pub fn record(&self, name: &str, status: InstallStatus, message: Option<&str>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(InstallEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
    }

    /// Snapshot of all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<InstallEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of failed entries.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.status == InstallStatus::Failed)
            .count()
    }

    /// Print every recorded entry followed by the totals.
    #[allow(clippy::print_stdout)]
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }

        println!();
        self.stage("Summary");

        let (mut ok, mut skipped, mut failed) = (0u32, 0u32, 0u32);
        for entry in &entries {
            match entry.status {
                InstallStatus::Ok => ok += 1,
                InstallStatus::Skipped => skipped += 1,
                InstallStatus::Failed => failed += 1,
            }
            let (icon, color) = entry.status.style();
            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));
            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", entry.name));
        }

        println!();
        self.info(&format!(
            "{} total: \x1b[32m{ok} ok\x1b[0m, \
             \x1b[33m{skipped} skipped\x1b[0m, \x1b[31m{failed} failed\x1b[0m",
            ok + skipped + failed
        ));
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}
