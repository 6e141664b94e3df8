//! Summary entries recorded by the [`Logger`](super::Logger).

/// Result of one package (or manager) for summary reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallEntry {
    /// Display name, e.g. `homebrew: git`.
    pub name: String,
    /// Final status.
    pub status: InstallStatus,
    /// Optional detail (skip reason or error description).
    pub message: Option<String>,
}

/// Status of a recorded entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    /// Installed (or already present).
    Ok,
    /// Not attempted, e.g. the manager is unsupported on this host.
    Skipped,
    /// Setup or install failed.
    Failed,
}

impl InstallStatus {
    /// Summary icon and ANSI color.
    pub(super) const fn style(self) -> (&'static str, &'static str) {
        match self {
            Self::Ok => ("✓", "\x1b[32m"),
            Self::Skipped => ("○", "\x1b[33m"),
            Self::Failed => ("✗", "\x1b[31m"),
        }
    }
}
