//! Output sinks: where a running command's lines go.
//!
//! The engine decides *what ran and what it said*; a sink decides how that is
//! shown. Every line is captured by the engine regardless of what the sink
//! does with it.
use std::io::Write as _;

use super::Command;
use crate::logging::terminal_columns;

/// Receiver for a command's output lines.
///
/// Any `FnMut(&str) + Send` closure is a sink.
pub trait OutputSink: Send {
    /// One line of output, without its trailing newline.
    fn line(&mut self, line: &str);

    /// Called before the command is spawned.
    fn begin(&mut self, _command: &Command) {}

    /// Called after the command exits.
    fn end(&mut self, _exit_code: i32) {}
}

impl<F: FnMut(&str) + Send> OutputSink for F {
    fn line(&mut self, line: &str) {
        self(line);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn line(&mut self, _line: &str) {}
}

/// Keeps every line in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectSink {
    lines: Vec<String>,
}

impl CollectSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines received so far.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines joined by `\n`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

impl OutputSink for CollectSink {
    fn line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Prints every line to the console as it arrives.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamSink;

#[allow(clippy::print_stdout)]
impl OutputSink for StreamSink {
    fn line(&mut self, line: &str) {
        println!("    {line}");
        tracing::debug!(target: "provision::output", "{line}");
    }

    fn begin(&mut self, command: &Command) {
        println!("  \x1b[2m$ {command}\x1b[0m");
    }
}

/// Quiet mode: a single self-overwriting status row.
///
/// Lines are not printed; each one replaces the status text and is sent to
/// the log file at debug level, so the full output stays available for
/// diagnosis.
#[derive(Debug, Default)]
pub struct StatusSink {
    label: String,
    shown: bool,
}

#[allow(clippy::print_stdout)]
impl StatusSink {
    /// Create a sink with nothing displayed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn draw(&mut self, detail: &str) {
        let text = if detail.is_empty() {
            self.label.clone()
        } else {
            format!("{}: {detail}", self.label)
        };
        let row = truncate_to(&text, terminal_columns().saturating_sub(4));
        print!("\r\x1b[K  \x1b[2m▹ {row}\x1b[0m");
        std::io::stdout().flush().ok();
        self.shown = true;
    }

    fn clear(&mut self) {
        if self.shown {
            print!("\r\x1b[K");
            std::io::stdout().flush().ok();
            self.shown = false;
        }
    }
}

impl OutputSink for StatusSink {
    fn line(&mut self, line: &str) {
        tracing::debug!(target: "provision::output", "{line}");
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            self.draw(trimmed);
        }
    }

    fn begin(&mut self, command: &Command) {
        self.label = command.to_string();
        self.draw("");
    }

    fn end(&mut self, _exit_code: i32) {
        self.clear();
    }
}

/// Truncate `text` to at most `max` characters, marking the cut with `…`.
fn truncate_to(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn closure_is_a_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |line: &str| seen.push(line.to_string());
            sink.line("a");
            sink.line("b");
        }
        assert_eq!(seen, ["a", "b"]);
    }

    #[test]
    fn collect_sink_joins_lines() {
        let mut sink = CollectSink::new();
        sink.line("first");
        sink.line("second");
        assert_eq!(sink.lines().len(), 2);
        assert_eq!(sink.joined(), "first\nsecond");
    }

    #[test]
    fn status_sink_tracks_shown_row() {
        let mut sink = StatusSink::new();
        sink.begin(&Command::new("brew").arg("update"));
        assert!(sink.shown);
        sink.line("==> Updating Homebrew...");
        sink.line("   ");
        sink.end(0);
        assert!(!sink.shown);
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_to("short", 10), "short");
    }

    #[test]
    fn truncate_marks_cut() {
        let out = truncate_to("abcdefghij", 5);
        assert_eq!(out, "abcd…");
        assert_eq!(out.chars().count(), 5);
    }
}
