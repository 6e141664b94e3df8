//! Platform shell used for [`Command::shell`](super::Command::shell) commands.
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use super::Command;

/// A shell program and the flags that make it run one script and exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    program: PathBuf,
    flags: Vec<String>,
}

impl Shell {
    /// Pick the default shell for this host.
    ///
    /// Unix prefers `/bin/zsh`, then `$SHELL`, then `/bin/sh`. Windows uses
    /// Windows PowerShell.
    #[must_use]
    pub fn detect() -> Self {
        if cfg!(windows) {
            return Self::from_path("powershell.exe");
        }
        let zsh = Path::new("/bin/zsh");
        if zsh.exists() {
            return Self::from_path(zsh);
        }
        std::env::var_os("SHELL")
            .filter(|s| !s.is_empty())
            .map_or_else(|| Self::from_path("/bin/sh"), Self::from_path)
    }

    /// Build a shell from a program path, inferring the script flags from
    /// its file name.
    #[must_use]
    pub fn from_path(program: impl Into<PathBuf>) -> Self {
        let shell = Self::new(program, Vec::<String>::new());
        let flags: &[&str] = match shell.stem().as_str() {
            "powershell" | "pwsh" => &["-NoProfile", "-NonInteractive", "-Command"],
            "cmd" => &["/C"],
            _ => &["-c"],
        };
        Self::new(shell.program, flags.iter().copied())
    }

    /// Build a shell with explicit flags.
    #[must_use]
    pub fn new<I, S>(program: impl Into<PathBuf>, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            flags: flags.into_iter().map(Into::into).collect(),
        }
    }

    /// Path of the shell program.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Flags placed between the program and the script.
    #[must_use]
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// The script handed to this shell for `cmd`.
    ///
    /// The command text is passed through as written; each argument added
    /// with [`Command::arg`] is quoted so the shell sees one literal word.
    #[must_use]
    pub fn script(&self, cmd: &Command) -> String {
        let mut script = cmd.program().to_string();
        for arg in cmd.arguments() {
            script.push(' ');
            script.push_str(&self.quote(arg));
        }
        script
    }

    fn quote<'a>(&self, arg: &'a str) -> Cow<'a, str> {
        let plain = !arg.is_empty()
            && arg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_./:=+".contains(c));
        if plain {
            return Cow::Borrowed(arg);
        }
        Cow::Owned(match self.stem().as_str() {
            "powershell" | "pwsh" => format!("'{}'", arg.replace('\'', "''")),
            "cmd" => format!("\"{}\"", arg.replace('"', "\"\"")),
            _ => format!("'{}'", arg.replace('\'', r"'\''")),
        })
    }

    fn stem(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}
