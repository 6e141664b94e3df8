//! Process-wide elevated-privilege session.
//!
//! The first elevated command of a run triggers one silent probe and, if that
//! fails, one interactive prompt. The outcome is cached for the rest of the
//! process either way, so the user is asked at most once. Every later use of a
//! granted session silently extends sudo's credential cache, which would
//! otherwise expire during a long run and make sudo ask again.
use std::fmt;
use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};

/// Source of elevated authorization.
#[cfg_attr(test, mockall::automock)]
pub trait Authorizer: Send + Sync {
    /// Check silently whether elevated commands would run without prompting.
    fn probe(&self) -> bool;

    /// Ask the user for credentials. Returns `Ok(true)` when granted.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt itself could not be shown.
    fn prompt(&self) -> std::io::Result<bool>;

    /// Extend an existing authorization without prompting. Returns `false`
    /// when it has lapsed and could not be renewed silently.
    fn refresh(&self) -> bool;
}

/// Production [`Authorizer`]: `sudo` on Unix, administrator token check on Windows.
#[derive(Debug, Default)]
pub struct SystemAuthorizer;

impl Authorizer for SystemAuthorizer {
    fn probe(&self) -> bool {
        // `net session` only succeeds from an elevated Windows session.
        let (program, args): (&str, &[&str]) = if cfg!(windows) {
            ("net", &["session"])
        } else {
            ("sudo", &["-n", "true"])
        };
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn prompt(&self) -> std::io::Result<bool> {
        if cfg!(windows) {
            // UAC cannot be raised for an already-running process.
            return Ok(false);
        }
        let status = Command::new("sudo").arg("-v").status()?;
        Ok(status.success())
    }

    fn refresh(&self) -> bool {
        // An elevated Windows token lasts as long as the process.
        if cfg!(windows) {
            return true;
        }
        Command::new("sudo")
            .args(["-n", "-v"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unknown,
    Granted,
    Denied,
}

/// Cached elevated authorization for the lifetime of the process.
///
/// Created once by the top-level orchestrator and owned by the executor. The
/// mutex is held across probe and prompt so concurrent callers never prompt
/// twice.
pub struct PrivilegeSession {
    authorizer: Box<dyn Authorizer>,
    state: Mutex<State>,
}

impl fmt::Debug for PrivilegeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivilegeSession")
            .field("state", &self.current())
            .finish_non_exhaustive()
    }
}

impl PrivilegeSession {
    /// Create an unauthorized session backed by `authorizer`.
    #[must_use]
    pub fn new(authorizer: Box<dyn Authorizer>) -> Self {
        Self {
            authorizer,
            state: Mutex::new(State::Unknown),
        }
    }

    fn current(&self) -> State {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` once authorization has been granted.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.current() == State::Granted
    }

    /// Authorize the session if that has not been attempted yet.
    ///
    /// Returns whether elevated commands may run.
    pub fn ensure(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            State::Granted => {
                if !self.authorizer.refresh() {
                    tracing::warn!("cached administrator credentials have expired");
                }
                return true;
            }
            State::Denied => return false,
            State::Unknown => {}
        }

        if self.authorizer.probe() {
            tracing::debug!("elevated session already authorized");
            *state = State::Granted;
            return true;
        }

        tracing::info!("administrator authorization required");
        let granted = match self.authorizer.prompt() {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!("could not prompt for authorization: {e}");
                false
            }
        };
        *state = if granted {
            State::Granted
        } else {
            State::Denied
        };
        granted
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn probe_success_skips_prompt() {
        let mut auth = MockAuthorizer::new();
        auth.expect_probe().times(1).return_const(true);
        auth.expect_prompt().never();

        let session = PrivilegeSession::new(Box::new(auth));
        assert!(!session.is_authorized());
        assert!(session.ensure());
        assert!(session.is_authorized());
    }

    #[test]
    fn prompt_runs_once_across_repeated_ensures() {
        let mut auth = MockAuthorizer::new();
        auth.expect_probe().times(1).return_const(false);
        auth.expect_prompt().times(1).returning(|| Ok(true));
        auth.expect_refresh().times(2).return_const(true);

        let session = PrivilegeSession::new(Box::new(auth));
        for _ in 0..3 {
            assert!(session.ensure());
        }
    }

    #[test]
    fn granted_session_refreshes_silently_on_reuse() {
        let mut auth = MockAuthorizer::new();
        auth.expect_probe().times(1).return_const(false);
        auth.expect_prompt().times(1).returning(|| Ok(true));
        auth.expect_refresh().times(5).return_const(true);

        let session = PrivilegeSession::new(Box::new(auth));
        for _ in 0..6 {
            assert!(session.ensure());
        }
    }

    #[test]
    fn lapsed_refresh_keeps_session_granted_without_prompting() {
        let mut auth = MockAuthorizer::new();
        auth.expect_probe().times(1).return_const(true);
        auth.expect_prompt().never();
        auth.expect_refresh().times(1).return_const(false);

        let session = PrivilegeSession::new(Box::new(auth));
        assert!(session.ensure());
        assert!(session.ensure());
        assert!(session.is_authorized());
    }

    #[test]
    fn denied_session_never_refreshes() {
        let mut auth = MockAuthorizer::new();
        auth.expect_probe().times(1).return_const(false);
        auth.expect_prompt().times(1).returning(|| Ok(false));
        auth.expect_refresh().never();

        let session = PrivilegeSession::new(Box::new(auth));
        assert!(!session.ensure());
        assert!(!session.ensure());
    }

    #[test]
    fn denial_is_cached_and_never_reprompted() {
        let mut auth = MockAuthorizer::new();
        auth.expect_probe().times(1).return_const(false);
        auth.expect_prompt().times(1).returning(|| Ok(false));

        let session = PrivilegeSession::new(Box::new(auth));
        assert!(!session.ensure());
        assert!(!session.ensure());
        assert!(!session.is_authorized());
    }

    #[test]
    fn prompt_io_error_counts_as_denied() {
        let mut auth = MockAuthorizer::new();
        auth.expect_probe().return_const(false);
        auth.expect_prompt()
            .times(1)
            .returning(|| Err(std::io::Error::other("no tty")));

        let session = PrivilegeSession::new(Box::new(auth));
        assert!(!session.ensure());
    }

    #[test]
    fn concurrent_callers_prompt_once() {
        let mut auth = MockAuthorizer::new();
        auth.expect_probe().times(1).return_const(false);
        auth.expect_prompt().times(1).returning(|| Ok(true));
        auth.expect_refresh().times(3).return_const(true);

        let session = std::sync::Arc::new(PrivilegeSession::new(Box::new(auth)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let session = std::sync::Arc::clone(&session);
                std::thread::spawn(move || session.ensure())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn debug_shows_state() {
        let mut auth = MockAuthorizer::new();
        auth.expect_probe().return_const(true);
        let session = PrivilegeSession::new(Box::new(auth));
        assert!(format!("{session:?}").contains("Unknown"));
        session.ensure();
        assert!(format!("{session:?}").contains("Granted"));
    }
}
