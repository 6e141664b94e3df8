//! Lazily constructed, cached package managers.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{
    Apt, Context, Homebrew, MacAppStore, Manager, ManagerKind, Scoop, Snap, WinGet,
    ensure_supported,
};
use crate::error::ManagerError;

/// Lifecycle of one manager kind within a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Not requested yet.
    Uninitialized,
    /// Unsupported on this host.
    Rejected,
    /// Setup failed; terminal for the life of the registry.
    Failed,
    /// Constructed and usable.
    Ready,
}

#[derive(Debug)]
enum Slot {
    Rejected,
    Failed,
    Ready(Manager),
}

/// Builds each manager at most once and shares it.
///
/// Dependencies are built through the registry too, so Snap and a direct
/// request for APT share one APT instance and APT's setup runs once.
#[derive(Debug)]
pub struct Registry {
    ctx: Context,
    slots: Mutex<HashMap<ManagerKind, Slot>>,
}

impl Registry {
    /// Create an empty registry over `ctx`.
    #[must_use]
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Context shared by every manager built here.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// Current state of `kind`.
    #[must_use]
    pub fn state(&self, kind: ManagerKind) -> ManagerState {
        match self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
        {
            None => ManagerState::Uninitialized,
            Some(Slot::Rejected) => ManagerState::Rejected,
            Some(Slot::Failed) => ManagerState::Failed,
            Some(Slot::Ready(_)) => ManagerState::Ready,
        }
    }

    /// Get the ready manager for `kind`, constructing it on first use.
    ///
    /// # Errors
    ///
    /// - [`ManagerError::Unsupported`] when `kind` cannot run on this host.
    /// - [`ManagerError::Setup`] when its setup fails.
    /// - [`ManagerError::Dependency`] when the manager it depends on fails.
    /// - [`ManagerError::PreviouslyFailed`] on any request after a failure.
    pub fn get(&self, kind: ManagerKind) -> Result<Manager, ManagerError> {
        // The lock is released before constructing: dependencies re-enter `get`.
        let cached = match self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
        {
            Some(Slot::Ready(manager)) => Some(Ok(manager.clone())),
            Some(Slot::Failed) => Some(Err(ManagerError::PreviouslyFailed { manager: kind })),
            Some(Slot::Rejected) => Some(Err(ManagerError::Unsupported {
                manager: kind,
                platform: self.ctx.platform,
            })),
            None => None,
        };
        if let Some(result) = cached {
            return result;
        }

        let result = self.construct(kind);
        let slot = match &result {
            Ok(manager) => Slot::Ready(manager.clone()),
            Err(ManagerError::Unsupported { .. }) => Slot::Rejected,
            Err(e) => {
                tracing::debug!("{kind} marked failed: {e}");
                Slot::Failed
            }
        };
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, slot);
        result
    }

    fn construct(&self, kind: ManagerKind) -> Result<Manager, ManagerError> {
        // Support is checked before the dependency so an unsupported dependent
        // never causes its dependency to be set up.
        ensure_supported(kind, &self.ctx)?;
        let ctx = self.ctx.clone();
        Ok(match kind {
            ManagerKind::Homebrew => Manager::Homebrew(Arc::new(Homebrew::new(ctx)?)),
            ManagerKind::Apt => Manager::Apt(Arc::new(Apt::new(ctx)?)),
            ManagerKind::Scoop => Manager::Scoop(Arc::new(Scoop::new(ctx)?)),
            ManagerKind::WinGet => Manager::WinGet(Arc::new(WinGet::new(ctx)?)),
            ManagerKind::Snap => match self.dependency(kind, ManagerKind::Apt)? {
                Manager::Apt(apt) => Manager::Snap(Arc::new(Snap::new(ctx, apt)?)),
                other => return Err(mismatched(kind, &other)),
            },
            ManagerKind::MacAppStore => match self.dependency(kind, ManagerKind::Homebrew)? {
                Manager::Homebrew(brew) => {
                    Manager::MacAppStore(Arc::new(MacAppStore::new(ctx, brew)?))
                }
                other => return Err(mismatched(kind, &other)),
            },
        })
    }

    fn dependency(
        &self,
        manager: ManagerKind,
        dependency: ManagerKind,
    ) -> Result<Manager, ManagerError> {
        self.get(dependency)
            .map_err(|source| ManagerError::Dependency {
                manager,
                dependency,
                source: Box::new(source),
            })
    }
}

fn mismatched(kind: ManagerKind, found: &Manager) -> ManagerError {
    ManagerError::setup(
        kind,
        format!("dependency resolved to unexpected manager {}", found.kind()),
    )
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::managers::InstallOptions;
    use crate::managers::test_helpers::{MockExecutor, context, context_with};
    use crate::operations::MockFileSystemOps;
    use crate::platform::{Arch, Os, Platform};

    const LINUX: Platform = Platform::new(Os::Linux, Arch::X86_64);
    const MAC: Platform = Platform::new(Os::MacOs, Arch::Aarch64);

    fn debian() -> MockFileSystemOps {
        MockFileSystemOps::new()
            .with_program("apt-get", "/usr/bin/apt-get")
            .with_program("snap", "/usr/bin/snap")
    }

    #[test]
    fn states_start_uninitialized() {
        let (ctx, _exec) = context(LINUX, debian());
        let registry = Registry::new(ctx);
        for kind in ManagerKind::ALL {
            assert_eq!(registry.state(kind), ManagerState::Uninitialized);
        }
    }

    #[test]
    fn ready_manager_is_cached() {
        let (ctx, exec) = context(LINUX, debian());
        let registry = Registry::new(ctx);
        registry.get(ManagerKind::Apt).unwrap();
        registry.get(ManagerKind::Apt).unwrap();
        assert_eq!(registry.state(ManagerKind::Apt), ManagerState::Ready);
        assert_eq!(exec.rendered(), ["sudo apt-get update"]);
    }

    #[test]
    fn snap_shares_the_registry_apt() {
        let (ctx, exec) = context(LINUX, debian());
        let registry = Registry::new(ctx);
        let Manager::Snap(snap) = registry.get(ManagerKind::Snap).unwrap() else {
            panic!("expected snap");
        };
        let Manager::Apt(apt) = registry.get(ManagerKind::Apt).unwrap() else {
            panic!("expected apt");
        };
        assert!(Arc::ptr_eq(snap.apt(), &apt));
        assert_eq!(
            exec.rendered(),
            ["sudo apt-get update", "snap refresh --list"]
        );
    }

    #[test]
    fn unsupported_is_rejected_without_spawning() {
        let (ctx, exec) = context(LINUX, MockFileSystemOps::new());
        let registry = Registry::new(ctx);
        let err = registry.get(ManagerKind::Snap).unwrap_err();
        assert!(matches!(err, ManagerError::Unsupported { .. }));
        assert_eq!(registry.state(ManagerKind::Snap), ManagerState::Rejected);
        assert_eq!(registry.state(ManagerKind::Apt), ManagerState::Uninitialized);
        assert_eq!(exec.call_count(), 0);
    }

    #[test]
    fn failed_setup_is_terminal() {
        let (ctx, exec) = context_with(LINUX, debian(), MockExecutor::new().then(100, ""));
        let registry = Registry::new(ctx);

        assert!(matches!(
            registry.get(ManagerKind::Apt),
            Err(ManagerError::Setup { .. })
        ));
        assert!(matches!(
            registry.get(ManagerKind::Apt),
            Err(ManagerError::PreviouslyFailed { .. })
        ));
        assert_eq!(registry.state(ManagerKind::Apt), ManagerState::Failed);
        assert_eq!(exec.call_count(), 1, "failed setup is never retried");
    }

    #[test]
    fn dependency_failure_fails_dependent() {
        let exec = MockExecutor::new().denying_elevation();
        let (ctx, exec) = context_with(MAC, MockFileSystemOps::new(), exec);
        let registry = Registry::new(ctx);

        let err = registry.get(ManagerKind::MacAppStore).unwrap_err();
        assert!(matches!(
            err,
            ManagerError::Dependency {
                manager: ManagerKind::MacAppStore,
                dependency: ManagerKind::Homebrew,
                ..
            }
        ));
        assert!(err.is_setup_failure());
        assert_eq!(registry.state(ManagerKind::Homebrew), ManagerState::Failed);
        assert_eq!(registry.state(ManagerKind::MacAppStore), ManagerState::Failed);
        assert_eq!(exec.call_count(), 0);
    }

    #[test]
    fn package_failure_keeps_manager_ready() {
        let exec = MockExecutor::new().then(0, "").then(100, "E: nope");
        let (ctx, _exec) = context_with(LINUX, debian(), exec);
        let registry = Registry::new(ctx);
        let apt = registry.get(ManagerKind::Apt).unwrap();
        let report = apt.install("nope", &InstallOptions::new()).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(registry.state(ManagerKind::Apt), ManagerState::Ready);
    }
}
