use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ExecError;
use crate::exec::{Command, ExecResult, Executor, NullSink, OutputMode, OutputSink};
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::platform::Platform;

/// Everything a package manager needs from its environment.
///
/// Cheap to clone: the executor, file-system view and sink are shared. A
/// dependent manager and the manager it depends on see the same context, so
/// their output goes to the same sink and they share one privilege session.
#[derive(Clone)]
pub struct Context {
    /// Host platform used by the support predicates.
    pub platform: Platform,
    /// Binary lookups (injectable for testing).
    pub fs_ops: Arc<dyn FileSystemOps>,
    /// Command executor (injectable for testing).
    pub executor: Arc<dyn Executor>,
    sink: Arc<Mutex<Box<dyn OutputSink>>>,
    mode: OutputMode,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("platform", &self.platform)
            .field("fs_ops", &self.fs_ops)
            .field("executor", &self.executor)
            .field("sink", &"<dyn OutputSink>")
            .field("mode", &self.mode)
            .finish()
    }
}

impl Context {
    /// A context that captures output without displaying it.
    #[must_use]
    pub fn new(
        platform: Platform,
        fs_ops: Arc<dyn FileSystemOps>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            platform,
            fs_ops,
            executor,
            sink: Arc::new(Mutex::new(Box::new(NullSink))),
            mode: OutputMode::Capture,
        }
    }

    /// A context for the real host: detected platform and real file system.
    #[must_use]
    pub fn system(executor: Arc<dyn Executor>) -> Self {
        Self::new(Platform::detect(), Arc::new(SystemFileSystemOps), executor)
    }

    /// Stream every command's output to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.sink = Arc::new(Mutex::new(Box::new(sink)));
        self.mode = OutputMode::Stream;
        self
    }

    /// Output mode applied to every command.
    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Run `cmd` through the executor with this context's sink and mode.
    ///
    /// # Errors
    ///
    /// Propagates the executor's [`ExecError`].
    pub fn run(&self, cmd: &Command) -> Result<ExecResult, ExecError> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        self.executor.run(cmd, &mut **sink, self.mode)
    }

    /// Authorize the privilege session ahead of a script that elevates itself.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Unauthorized`] when authorization is refused.
    pub fn authorize(&self) -> Result<(), ExecError> {
        self.executor.authorize()
    }
}
