//! Command: report which package managers this host supports.
use std::sync::Arc;

use anyhow::Result;

use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::managers::{Context, ManagerKind};

/// Run the check command.
///
/// Only capability checks run: nothing is spawned and no manager is set up.
///
/// # Errors
///
/// Never fails today; returns `Result` to match the other commands.
pub fn run(log: &Logger) -> Result<()> {
    let ctx = Context::system(Arc::new(SystemExecutor::new()));
    report(&ctx, log);
    Ok(())
}

/// Log one line per manager kind and return the kinds that are supported.
pub fn report(ctx: &Context, log: &Logger) -> Vec<ManagerKind> {
    log.stage(&format!("Package managers on {}", ctx.platform));

    let mut supported = Vec::new();
    for kind in ManagerKind::ALL {
        let via = kind
            .dependency()
            .map_or_else(String::new, |dep| format!(" (via {dep})"));
        if kind.is_supported(ctx) {
            log.info(&format!("\x1b[32m✓\x1b[0m {kind}{via}"));
            supported.push(kind);
        } else {
            log.info(&format!("\x1b[2m✗ {kind}: unsupported\x1b[0m"));
        }
    }
    supported
}
