//! Execution backend contract.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use quay_types::{CommandSpec, RunMode};

use super::process::ProcessHandle;

/// One execution strategy: where output goes and how processes start.
///
/// Surfaces are identified by slot key; a backend may keep whatever
/// per-key state it needs to reset and show them.
#[async_trait]
pub trait Backend: Send + Sync {
    fn mode(&self) -> RunMode;

    /// Wait between interrupt and force-terminate.
    fn grace_period(&self) -> Duration;

    /// Whether replacing a live process asks the user first. Backends
    /// that restart in place answer `false`.
    fn confirms_kill(&self) -> bool {
        self.mode().confirms_kill()
    }

    /// Human-readable identity of the surface for `slot_key`.
    fn surface_name(&self, slot_key: &str) -> String {
        slot_key.to_string()
    }

    async fn reset_surface(&self, slot_key: &str) -> Result<()>;

    /// Start `spec.command_line()` in `spec.working_dir()`, attached to the
    /// surface for `slot_key`.
    async fn spawn(&self, slot_key: &str, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>>;

    async fn activate_surface(&self, slot_key: &str, spec: &CommandSpec) -> Result<()>;
}
