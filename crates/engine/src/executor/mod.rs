//! Executor: runs a selected command through a backend while managing the
//! process slot it belongs to.
//!
//! - `backend::Backend` abstracts where output goes and how processes start
//! - `slot::SlotRegistry` tracks one live process and the last spec per slot key
//! - `captured::CapturedLogBackend` restarts in place; other backends ask
//!   before killing a live process

mod backend;
mod captured;
mod process;
mod shell;
mod slot;

use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow};
use quay_types::{CommandSpec, RunMode};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info};

pub use backend::Backend;
pub use captured::CapturedLogBackend;
pub use process::{ChildProcess, ProcessHandle};
pub use shell::{raw_terminal_command, raw_terminal_wrapper, shell_command};
pub use slot::{ProcessSlot, SlotRegistry, SlotState, SlotSummary};

use crate::{experiment::EnabledExperiments, prompt::Prompter};

/// Confirmation shown before a live process is replaced.
pub const KILL_PROMPT: &str = "A process is running; kill it?";

const LIVENESS_POLL_INTERVAL: Duration = Duration::from_millis(25);
const REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of [`Executor::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Started {
        slot_key: String,
        mode: RunMode,
        pid: Option<u32>,
    },
    /// The user kept the running process; nothing was spawned.
    Declined { slot_key: String },
}

impl RunOutcome {
    pub fn slot_key(&self) -> &str {
        match self {
            RunOutcome::Started { slot_key, .. } | RunOutcome::Declined { slot_key } => slot_key,
        }
    }
}

/// Owns the slot registry and dispatches runs to backends.
pub struct Executor {
    backends: HashMap<RunMode, Arc<dyn Backend>>,
    slots: SlotRegistry,
    prompter: Arc<dyn Prompter>,
    raw_terminal_override: bool,
}

impl Executor {
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self {
            backends: HashMap::new(),
            slots: SlotRegistry::new(),
            prompter,
            raw_terminal_override: false,
        }
    }

    /// Register `backend` for its mode, replacing any previous one.
    pub fn register_backend(&mut self, backend: Arc<dyn Backend>) -> &mut Self {
        self.backends.insert(backend.mode(), backend);
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.register_backend(backend);
        self
    }

    /// Apply experiment switches for subsequent runs.
    pub fn apply_experiments(&mut self, experiments: &EnabledExperiments) {
        self.raw_terminal_override = experiments.raw_terminal();
    }

    /// Mode actually used for a run requested in `requested` mode.
    pub fn effective_mode(&self, requested: RunMode) -> RunMode {
        if self.raw_terminal_override {
            RunMode::RawTerminalExperimental
        } else {
            requested
        }
    }

    pub fn slots(&self) -> &SlotRegistry {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotRegistry {
        &mut self.slots
    }

    pub fn backend(&self, mode: RunMode) -> Result<Arc<dyn Backend>> {
        self.backends
            .get(&mode)
            .cloned()
            .ok_or_else(|| anyhow!("no backend registered for {mode} mode"))
    }

    /// Run `spec` in its slot.
    ///
    /// A live process in the slot is replaced: confirm-kill backends ask
    /// first and return [`RunOutcome::Declined`] on "no" without touching
    /// anything; restart-in-place backends stop it silently. Stopping is
    /// interrupt, grace period, then force-terminate, and its failures are
    /// ignored.
    pub async fn run(&mut self, spec: CommandSpec, requested: RunMode) -> Result<RunOutcome> {
        let slot_key = spec.slot_key();
        let mode = self.effective_mode(requested);
        let backend = self.backend(mode)?;

        let slot = self.slots.entry(&slot_key, || backend.surface_name(&slot_key));
        if slot.has_live_process() {
            if backend.confirms_kill() && !self.prompter.confirm(KILL_PROMPT) {
                info!(slot_key = %slot_key, pid = ?slot.pid(), "kill declined; run aborted");
                return Ok(RunOutcome::Declined { slot_key });
            }
            if let Some(mut process) = slot.take_process() {
                stop_process(&slot_key, process.as_mut(), backend.grace_period()).await;
            }
        }
        slot.set_surface(backend.surface_name(&slot_key));

        backend
            .reset_surface(&slot_key)
            .await
            .with_context(|| format!("reset output surface for {slot_key}"))?;
        let process = backend.spawn(&slot_key, &spec).await?;
        let pid = process.pid();
        info!(
            slot_key = %slot_key,
            mode = %mode,
            pid = ?pid,
            command = %spec.command_line(),
            "process spawned"
        );
        slot.record_run(spec.clone(), requested, process);

        backend.activate_surface(&slot_key, &spec).await?;
        Ok(RunOutcome::Started { slot_key, mode, pid })
    }

    /// Run the slot's last spec again with the mode it was last requested in.
    pub async fn repeat(&mut self, slot_key: &str) -> Result<RunOutcome> {
        let slot = self
            .slots
            .get(slot_key)
            .ok_or_else(|| anyhow!("no slot named '{slot_key}'"))?;
        let spec = slot
            .last_spec()
            .cloned()
            .ok_or_else(|| anyhow!("slot '{slot_key}' has not run anything yet"))?;
        let mode = slot.last_mode().unwrap_or(RunMode::CapturedLog);
        debug!(slot_key = %slot_key, mode = %mode, "repeating last run");
        self.run(spec, mode).await
    }

    /// Wait for the slot's process to exit and return its exit code.
    pub async fn wait(&mut self, slot_key: &str) -> Result<Option<i32>> {
        let process = self
            .slots
            .get_mut(slot_key)
            .and_then(ProcessSlot::process_mut)
            .ok_or_else(|| anyhow!("slot '{slot_key}' has no process"))?;
        process.wait().await
    }

    /// Stop every live process, best effort.
    pub async fn shutdown(&mut self) {
        let raw_terminal_override = self.raw_terminal_override;
        for slot in self.slots.iter_mut() {
            if !slot.has_live_process() {
                continue;
            }
            let requested = slot.last_mode().unwrap_or(RunMode::CapturedLog);
            let mode = if raw_terminal_override {
                RunMode::RawTerminalExperimental
            } else {
                requested
            };
            let grace = self
                .backends
                .get(&mode)
                .map_or(Duration::from_secs(1), |backend| backend.grace_period());
            let key = slot.key().to_string();
            if let Some(process) = slot.process_mut() {
                stop_process(&key, process, grace).await;
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .field("slots", &self.slots)
            .field("raw_terminal_override", &self.raw_terminal_override)
            .finish_non_exhaustive()
    }
}

/// Interrupt, wait up to `grace`, then force-terminate if still alive.
/// Errors are logged and otherwise ignored.
async fn stop_process(slot_key: &str, process: &mut dyn ProcessHandle, grace: Duration) {
    let pid = process.pid();
    if let Err(error) = process.interrupt() {
        debug!(slot_key = %slot_key, pid = ?pid, error = %error, "interrupt failed");
    }

    let deadline = Instant::now() + grace;
    while process.is_alive() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        sleep(LIVENESS_POLL_INTERVAL.min(deadline - now)).await;
    }

    if process.is_alive() {
        debug!(slot_key = %slot_key, pid = ?pid, "grace period elapsed; terminating");
        if let Err(error) = process.terminate().await {
            debug!(slot_key = %slot_key, pid = ?pid, error = %error, "terminate failed");
        }
    }

    // Reap and let output forwarding finish before the surface is reset.
    match timeout(REAP_TIMEOUT, process.wait()).await {
        Ok(Ok(code)) => debug!(slot_key = %slot_key, pid = ?pid, code = ?code, "process stopped"),
        Ok(Err(error)) => debug!(slot_key = %slot_key, pid = ?pid, error = %error, "reap failed"),
        Err(_) => debug!(slot_key = %slot_key, pid = ?pid, "reap timed out"),
    }
}
