//! Process slots keyed by `name[scope]`.

use std::fmt;

use indexmap::IndexMap;
use quay_types::{CommandSpec, RunMode};
use serde::Serialize;

use super::process::ProcessHandle;

/// Observable state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotState {
    /// No process attached.
    Empty,
    Running,
    /// The last process exited on its own; its output is still on the surface.
    IdleWithOutput,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            SlotState::Empty => "empty",
            SlotState::Running => "running",
            SlotState::IdleWithOutput => "idle",
        })
    }
}

/// Reusable execution target for one command identity.
#[derive(Debug)]
pub struct ProcessSlot {
    key: String,
    surface: String,
    process: Option<Box<dyn ProcessHandle>>,
    last_spec: Option<CommandSpec>,
    last_mode: Option<RunMode>,
}

impl ProcessSlot {
    fn new(key: String, surface: String) -> Self {
        Self {
            key,
            surface,
            process: None,
            last_spec: None,
            last_mode: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Output surface identity.
    pub fn surface(&self) -> &str {
        &self.surface
    }

    pub fn last_spec(&self) -> Option<&CommandSpec> {
        self.last_spec.as_ref()
    }

    /// Mode requested for the last run, before any experiment override.
    pub fn last_mode(&self) -> Option<RunMode> {
        self.last_mode
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|process| process.pid())
    }

    pub fn state(&mut self) -> SlotState {
        match self.process.as_mut() {
            None => SlotState::Empty,
            Some(process) => {
                if process.is_alive() {
                    SlotState::Running
                } else {
                    SlotState::IdleWithOutput
                }
            }
        }
    }

    pub fn has_live_process(&mut self) -> bool {
        self.state() == SlotState::Running
    }

    pub(crate) fn process_mut(&mut self) -> Option<&mut (dyn ProcessHandle + 'static)> {
        self.process.as_deref_mut()
    }

    /// Detach the current process; the slot becomes [`SlotState::Empty`].
    pub(crate) fn take_process(&mut self) -> Option<Box<dyn ProcessHandle>> {
        self.process.take()
    }

    pub(crate) fn set_surface(&mut self, surface: String) {
        self.surface = surface;
    }

    pub(crate) fn record_run(&mut self, spec: CommandSpec, mode: RunMode, process: Box<dyn ProcessHandle>) {
        self.last_spec = Some(spec);
        self.last_mode = Some(mode);
        self.process = Some(process);
    }
}

/// One row of [`SlotRegistry::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub key: String,
    pub state: SlotState,
    pub display: Option<String>,
    pub pid: Option<u32>,
}

/// Slots in creation order. Slots are never removed.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    slots: IndexMap<String, ProcessSlot>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `key`, created on first use.
    pub fn entry(&mut self, key: &str, surface: impl FnOnce() -> String) -> &mut ProcessSlot {
        self.slots
            .entry(key.to_string())
            .or_insert_with(|| ProcessSlot::new(key.to_string(), surface()))
    }

    pub fn get(&self, key: &str) -> Option<&ProcessSlot> {
        self.slots.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ProcessSlot> {
        self.slots.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Most recently created slot.
    pub fn last_key(&self) -> Option<&str> {
        self.slots.keys().last().map(String::as_str)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProcessSlot> {
        self.slots.values_mut()
    }

    pub fn snapshot(&mut self) -> Vec<SlotSummary> {
        self.slots
            .values_mut()
            .map(|slot| SlotSummary {
                key: slot.key.clone(),
                state: slot.state(),
                display: slot.last_spec.as_ref().map(|spec| spec.display().to_string()),
                pid: slot.pid(),
            })
            .collect()
    }
}
