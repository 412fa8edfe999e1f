//! # Quay Terminal Front End
//!
//! Terminal implementations of the engine's seams: pickers that present the
//! recipe catalog, a prompter for kill confirmation and command editing, and
//! execution backends that run commands on the controlling terminal.
//!
//! ## Pickers
//!
//! - `fuzzy`: full-screen incremental filter (ratatui)
//! - `menu`: numbered menu read as a line
//! - `prompt`: prefix completion; the registry fallback
//!
//! [`default_picker_registry`] registers all three, so the `auto` completion
//! method can walk the configured priority list.

pub mod backend;
mod console;
pub mod picker;
pub mod prompter;
pub mod theme;

use std::sync::Arc;

use quay_engine::PickerRegistry;

pub use backend::{InteractiveTerminalBackend, RawTerminalBackend};
pub use console::LineConsole;
pub use picker::{
    fuzzy::{FUZZY_PICKER_ID, FuzzyPicker},
    menu::{MENU_PICKER_ID, MenuPicker},
    prompt::{PROMPT_PICKER_ID, PromptPicker},
};
pub use prompter::TerminalPrompter;

/// Pickers on stdio with the prompt picker as fallback.
pub fn default_picker_registry() -> PickerRegistry {
    let mut registry = PickerRegistry::new(Arc::new(PromptPicker::stdio()));
    registry
        .register(Arc::new(FuzzyPicker::new()))
        .register(Arc::new(MenuPicker::stdio()));
    registry
}
