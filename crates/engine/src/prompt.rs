//! Blocking user prompts consumed by the engine.
//!
//! The executor asks before killing a live process, the entry point offers
//! to edit a selected command line, and the experiment gate offers to hide
//! deprecation warnings. Front ends supply the implementation.

use std::{collections::VecDeque, sync::Mutex};

/// Source of yes/no answers and line edits.
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question. Any failure to read an answer counts as "no".
    fn confirm(&self, message: &str) -> bool;

    /// Offer `initial` for editing. `None` means the user declined the edit.
    fn edit(&self, prompt: &str, initial: &str) -> Option<String>;
}

/// Prompter that replays pre-recorded answers and records every question.
///
/// Used by tests and by non-interactive callers; once the script runs out,
/// confirmations answer "no" and edits are declined.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    confirmations: Mutex<VecDeque<bool>>,
    edits: Mutex<VecDeque<Option<String>>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue answers for successive `confirm` calls.
    pub fn with_confirmations(self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.confirmations.lock().expect("prompter lock poisoned").extend(answers);
        self
    }

    /// Queue results for successive `edit` calls.
    pub fn with_edits(self, edits: impl IntoIterator<Item = Option<String>>) -> Self {
        self.edits.lock().expect("prompter lock poisoned").extend(edits);
        self
    }

    /// Every prompt shown so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("prompter lock poisoned").clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str) -> bool {
        self.asked.lock().expect("prompter lock poisoned").push(message.to_string());
        self.confirmations
            .lock()
            .expect("prompter lock poisoned")
            .pop_front()
            .unwrap_or(false)
    }

    fn edit(&self, prompt: &str, initial: &str) -> Option<String> {
        self.asked
            .lock()
            .expect("prompter lock poisoned")
            .push(format!("{prompt}{initial}"));
        self.edits.lock().expect("prompter lock poisoned").pop_front().flatten()
    }
}
