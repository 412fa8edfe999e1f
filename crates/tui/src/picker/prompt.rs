//! Plain text completion picker. Works on any line-based input, so it is
//! the registry's fallback.

use quay_engine::{Picker, PickerGroup, Selection, picker::flatten_candidates};

use crate::console::LineConsole;

pub const PROMPT_PICKER_ID: &str = "prompt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResolution {
    Selected { index: usize, edit: bool },
    Cancelled,
    /// More than one label starts with the input.
    Ambiguous(Vec<String>),
    NoMatch,
}

/// Match `input` against `labels`: an exact label wins, otherwise a unique
/// prefix. A leading `!` requests the edit modifier.
pub fn resolve_prompt_input<S: AsRef<str>>(input: &str, labels: &[S]) -> PromptResolution {
    let input = input.trim();
    if input.is_empty() {
        return PromptResolution::Cancelled;
    }
    let (query, edit) = match input.strip_prefix('!') {
        Some(rest) => (rest.trim_start(), true),
        None => (input, false),
    };
    if query.is_empty() {
        return PromptResolution::NoMatch;
    }

    if let Some(index) = labels.iter().position(|label| label.as_ref() == query) {
        return PromptResolution::Selected { index, edit };
    }
    let matches: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| label.as_ref().starts_with(query))
        .map(|(index, _)| index)
        .collect();
    match matches.as_slice() {
        [] => PromptResolution::NoMatch,
        [index] => PromptResolution::Selected { index: *index, edit },
        _ => PromptResolution::Ambiguous(matches.iter().map(|index| labels[*index].as_ref().to_string()).collect()),
    }
}

#[derive(Debug)]
pub struct PromptPicker {
    console: LineConsole,
}

impl PromptPicker {
    pub fn new(console: LineConsole) -> Self {
        Self { console }
    }

    pub fn stdio() -> Self {
        Self::new(LineConsole::stdio())
    }
}

impl Picker for PromptPicker {
    fn id(&self) -> &str {
        PROMPT_PICKER_ID
    }

    fn is_available(&self) -> bool {
        true
    }

    fn select(&self, groups: &[PickerGroup]) -> anyhow::Result<Selection> {
        let candidates: Vec<_> = flatten_candidates(groups).collect();
        let labels: Vec<&str> = candidates.iter().map(|candidate| candidate.label.as_str()).collect();
        self.console.write(&format!("{}\n", labels.join("\n")))?;

        loop {
            let Some(line) = self.console.ask("Command (!label to edit, empty to cancel): ")? else {
                return Ok(Selection::Cancelled);
            };
            match resolve_prompt_input(&line, &labels) {
                PromptResolution::Selected { index, edit } => {
                    return Ok(Selection::Picked {
                        spec: candidates[index].spec.clone(),
                        edit,
                    });
                }
                PromptResolution::Cancelled => return Ok(Selection::Cancelled),
                PromptResolution::Ambiguous(options) => {
                    self.console.write(&format!("ambiguous: {}\n", options.join(", ")))?;
                }
                PromptResolution::NoMatch => self.console.write(&format!("no command matches '{}'\n", line.trim()))?,
            }
        }
    }
}
