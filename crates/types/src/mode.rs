//! Configuration enums: how a selected command is executed and how the
//! candidate is picked.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;

/// Execution backend for a run.
///
/// Only `CapturedLog` and `InteractiveTerminal` are user-configurable;
/// `RawTerminalExperimental` is forced by the `raw-terminal` experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunMode {
    CapturedLog,
    InteractiveTerminal,
    RawTerminalExperimental,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::CapturedLog => "capturedLog",
            RunMode::InteractiveTerminal => "interactiveTerminal",
            RunMode::RawTerminalExperimental => "rawTerminalExperimental",
        }
    }

    /// Whether the backend asks before killing a live process in the slot.
    pub fn confirms_kill(&self) -> bool {
        !matches!(self, RunMode::CapturedLog)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = UnknownVariant;

    /// Parses the configurable modes; both `camelCase` and `kebab-case` spellings are accepted.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "capturedLog" | "captured-log" => Ok(RunMode::CapturedLog),
            "interactiveTerminal" | "interactive-terminal" => Ok(RunMode::InteractiveTerminal),
            other => Err(UnknownVariant {
                kind: "run mode",
                value: other.to_string(),
            }),
        }
    }
}

/// How the candidate list is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionMethod {
    /// First available picker from the configured priority list.
    Auto,
    /// Full-screen list with incremental fuzzy filtering.
    Fuzzy,
    /// Numbered menu.
    Menu,
    /// Plain text completion; always available.
    Prompt,
}

impl CompletionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionMethod::Auto => "auto",
            CompletionMethod::Fuzzy => "fuzzy",
            CompletionMethod::Menu => "menu",
            CompletionMethod::Prompt => "prompt",
        }
    }
}

impl fmt::Display for CompletionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionMethod {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "auto" => Ok(CompletionMethod::Auto),
            "fuzzy" => Ok(CompletionMethod::Fuzzy),
            "menu" => Ok(CompletionMethod::Menu),
            "prompt" => Ok(CompletionMethod::Prompt),
            other => Err(UnknownVariant {
                kind: "completion method",
                value: other.to_string(),
            }),
        }
    }
}
