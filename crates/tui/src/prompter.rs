//! Terminal implementation of the engine's `Prompter`.

use quay_engine::Prompter;
use tracing::warn;

use crate::console::LineConsole;

/// Asks questions on a line console.
///
/// Edits work on a pre-filled line: typed text is appended to the initial
/// text, a line starting with `=` replaces it, and an empty line declines.
#[derive(Debug)]
pub struct TerminalPrompter {
    console: LineConsole,
}

impl TerminalPrompter {
    pub fn new(console: LineConsole) -> Self {
        Self { console }
    }

    pub fn stdio() -> Self {
        Self::new(LineConsole::stdio())
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> bool {
        match self.console.ask(&format!("{message} [y/N] ")) {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(None) => false,
            Err(error) => {
                warn!(error = %error, "failed to read confirmation");
                false
            }
        }
    }

    fn edit(&self, prompt: &str, initial: &str) -> Option<String> {
        match self.console.ask(&format!("{prompt}{initial}")) {
            Ok(Some(typed)) if typed.is_empty() => None,
            Ok(Some(typed)) => Some(match typed.strip_prefix('=') {
                Some(replacement) => replacement.to_string(),
                None => format!("{initial}{typed}"),
            }),
            Ok(None) => None,
            Err(error) => {
                warn!(error = %error, "failed to read edited command line");
                None
            }
        }
    }
}
