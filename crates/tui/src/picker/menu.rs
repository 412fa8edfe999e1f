//! Numbered menu picker.

use std::io::{self, IsTerminal};

use quay_engine::{Picker, PickerGroup, Selection, picker::flatten_candidates};

use crate::console::LineConsole;

pub const MENU_PICKER_ID: &str = "menu";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Zero-based candidate index.
    Pick { index: usize, edit: bool },
    Cancel,
}

/// Candidates numbered from 1 under their provider headings.
pub fn render_menu(groups: &[PickerGroup]) -> String {
    let mut text = String::new();
    let mut number = 1;
    for group in groups {
        text.push_str(&group.provider_label);
        text.push('\n');
        for candidate in &group.candidates {
            text.push_str(&format!("{number:>4}) {}\n", candidate.label));
            number += 1;
        }
    }
    text
}

/// Parse `N` or `N e`; an empty line cancels.
pub fn parse_menu_choice(input: &str, count: usize) -> Result<MenuChoice, String> {
    let mut parts = input.split_whitespace();
    let Some(number) = parts.next() else {
        return Ok(MenuChoice::Cancel);
    };
    let edit = match parts.next() {
        None => false,
        Some("e") | Some("edit") => true,
        Some(other) => return Err(format!("unexpected '{other}'; use N or N e")),
    };
    if parts.next().is_some() {
        return Err("too many words; use N or N e".to_string());
    }
    let number: usize = number.parse().map_err(|_| format!("'{number}' is not a number"))?;
    if number == 0 || number > count {
        return Err(format!("choose a number between 1 and {count}"));
    }
    Ok(MenuChoice::Pick { index: number - 1, edit })
}

/// Prints a numbered list and reads the choice as a line.
#[derive(Debug)]
pub struct MenuPicker {
    console: LineConsole,
    require_terminal: bool,
}

impl MenuPicker {
    pub fn new(console: LineConsole) -> Self {
        Self {
            console,
            require_terminal: false,
        }
    }

    /// Menu on stdio, available only when stdin is a terminal.
    pub fn stdio() -> Self {
        Self {
            console: LineConsole::stdio(),
            require_terminal: true,
        }
    }
}

impl Picker for MenuPicker {
    fn id(&self) -> &str {
        MENU_PICKER_ID
    }

    fn is_available(&self) -> bool {
        !self.require_terminal || io::stdin().is_terminal()
    }

    fn select(&self, groups: &[PickerGroup]) -> anyhow::Result<Selection> {
        let candidates: Vec<_> = flatten_candidates(groups).collect();
        self.console.write(&render_menu(groups))?;
        loop {
            let Some(line) = self.console.ask("Select [N, N e to edit, empty to cancel]: ")? else {
                return Ok(Selection::Cancelled);
            };
            match parse_menu_choice(&line, candidates.len()) {
                Ok(MenuChoice::Cancel) => return Ok(Selection::Cancelled),
                Ok(MenuChoice::Pick { index, edit }) => {
                    return Ok(Selection::Picked {
                        spec: candidates[index].spec.clone(),
                        edit,
                    });
                }
                Err(message) => self.console.write(&format!("{message}\n"))?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{console::scripted, picker::test_groups};

    #[test]
    fn menu_numbers_candidates_across_groups() {
        let menu = render_menu(&test_groups());
        assert_eq!(menu, "make\n   1) make/build\n   2) make/test\nnpm\n   3) npm/npm run dev\n");
    }

    #[test]
    fn choices_are_parsed() {
        assert_eq!(parse_menu_choice("2", 3), Ok(MenuChoice::Pick { index: 1, edit: false }));
        assert_eq!(parse_menu_choice(" 3 e ", 3), Ok(MenuChoice::Pick { index: 2, edit: true }));
        assert_eq!(parse_menu_choice("", 3), Ok(MenuChoice::Cancel));
        assert!(parse_menu_choice("4", 3).is_err());
        assert!(parse_menu_choice("0", 3).is_err());
        assert!(parse_menu_choice("two", 3).is_err());
        assert!(parse_menu_choice("1 x", 3).is_err());
    }

    #[test]
    fn invalid_input_is_asked_again() {
        let (console, output) = scripted("9\n3 e\n");
        let selection = MenuPicker::new(console).select(&test_groups()).unwrap();
        match selection {
            Selection::Picked { spec, edit } => {
                assert!(edit);
                assert_eq!(spec.command_line(), "npm run dev");
            }
            Selection::Cancelled => panic!("expected a pick"),
        }
        assert!(output.contents().contains("choose a number between 1 and 3"));
    }

    #[test]
    fn empty_line_or_end_of_input_cancels() {
        let (console, _) = scripted("\n");
        assert_eq!(MenuPicker::new(console).select(&test_groups()).unwrap(), Selection::Cancelled);
        let (console, _) = scripted("");
        assert_eq!(MenuPicker::new(console).select(&test_groups()).unwrap(), Selection::Cancelled);
    }
}
