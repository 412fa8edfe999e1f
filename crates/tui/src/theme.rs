//! Colors and styles shared by the fuzzy picker and the terminal backends.

use ratatui::style::{Color, Modifier, Style};

/// Accent for the selection marker, the query prompt and focused borders.
pub const ACCENT: Color = Color::Rgb(8, 171, 237);

pub const FG: Color = Color::Rgb(224, 224, 230);

/// Hints, counters and provider names.
pub const FG_MUTED: Color = Color::Rgb(168, 168, 175);

pub const BORDER: Color = Color::Rgb(72, 72, 80);

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(BORDER)
    }
}

pub fn title_style() -> Style {
    Style::default().fg(FG_MUTED).add_modifier(Modifier::BOLD)
}

pub fn text_style() -> Style {
    Style::default().fg(FG)
}

pub fn text_muted() -> Style {
    Style::default().fg(FG_MUTED)
}

/// Selected list rows: accent and bold, no fill.
pub fn list_highlight_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

/// ANSI-coloured header line written above a command's output on a plain terminal.
pub fn header_line(text: &str) -> String {
    format!("\x1b[1;38;2;8;171;237m{text}\x1b[0m")
}
