//! Full-screen fuzzy picker drawn with ratatui.
//!
//! The picker owns the terminal for the duration of one selection: raw mode
//! and the alternate screen are entered on open and always restored, even
//! when drawing or reading input fails.

mod state;

use std::io::{self, IsTerminal, Stdout};

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use quay_engine::{Picker, PickerGroup, Selection};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Layout},
    prelude::CrosstermBackend,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tracing::warn;

pub use state::{FuzzyPickerState, PickerAction};

use crate::theme;

pub const FUZZY_PICKER_ID: &str = "fuzzy";

const HINTS: &str = "enter run · alt-enter/ctrl-e edit · esc cancel";

#[derive(Debug, Default)]
pub struct FuzzyPicker;

impl FuzzyPicker {
    pub fn new() -> Self {
        Self
    }
}

impl Picker for FuzzyPicker {
    fn id(&self) -> &str {
        FUZZY_PICKER_ID
    }

    fn is_available(&self) -> bool {
        io::stdin().is_terminal() && io::stdout().is_terminal()
    }

    fn select(&self, groups: &[PickerGroup]) -> Result<Selection> {
        let mut state = FuzzyPickerState::new(groups);
        let mut terminal = setup_terminal()?;
        let result = run_picker(&mut terminal, &mut state);
        if let Err(error) = cleanup_terminal(&mut terminal) {
            warn!(error = %error, "failed to restore terminal after picking");
        }

        Ok(match result? {
            PickerAction::Select { edit } => match state.current() {
                Some(candidate) => Selection::Picked {
                    spec: candidate.spec.clone(),
                    edit,
                },
                None => Selection::Cancelled,
            },
            PickerAction::Cancel | PickerAction::Continue => Selection::Cancelled,
        })
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(error) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(error.into());
    }
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Draw and read keys until the state reports a selection or cancellation.
fn run_picker(terminal: &mut Terminal<CrosstermBackend<Stdout>>, state: &mut FuzzyPickerState) -> Result<PickerAction> {
    loop {
        terminal.draw(|frame| draw(frame, state))?;
        if let Event::Key(key) = event::read()? {
            match state.handle_key(key) {
                PickerAction::Continue => {}
                action => return Ok(action),
            }
        }
    }
}

fn draw(frame: &mut Frame, state: &FuzzyPickerState) {
    let [input_area, list_area, hint_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    let input = Paragraph::new(Line::from(vec![
        Span::styled("> ", theme::list_highlight_style()),
        Span::styled(state.query(), theme::text_style()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border_style(true))
            .title(Span::styled(
                format!(" Commands {}/{} ", state.visible_len(), state.total()),
                theme::title_style(),
            )),
    );
    frame.render_widget(input, input_area);
    frame.set_cursor_position((
        input_area.x + 3 + unicode_width::UnicodeWidthStr::width(state.query()) as u16,
        input_area.y + 1,
    ));

    let items: Vec<ListItem> = state
        .visible()
        .map(|candidate| {
            let (provider, display) = candidate.label.split_once('/').unwrap_or(("", candidate.label.as_str()));
            ListItem::new(Line::from(vec![
                Span::styled(format!("{provider}/"), theme::text_muted()),
                Span::styled(display.to_string(), theme::text_style()),
            ]))
        })
        .collect();
    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled("no matching commands", theme::text_muted()))])
    } else {
        List::new(items)
            .highlight_style(theme::list_highlight_style())
            .highlight_symbol("► ")
    };
    let mut list_state = ListState::default();
    if state.visible_len() > 0 {
        list_state.select(Some(state.selected_index()));
    }
    frame.render_stateful_widget(
        list.block(Block::default().borders(Borders::NONE)),
        list_area,
        &mut list_state,
    );

    frame.render_widget(Paragraph::new(Span::styled(HINTS, theme::text_muted())), hint_area);
}
