use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use quay_engine::{PickerCandidate, PickerGroup, picker::flatten_candidates};
use quay_util::rank_labels;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerAction {
    Continue,
    Select { edit: bool },
    Cancel,
}

/// Query, filtered view and cursor of the fuzzy list.
#[derive(Debug, Clone)]
pub struct FuzzyPickerState {
    candidates: Vec<PickerCandidate>,
    query: String,
    filtered: Vec<usize>,
    selected: usize,
}

impl FuzzyPickerState {
    pub fn new(groups: &[PickerGroup]) -> Self {
        let candidates: Vec<_> = flatten_candidates(groups).cloned().collect();
        let filtered = (0..candidates.len()).collect();
        Self {
            candidates,
            query: String::new(),
            filtered,
            selected: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn total(&self) -> usize {
        self.candidates.len()
    }

    /// Candidates matching the query, best first.
    pub fn visible(&self) -> impl Iterator<Item = &PickerCandidate> {
        self.filtered.iter().map(|index| &self.candidates[*index])
    }

    pub fn visible_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn current(&self) -> Option<&PickerCandidate> {
        self.filtered.get(self.selected).map(|index| &self.candidates[*index])
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PickerAction {
        if key.kind == KeyEventKind::Release {
            return PickerAction::Continue;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Esc => PickerAction::Cancel,
            KeyCode::Char('c') if ctrl => PickerAction::Cancel,
            KeyCode::Enter => self.select(alt),
            KeyCode::Char('e') if ctrl => self.select(true),
            KeyCode::Up => {
                self.move_up();
                PickerAction::Continue
            }
            KeyCode::Char('p') if ctrl => {
                self.move_up();
                PickerAction::Continue
            }
            KeyCode::Down => {
                self.move_down();
                PickerAction::Continue
            }
            KeyCode::Char('n') if ctrl => {
                self.move_down();
                PickerAction::Continue
            }
            KeyCode::Char('u') if ctrl => {
                self.query.clear();
                self.refilter();
                PickerAction::Continue
            }
            KeyCode::Backspace => {
                if self.query.pop().is_some() {
                    self.refilter();
                }
                PickerAction::Continue
            }
            KeyCode::Char(character) if !ctrl && !alt => {
                self.query.push(character);
                self.refilter();
                PickerAction::Continue
            }
            _ => PickerAction::Continue,
        }
    }

    fn select(&self, edit: bool) -> PickerAction {
        if self.current().is_some() {
            PickerAction::Select { edit }
        } else {
            PickerAction::Continue
        }
    }

    fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn move_down(&mut self) {
        if self.selected + 1 < self.filtered.len() {
            self.selected += 1;
        }
    }

    fn refilter(&mut self) {
        let labels: Vec<&str> = self.candidates.iter().map(|candidate| candidate.label.as_str()).collect();
        self.filtered = rank_labels(&labels, &self.query);
        self.selected = 0;
    }
}
