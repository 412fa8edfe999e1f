//! Picker contract and registry.
//!
//! The engine never draws a selection UI itself. Front ends register
//! implementations of [`Picker`]; the registry chooses one per invocation
//! from the configured completion method, walking a priority list for
//! `auto` and falling back to an always-available implementation.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use quay_types::{CommandSpec, CompletionMethod};
use tracing::debug;

use crate::recipe::RecipeGroup;

/// One selectable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerCandidate {
    /// `provider/display`.
    pub label: String,
    pub spec: CommandSpec,
}

/// Candidates contributed by one provider, in provider order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerGroup {
    pub provider_label: String,
    pub candidates: Vec<PickerCandidate>,
}

impl PickerGroup {
    pub fn from_recipe_group(group: &RecipeGroup) -> Self {
        Self {
            provider_label: group.label.clone(),
            candidates: group
                .specs
                .iter()
                .map(|spec| PickerCandidate {
                    label: candidate_label(&group.label, spec),
                    spec: spec.clone(),
                })
                .collect(),
        }
    }
}

/// Build picker groups, skipping providers that produced nothing.
pub fn picker_groups(groups: &[RecipeGroup]) -> Vec<PickerGroup> {
    groups
        .iter()
        .filter(|group| !group.specs.is_empty())
        .map(PickerGroup::from_recipe_group)
        .collect()
}

/// Conventional display label for a candidate.
pub fn candidate_label(provider_label: &str, spec: &CommandSpec) -> String {
    format!("{provider_label}/{}", spec.display())
}

/// Iterate over every candidate in group order.
pub fn flatten_candidates(groups: &[PickerGroup]) -> impl Iterator<Item = &PickerCandidate> {
    groups.iter().flat_map(|group| group.candidates.iter())
}

/// Result of a picker interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// `edit` is set when the user asked to edit the command line first.
    Picked { spec: CommandSpec, edit: bool },
    Cancelled,
}

impl Selection {
    pub fn picked(spec: CommandSpec) -> Self {
        Selection::Picked { spec, edit: false }
    }

    pub fn picked_for_edit(spec: CommandSpec) -> Self {
        Selection::Picked { spec, edit: true }
    }
}

/// A selection UI.
pub trait Picker: Send + Sync {
    /// Identifier used in configuration (`fuzzy`, `menu`, `prompt`, ...).
    fn id(&self) -> &str;

    /// Whether this picker can run in the current environment.
    fn is_available(&self) -> bool;

    /// Let the user choose one candidate. Errors are reserved for I/O
    /// failures; backing out is [`Selection::Cancelled`].
    fn select(&self, groups: &[PickerGroup]) -> anyhow::Result<Selection>;
}

/// Registered pickers plus a guaranteed fallback.
#[derive(Clone)]
pub struct PickerRegistry {
    pickers: IndexMap<String, Arc<dyn Picker>>,
    fallback: Arc<dyn Picker>,
}

impl PickerRegistry {
    /// `fallback` must work with any line-based input.
    pub fn new(fallback: Arc<dyn Picker>) -> Self {
        let mut pickers: IndexMap<String, Arc<dyn Picker>> = IndexMap::new();
        pickers.insert(fallback.id().to_string(), Arc::clone(&fallback));
        Self { pickers, fallback }
    }

    pub fn register(&mut self, picker: Arc<dyn Picker>) -> &mut Self {
        self.pickers.insert(picker.id().to_string(), picker);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Picker>> {
        self.pickers.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.pickers.keys().map(String::as_str)
    }

    /// Pick the implementation for `method`.
    ///
    /// `auto` takes the first available entry of `priority`; an explicit
    /// method uses that picker when it is registered and available. The
    /// fallback covers every other case.
    pub fn choose(&self, method: CompletionMethod, priority: &[String]) -> Arc<dyn Picker> {
        let chosen = match method {
            CompletionMethod::Auto => priority
                .iter()
                .filter_map(|id| self.pickers.get(id))
                .find(|picker| picker.is_available()),
            explicit => self.pickers.get(explicit.as_str()).filter(|picker| picker.is_available()),
        };
        let picker = chosen.cloned().unwrap_or_else(|| Arc::clone(&self.fallback));
        debug!(method = %method, picker = %picker.id(), "picker chosen");
        picker
    }
}

impl fmt::Debug for PickerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickerRegistry")
            .field("pickers", &self.pickers.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.id())
            .finish()
    }
}

/// Picker that returns a fixed answer. Useful for tests and scripted runs.
#[derive(Debug, Clone)]
pub struct FixedPicker {
    id: String,
    available: bool,
    choice: FixedChoice,
}

#[derive(Debug, Clone)]
enum FixedChoice {
    Label { label: String, edit: bool },
    Cancel,
}

impl FixedPicker {
    /// Select the candidate whose label is `label`.
    pub fn choosing(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            available: true,
            choice: FixedChoice::Label {
                label: label.into(),
                edit: false,
            },
        }
    }

    pub fn cancelling(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            available: true,
            choice: FixedChoice::Cancel,
        }
    }

    pub fn with_edit(mut self) -> Self {
        if let FixedChoice::Label { edit, .. } = &mut self.choice {
            *edit = true;
        }
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl Picker for FixedPicker {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn select(&self, groups: &[PickerGroup]) -> anyhow::Result<Selection> {
        match &self.choice {
            FixedChoice::Cancel => Ok(Selection::Cancelled),
            FixedChoice::Label { label, edit } => {
                let candidate = flatten_candidates(groups)
                    .find(|candidate| &candidate.label == label)
                    .ok_or_else(|| anyhow::anyhow!("no candidate labelled '{label}'"))?;
                Ok(Selection::Picked {
                    spec: candidate.spec.clone(),
                    edit: *edit,
                })
            }
        }
    }
}
