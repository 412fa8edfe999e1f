//! Picker implementations for the terminal front end.
//!
//! - [`prompt::PromptPicker`]: prefix completion on a plain line, always available
//! - [`menu::MenuPicker`]: numbered menu, needs an interactive stdin
//! - [`fuzzy::FuzzyPicker`]: full-screen incremental filter, needs a terminal on both ends

pub mod fuzzy;
pub mod menu;
pub mod prompt;

#[cfg(test)]
pub(crate) fn test_groups() -> Vec<quay_engine::PickerGroup> {
    use quay_engine::{PickerGroup, RecipeGroup};
    use quay_types::{CommandSpecDraft, NormalizeContext};

    let context = NormalizeContext::new("/proj", None);
    let make = RecipeGroup {
        label: "make".to_string(),
        specs: vec![
            CommandSpecDraft::new("build", "make build").normalize(&context).unwrap(),
            CommandSpecDraft::new("test", "make test").normalize(&context).unwrap(),
        ],
    };
    let npm = RecipeGroup {
        label: "npm".to_string(),
        specs: vec![
            CommandSpecDraft::new("npm-dev", "npm run dev")
                .with_display("npm run dev")
                .normalize(&context)
                .unwrap(),
        ],
    };
    vec![PickerGroup::from_recipe_group(&make), PickerGroup::from_recipe_group(&npm)]
}
