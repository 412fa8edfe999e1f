use std::{path::PathBuf, sync::Arc};

use indexmap::IndexMap;
use quay_types::CommandSpecDraft;

use super::{RecipeFn, RecipeProvider, builtin};

/// Maps configured recipe identifiers to providers.
///
/// Identifiers without a registered function resolve as named tables.
#[derive(Clone, Default)]
pub struct RecipeCatalog {
    recipes: IndexMap<String, RecipeFn>,
}

impl RecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the `project`, `cargo`, `make` and `npm` providers bound to `dir`.
    pub fn with_builtins(dir: impl Into<PathBuf>) -> Self {
        let dir: Arc<PathBuf> = Arc::new(dir.into());
        let mut catalog = Self::new();

        let project_dir = Arc::clone(&dir);
        catalog.register("project", move || builtin::project_recipes(&project_dir));
        let cargo_dir = Arc::clone(&dir);
        catalog.register("cargo", move || builtin::cargo_recipes(&cargo_dir));
        let make_dir = Arc::clone(&dir);
        catalog.register("make", move || builtin::make_recipes(&make_dir));
        catalog.register("npm", move || builtin::npm_recipes(&dir));
        catalog
    }

    /// Register (or replace) the function behind `label`.
    pub fn register<F>(&mut self, label: impl Into<String>, recipe: F) -> &mut Self
    where
        F: Fn() -> anyhow::Result<Vec<CommandSpecDraft>> + Send + Sync + 'static,
    {
        self.recipes.insert(label.into(), Arc::new(recipe));
        self
    }

    pub fn contains(&self, label: &str) -> bool {
        self.recipes.contains_key(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.recipes.keys().map(String::as_str)
    }

    /// Providers for `identifiers`, in configuration order.
    pub fn providers_for(&self, identifiers: &[String]) -> Vec<RecipeProvider> {
        identifiers
            .iter()
            .map(|identifier| match self.recipes.get(identifier) {
                Some(recipe) => RecipeProvider::Invocable {
                    label: identifier.clone(),
                    recipe: Arc::clone(recipe),
                },
                None => RecipeProvider::NamedTable(identifier.clone()),
            })
            .collect()
    }
}

impl std::fmt::Debug for RecipeCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeCatalog")
            .field("recipes", &self.recipes.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_identifiers_become_named_tables() {
        let mut catalog = RecipeCatalog::new();
        catalog.register("local", || Ok(vec![CommandSpecDraft::new("build", "make")]));

        let providers = catalog.providers_for(&["deploy".to_string(), "local".to_string()]);
        assert!(matches!(&providers[0], RecipeProvider::NamedTable(name) if name == "deploy"));
        match &providers[1] {
            RecipeProvider::Invocable { label, recipe } => {
                assert_eq!(label, "local");
                assert_eq!(recipe().unwrap().len(), 1);
            }
            other => panic!("expected invocable provider, got {other:?}"),
        }
    }

    #[test]
    fn builtins_are_registered_in_order() {
        let catalog = RecipeCatalog::with_builtins("/nonexistent");
        assert_eq!(catalog.labels().collect::<Vec<_>>(), vec!["project", "cargo", "make", "npm"]);
        for provider in catalog.providers_for(&["make".to_string()]) {
            if let RecipeProvider::Invocable { recipe, .. } = provider {
                assert!(recipe().unwrap().is_empty());
            }
        }
    }
}
