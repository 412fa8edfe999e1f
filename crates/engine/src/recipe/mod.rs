//! Recipe resolution: turning configured providers into ordered,
//! normalized command specs.
//!
//! Modules:
//! - `builtin`: context-sensitive providers (project file, cargo, make, npm)
//! - `catalog`: maps configured identifiers to providers

mod builtin;
mod catalog;

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use quay_types::{CommandSpec, CommandSpecDraft, NormalizeContext};
use tracing::{debug, info, warn};

pub use builtin::{PROJECT_FILE_NAMES, cargo_recipes, make_recipes, npm_recipes, project_recipes};
pub use catalog::RecipeCatalog;

use crate::{
    error::{ConfigurationError, RecipeError},
    experiment::EnabledExperiments,
};

/// Zero-argument function producing drafts.
pub type RecipeFn = Arc<dyn Fn() -> anyhow::Result<Vec<CommandSpecDraft>> + Send + Sync>;

/// A source of command drafts.
#[derive(Clone)]
pub enum RecipeProvider {
    /// Called with no arguments at resolution time.
    Invocable { label: String, recipe: RecipeFn },
    /// A pre-built table from configuration, looked up by identifier.
    NamedTable(String),
}

impl RecipeProvider {
    pub fn invocable<F>(label: impl Into<String>, recipe: F) -> Self
    where
        F: Fn() -> anyhow::Result<Vec<CommandSpecDraft>> + Send + Sync + 'static,
    {
        RecipeProvider::Invocable {
            label: label.into(),
            recipe: Arc::new(recipe),
        }
    }

    /// Label used for picker grouping and diagnostics.
    pub fn label(&self) -> &str {
        match self {
            RecipeProvider::Invocable { label, .. } => label,
            RecipeProvider::NamedTable(identifier) => identifier,
        }
    }
}

impl fmt::Debug for RecipeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeProvider::Invocable { label, .. } => f.debug_struct("Invocable").field("label", label).finish_non_exhaustive(),
            RecipeProvider::NamedTable(identifier) => f.debug_tuple("NamedTable").field(identifier).finish(),
        }
    }
}

/// Normalized output of one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeGroup {
    pub label: String,
    pub specs: Vec<CommandSpec>,
}

/// Output of resolving every configured provider.
///
/// Providers that failed individually are reported in `failures`; the
/// remaining providers still contribute groups.
#[derive(Debug, Default)]
pub struct ResolvedRecipes {
    pub groups: Vec<RecipeGroup>,
    pub failures: Vec<RecipeError>,
}

impl ResolvedRecipes {
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|group| group.specs.is_empty())
    }

    pub fn spec_count(&self) -> usize {
        self.groups.iter().map(|group| group.specs.len()).sum()
    }
}

/// Resolves providers into command specs.
#[derive(Debug)]
pub struct RecipeEngine<'a> {
    context: &'a NormalizeContext,
    static_tables: &'a IndexMap<String, Vec<CommandSpecDraft>>,
    static_recipes_enabled: bool,
}

impl<'a> RecipeEngine<'a> {
    pub fn new(
        context: &'a NormalizeContext,
        static_tables: &'a IndexMap<String, Vec<CommandSpecDraft>>,
        experiments: &EnabledExperiments,
    ) -> Self {
        Self {
            context,
            static_tables,
            static_recipes_enabled: experiments.static_recipes(),
        }
    }

    /// Resolve one provider.
    ///
    /// Drafts without a `command-line` are dropped silently. Any remaining
    /// draft that fails normalization aborts this provider with a
    /// validation error carrying the raw draft.
    pub fn resolve(&self, provider: &RecipeProvider) -> Result<Vec<CommandSpec>, RecipeError> {
        let label = provider.label();
        let drafts = match provider {
            RecipeProvider::Invocable { recipe, .. } => recipe().map_err(|error| RecipeError::Provider {
                provider: label.to_string(),
                error,
            })?,
            RecipeProvider::NamedTable(identifier) => self.named_table(identifier)?.to_vec(),
        };

        let total = drafts.len();
        let specs = drafts
            .iter()
            .filter(|draft| {
                let keep = !draft.lacks_command_line();
                if !keep {
                    debug!(provider = %label, draft = %draft.raw_contents(), "dropping draft without command line");
                }
                keep
            })
            .map(|draft| {
                draft.normalize(self.context).map_err(|source| RecipeError::Validation {
                    provider: label.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(provider = %label, drafts = total, specs = specs.len(), "provider resolved");
        Ok(specs)
    }

    /// Resolve providers in order.
    ///
    /// A configuration error stops everything; other failures are logged,
    /// collected, and skipped.
    pub fn resolve_all(&self, providers: &[RecipeProvider]) -> Result<ResolvedRecipes, ConfigurationError> {
        let mut resolved = ResolvedRecipes::default();
        for provider in providers {
            match self.resolve(provider) {
                Ok(specs) => resolved.groups.push(RecipeGroup {
                    label: provider.label().to_string(),
                    specs,
                }),
                Err(RecipeError::Configuration(error)) => return Err(error),
                Err(error) => {
                    warn!(provider = %provider.label(), error = %error, "recipe provider skipped");
                    resolved.failures.push(error);
                }
            }
        }
        info!(
            providers = providers.len(),
            candidates = resolved.spec_count(),
            failures = resolved.failures.len(),
            "recipes resolved"
        );
        Ok(resolved)
    }

    fn named_table(&self, identifier: &str) -> Result<&'a [CommandSpecDraft], ConfigurationError> {
        if !self.static_recipes_enabled {
            return Err(ConfigurationError::InvalidRecipe(identifier.to_string()));
        }
        self.static_tables
            .get(identifier)
            .map(Vec::as_slice)
            .ok_or_else(|| ConfigurationError::InvalidRecipe(identifier.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::{Path, PathBuf},
        sync::atomic::{AtomicUsize, Ordering},
    };

    use quay_types::ValidationError;

    use super::*;
    use crate::experiment::STATIC_RECIPES;

    fn context() -> NormalizeContext {
        NormalizeContext::new("/proj", Some(PathBuf::from("/home/dev")))
    }

    fn fixed(label: &str, drafts: Vec<CommandSpecDraft>) -> RecipeProvider {
        RecipeProvider::invocable(label, move || Ok(drafts.clone()))
    }

    #[test]
    fn invocable_provider_is_normalized_in_order() {
        let context = context();
        let tables = IndexMap::new();
        let engine = RecipeEngine::new(&context, &tables, &EnabledExperiments::default());
        let provider = fixed(
            "local",
            vec![CommandSpecDraft::new("build", "make"), CommandSpecDraft::new("test", "make test")],
        );

        let specs = engine.resolve(&provider).unwrap();
        let names: Vec<_> = specs.iter().map(CommandSpec::name).collect();
        assert_eq!(names, vec!["build", "test"]);
        assert_eq!(specs[0].display(), "build");
        assert_eq!(specs[0].working_dir(), Path::new("/proj"));
        assert_eq!(specs[0].scope_name(), "/proj");
    }

    #[test]
    fn drafts_without_command_line_are_dropped() {
        let context = context();
        let tables = IndexMap::new();
        let engine = RecipeEngine::new(&context, &tables, &EnabledExperiments::default());
        let provider = fixed(
            "local",
            vec![CommandSpecDraft {
                name: Some("t".into()),
                ..CommandSpecDraft::default()
            }],
        );
        assert!(engine.resolve(&provider).unwrap().is_empty());
    }

    #[test]
    fn blank_command_line_fails_only_that_provider() {
        let context = context();
        let tables = IndexMap::new();
        let engine = RecipeEngine::new(&context, &tables, &EnabledExperiments::default());
        let broken = fixed("broken", vec![CommandSpecDraft::new("lint", "")]);
        let healthy = fixed("healthy", vec![CommandSpecDraft::new("build", "make")]);

        let resolved = engine.resolve_all(&[broken, healthy]).unwrap();
        assert_eq!(resolved.groups.len(), 1);
        assert_eq!(resolved.groups[0].label, "healthy");
        assert_eq!(resolved.failures.len(), 1);
        match &resolved.failures[0] {
            RecipeError::Validation { provider, source } => {
                assert_eq!(provider, "broken");
                assert!(matches!(source, ValidationError::MissingCommandLine { .. }));
                assert!(source.draft().contains("\"command-name\":\"lint\""));
            }
            other => panic!("unexpected failure {other:?}"),
        }
    }

    #[test]
    fn provider_errors_are_isolated() {
        let context = context();
        let tables = IndexMap::new();
        let engine = RecipeEngine::new(&context, &tables, &EnabledExperiments::default());
        let failing = RecipeProvider::invocable("failing", || Err(anyhow::anyhow!("unreadable Makefile")));
        let healthy = fixed("healthy", vec![CommandSpecDraft::new("build", "make")]);

        let resolved = engine.resolve_all(&[failing, healthy]).unwrap();
        assert_eq!(resolved.spec_count(), 1);
        assert_eq!(resolved.failures[0].provider(), Some("failing"));
    }

    #[test]
    fn named_table_requires_static_recipes_experiment() {
        let context = context();
        let mut tables = IndexMap::new();
        tables.insert("deploy".to_string(), vec![CommandSpecDraft::new("ship", "./deploy.sh")]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let later = RecipeProvider::invocable("later", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        });

        let gated = RecipeEngine::new(&context, &tables, &EnabledExperiments::default());
        let error = gated
            .resolve_all(&[RecipeProvider::NamedTable("deploy".into()), later])
            .unwrap_err();
        assert_eq!(error.to_string(), "invalid recipe 'deploy'");
        assert_eq!(calls.load(Ordering::SeqCst), 0, "resolution stops at the configuration error");

        let enabled = EnabledExperiments::from_names([STATIC_RECIPES]);
        let open = RecipeEngine::new(&context, &tables, &enabled);
        let specs = open.resolve(&RecipeProvider::NamedTable("deploy".into())).unwrap();
        assert_eq!(specs[0].command_line(), "./deploy.sh");
        assert!(matches!(
            open.resolve(&RecipeProvider::NamedTable("missing".into())),
            Err(RecipeError::Configuration(ConfigurationError::InvalidRecipe(_)))
        ));
    }
}
