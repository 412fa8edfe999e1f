//! Pick-and-run entry point.
//!
//! Validation happens in a fixed order before any provider is called:
//! recipes configured, completion method, run mode, experiments.

use std::sync::Arc;

use anyhow::{Context, Result};
use quay_types::{CommandSpec, CompletionMethod, NormalizeContext, RunMode, ValidationError};
use tracing::{debug, info};

use crate::{
    config::QuayConfig,
    error::{ConfigurationError, RecipeError},
    executor::{Executor, RunOutcome},
    experiment::{EnabledExperiments, ExperimentGate, ExperimentRegistry, ExperimentSession},
    picker::{PickerGroup, PickerRegistry, Selection, picker_groups},
    prompt::Prompter,
    recipe::{RecipeCatalog, RecipeEngine, ResolvedRecipes},
};

/// Prompt shown when a selection carries the edit modifier.
pub const EDIT_PROMPT: &str = "Command: ";

/// Settings validated for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub completion_method: CompletionMethod,
    pub run_mode: RunMode,
    pub experiments: EnabledExperiments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Ran(RunOutcome),
    Cancelled,
    /// Every provider came back empty or failed.
    NoCandidates,
}

/// What happened during one pick-and-run, plus the providers that were skipped.
#[derive(Debug)]
pub struct PickReport {
    pub outcome: PickOutcome,
    pub failures: Vec<RecipeError>,
}

/// Owns everything one front end needs to pick and run commands.
pub struct Launcher {
    config: QuayConfig,
    registry: ExperimentRegistry,
    session: ExperimentSession,
    catalog: RecipeCatalog,
    pickers: PickerRegistry,
    prompter: Arc<dyn Prompter>,
    executor: Executor,
    context: NormalizeContext,
}

impl Launcher {
    /// Launcher with the built-in recipe catalog bound to the context's directory.
    pub fn new(
        config: QuayConfig,
        context: NormalizeContext,
        pickers: PickerRegistry,
        prompter: Arc<dyn Prompter>,
        executor: Executor,
    ) -> Self {
        let catalog = RecipeCatalog::with_builtins(context.current_dir());
        Self {
            config,
            registry: ExperimentRegistry::builtin(),
            session: ExperimentSession::new(),
            catalog,
            pickers,
            prompter,
            executor,
            context,
        }
    }

    pub fn with_catalog(mut self, catalog: RecipeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_registry(mut self, registry: ExperimentRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &QuayConfig {
        &self.config
    }

    pub fn context(&self) -> &NormalizeContext {
        &self.context
    }

    pub fn session(&self) -> &ExperimentSession {
        &self.session
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut Executor {
        &mut self.executor
    }

    /// Validate configuration and experiments. Nothing is resolved yet.
    pub fn prepare(&mut self) -> Result<Prepared, ConfigurationError> {
        if self.config.recipes.is_empty() {
            return Err(ConfigurationError::NoRecipes);
        }
        let completion_method = self.config.completion_method()?;
        let run_mode = self.config.run_mode()?;
        let experiments =
            ExperimentGate::new(&self.registry).check(&self.config.experiments, &mut self.session, self.prompter.as_ref())?;
        self.executor.apply_experiments(&experiments);
        debug!(method = %completion_method, mode = %run_mode, "configuration validated");
        Ok(Prepared {
            completion_method,
            run_mode,
            experiments,
        })
    }

    /// Resolve every configured provider in order.
    pub fn resolve(&self, prepared: &Prepared) -> Result<ResolvedRecipes, ConfigurationError> {
        let providers = self.catalog.providers_for(&self.config.recipes);
        RecipeEngine::new(&self.context, &self.config.static_recipes, &prepared.experiments).resolve_all(&providers)
    }

    /// [`Launcher::prepare`] followed by [`Launcher::resolve`].
    pub fn candidates(&mut self) -> Result<(Prepared, Vec<PickerGroup>, Vec<RecipeError>), ConfigurationError> {
        let prepared = self.prepare()?;
        let resolved = self.resolve(&prepared)?;
        Ok((prepared, picker_groups(&resolved.groups), resolved.failures))
    }

    /// Validate, resolve, let the user pick, then run the selection.
    pub async fn pick_and_run(&mut self) -> Result<PickReport> {
        let (prepared, groups, failures) = self.candidates()?;
        if groups.is_empty() {
            info!(failures = failures.len(), "no candidates to pick from");
            return Ok(PickReport {
                outcome: PickOutcome::NoCandidates,
                failures,
            });
        }

        let picker = self
            .pickers
            .choose(prepared.completion_method, &self.config.picker_priority);
        let selection = picker
            .select(&groups)
            .with_context(|| format!("picker '{}' failed", picker.id()))?;

        let outcome = match selection {
            Selection::Cancelled => {
                info!(picker = %picker.id(), "selection cancelled");
                PickOutcome::Cancelled
            }
            Selection::Picked { spec, edit } => {
                let spec = if edit { self.edit_command_line(spec)? } else { spec };
                PickOutcome::Ran(self.executor.run(spec, prepared.run_mode).await?)
            }
        };
        Ok(PickReport { outcome, failures })
    }

    /// Offer the command line for editing, pre-filled with a trailing space.
    /// Declining keeps the original text.
    fn edit_command_line(&self, spec: CommandSpec) -> Result<CommandSpec, ValidationError> {
        let initial = format!("{} ", spec.command_line());
        match self.prompter.edit(EDIT_PROMPT, &initial) {
            Some(edited) => spec.with_command_line(edited),
            None => Ok(spec),
        }
    }
}

impl std::fmt::Debug for Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launcher")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("pickers", &self.pickers)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
