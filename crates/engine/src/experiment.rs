//! Feature-flag gating.
//!
//! Experiments are validated against a fixed registry before any recipe is
//! resolved. Retired and unknown names are configuration errors; deprecated
//! names are allowed but warned about once per session unless the user
//! hides the warnings.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::{error::ConfigurationError, prompt::Prompter};

/// Forces the raw-terminal backend for every run.
pub const RAW_TERMINAL: &str = "raw-terminal";
/// Enables named-value recipe tables from the configuration file.
pub const STATIC_RECIPES: &str = "static-recipes";
/// Placeholder for an experiment whose behavior has been removed.
pub const EXAMPLE_RETIRED: &str = "example-retired";

/// Lifecycle status of an experiment name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExperimentStatus {
    Active,
    Deprecated,
    Retired,
    /// Not present in the registry.
    Unknown,
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExperimentStatus::Active => "active",
            ExperimentStatus::Deprecated => "deprecated",
            ExperimentStatus::Retired => "retired",
            ExperimentStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Fixed mapping of experiment names to their status.
#[derive(Debug, Clone)]
pub struct ExperimentRegistry {
    entries: IndexMap<String, ExperimentStatus>,
}

impl ExperimentRegistry {
    /// The experiments this build knows about.
    pub fn builtin() -> Self {
        Self::from_entries([
            (RAW_TERMINAL, ExperimentStatus::Active),
            (STATIC_RECIPES, ExperimentStatus::Deprecated),
            (EXAMPLE_RETIRED, ExperimentStatus::Retired),
        ])
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ExperimentStatus)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(name, status)| (name.into(), status)).collect(),
        }
    }

    pub fn status(&self, name: &str) -> ExperimentStatus {
        self.entries.get(name).copied().unwrap_or(ExperimentStatus::Unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ExperimentStatus)> {
        self.entries.iter().map(|(name, status)| (name.as_str(), *status))
    }
}

impl Default for ExperimentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Process-lifetime state owned by the gate's caller.
///
/// Constructed once at startup; nothing resets it afterwards.
#[derive(Debug, Default)]
pub struct ExperimentSession {
    deprecation_warnings_suppressed: bool,
}

impl ExperimentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deprecation_warnings_suppressed(&self) -> bool {
        self.deprecation_warnings_suppressed
    }

    pub fn suppress_deprecation_warnings(&mut self) {
        self.deprecation_warnings_suppressed = true;
    }
}

/// Experiments that passed the gate for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledExperiments {
    names: IndexSet<String>,
}

impl EnabledExperiments {
    /// Build an enabled set directly, bypassing the gate.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn raw_terminal(&self) -> bool {
        self.is_enabled(RAW_TERMINAL)
    }

    pub fn static_recipes(&self) -> bool {
        self.is_enabled(STATIC_RECIPES)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Validates configured experiment names against a registry.
#[derive(Debug, Clone, Copy)]
pub struct ExperimentGate<'a> {
    registry: &'a ExperimentRegistry,
}

impl<'a> ExperimentGate<'a> {
    pub fn new(registry: &'a ExperimentRegistry) -> Self {
        Self { registry }
    }

    /// Check `configured` and return the enabled set.
    ///
    /// Every name is checked for `retired`/`unknown` before any deprecation
    /// warning is shown, so a bad configuration fails without prompting.
    /// The first offending name in configuration order is reported.
    pub fn check(
        &self,
        configured: &[String],
        session: &mut ExperimentSession,
        prompter: &dyn Prompter,
    ) -> Result<EnabledExperiments, ConfigurationError> {
        for name in configured {
            match self.registry.status(name) {
                ExperimentStatus::Retired => return Err(ConfigurationError::RetiredExperiment(name.clone())),
                ExperimentStatus::Unknown => return Err(ConfigurationError::UnknownExperiment(name.clone())),
                ExperimentStatus::Active | ExperimentStatus::Deprecated => {}
            }
        }

        let mut enabled = EnabledExperiments::default();
        for name in configured {
            if self.registry.status(name) == ExperimentStatus::Deprecated {
                warn_deprecated(name, session, prompter);
            }
            enabled.names.insert(name.clone());
        }
        debug!(experiments = ?enabled.names, "experiments enabled");
        Ok(enabled)
    }
}

fn warn_deprecated(name: &str, session: &mut ExperimentSession, prompter: &dyn Prompter) {
    warn!(experiment = %name, "experiment is deprecated and will be retired");
    if session.deprecation_warnings_suppressed() {
        return;
    }
    let message = format!("Experiment '{name}' is deprecated. Hide deprecation warnings for this session?");
    if prompter.confirm(&message) {
        session.suppress_deprecation_warnings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn retired_experiment_fails_even_with_valid_ones() {
        let registry = ExperimentRegistry::builtin();
        let prompter = ScriptedPrompter::new();
        let mut session = ExperimentSession::new();
        let result = ExperimentGate::new(&registry).check(
            &names(&[RAW_TERMINAL, STATIC_RECIPES, EXAMPLE_RETIRED]),
            &mut session,
            &prompter,
        );
        match result {
            Err(ConfigurationError::RetiredExperiment(name)) => assert_eq!(name, EXAMPLE_RETIRED),
            other => panic!("expected retired experiment error, got {other:?}"),
        }
        assert!(prompter.asked().is_empty(), "no deprecation prompt before failing");
    }

    #[test]
    fn unknown_experiment_is_named() {
        let registry = ExperimentRegistry::builtin();
        let mut session = ExperimentSession::new();
        let error = ExperimentGate::new(&registry)
            .check(&names(&["turbo"]), &mut session, &ScriptedPrompter::new())
            .unwrap_err();
        assert_eq!(error.to_string(), "unknown experiment 'turbo'");
    }

    #[test]
    fn deprecation_warning_is_suppressible_for_the_session() {
        let registry = ExperimentRegistry::builtin();
        let prompter = ScriptedPrompter::new().with_confirmations([true]);
        let mut session = ExperimentSession::new();
        let gate = ExperimentGate::new(&registry);

        let enabled = gate.check(&names(&[STATIC_RECIPES]), &mut session, &prompter).unwrap();
        assert!(enabled.static_recipes());
        assert!(session.deprecation_warnings_suppressed());

        gate.check(&names(&[STATIC_RECIPES]), &mut session, &prompter).unwrap();
        assert_eq!(prompter.asked().len(), 1);
    }

    #[test]
    fn declined_suppression_warns_again() {
        let registry = ExperimentRegistry::builtin();
        let prompter = ScriptedPrompter::new().with_confirmations([false, false]);
        let mut session = ExperimentSession::new();
        let gate = ExperimentGate::new(&registry);
        gate.check(&names(&[STATIC_RECIPES]), &mut session, &prompter).unwrap();
        gate.check(&names(&[STATIC_RECIPES]), &mut session, &prompter).unwrap();
        assert_eq!(prompter.asked().len(), 2);
        assert!(!session.deprecation_warnings_suppressed());
    }

    #[test]
    fn active_experiment_needs_no_prompt() {
        let registry = ExperimentRegistry::builtin();
        let prompter = ScriptedPrompter::new();
        let mut session = ExperimentSession::new();
        let enabled = ExperimentGate::new(&registry)
            .check(&names(&[RAW_TERMINAL]), &mut session, &prompter)
            .unwrap();
        assert!(enabled.raw_terminal());
        assert!(!enabled.static_recipes());
        assert!(prompter.asked().is_empty());
    }
}
