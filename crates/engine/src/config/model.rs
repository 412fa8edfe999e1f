//! Data model for the Quay configuration file.

use std::{env, path::PathBuf};

use dirs_next::data_local_dir;
use indexmap::IndexMap;
use quay_types::{CommandSpecDraft, CompletionMethod, RunMode};
use quay_util::expand_tilde;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Recipe providers consulted when the configuration does not list any.
pub const DEFAULT_RECIPES: [&str; 4] = ["project", "cargo", "make", "npm"];

/// Picker order used by the `auto` completion method.
pub const DEFAULT_PICKER_PRIORITY: [&str; 2] = ["fuzzy", "menu"];

const FALLBACK_SHELL: &str = "/bin/sh";

/// User configuration. String-valued settings are kept verbatim so that an
/// unrecognized value can be reported with the offending text at the entry
/// point instead of failing the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuayConfig {
    /// One of `auto`, `fuzzy`, `menu`, `prompt`.
    pub completion_method: String,
    /// One of `capturedLog`, `interactiveTerminal`.
    pub run_mode: String,
    /// Ordered recipe provider identifiers.
    pub recipes: Vec<String>,
    /// Enabled experiment names.
    pub experiments: Vec<String>,
    /// Named-value recipe tables (requires the `static-recipes` experiment).
    pub static_recipes: IndexMap<String, Vec<CommandSpecDraft>>,
    /// Picker identifiers tried in order by `auto`.
    pub picker_priority: Vec<String>,
    /// Shell used to run command lines; defaults to `$SHELL`, then `/bin/sh`.
    pub shell: Option<String>,
    /// Where captured-log output is mirrored.
    pub log_directory: Option<PathBuf>,
}

impl Default for QuayConfig {
    fn default() -> Self {
        Self {
            completion_method: CompletionMethod::Auto.to_string(),
            run_mode: RunMode::CapturedLog.to_string(),
            recipes: DEFAULT_RECIPES.iter().map(|recipe| recipe.to_string()).collect(),
            experiments: Vec::new(),
            static_recipes: IndexMap::new(),
            picker_priority: DEFAULT_PICKER_PRIORITY.iter().map(|picker| picker.to_string()).collect(),
            shell: None,
            log_directory: None,
        }
    }
}

impl QuayConfig {
    pub fn completion_method(&self) -> Result<CompletionMethod, ConfigurationError> {
        self.completion_method
            .parse()
            .map_err(|_| ConfigurationError::UnknownCompletionMethod(self.completion_method.clone()))
    }

    pub fn run_mode(&self) -> Result<RunMode, ConfigurationError> {
        self.run_mode
            .parse()
            .map_err(|_| ConfigurationError::UnknownRunMode(self.run_mode.clone()))
    }

    /// Shell program used as `<shell> -c <command line>`.
    pub fn shell_program(&self) -> String {
        self.shell
            .as_deref()
            .map(str::trim)
            .filter(|shell| !shell.is_empty())
            .map(str::to_string)
            .or_else(|| env::var("SHELL").ok().filter(|shell| !shell.trim().is_empty()))
            .unwrap_or_else(|| FALLBACK_SHELL.to_string())
    }

    /// Directory holding captured-log files.
    pub fn log_directory_path(&self) -> PathBuf {
        if let Some(directory) = &self.log_directory
            && !directory.as_os_str().is_empty()
        {
            return expand_tilde(&directory.to_string_lossy());
        }
        data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quay")
            .join("logs")
    }

    /// Add experiments requested on the command line, keeping order and skipping duplicates.
    pub fn with_extra_experiments<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in extra {
            let name = name.into();
            if !self.experiments.contains(&name) {
                self.experiments.push(name);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = QuayConfig::default();
        assert_eq!(config.completion_method().unwrap(), CompletionMethod::Auto);
        assert_eq!(config.run_mode().unwrap(), RunMode::CapturedLog);
        assert_eq!(config.recipes, vec!["project", "cargo", "make", "npm"]);
    }

    #[test]
    fn unknown_values_are_reported_verbatim() {
        let config = QuayConfig {
            completion_method: "helm".into(),
            run_mode: "detached".into(),
            ..QuayConfig::default()
        };
        assert!(matches!(
            config.completion_method(),
            Err(ConfigurationError::UnknownCompletionMethod(value)) if value == "helm"
        ));
        assert!(matches!(
            config.run_mode(),
            Err(ConfigurationError::UnknownRunMode(value)) if value == "detached"
        ));
    }

    #[test]
    fn explicit_shell_wins_over_environment() {
        let config = QuayConfig {
            shell: Some("/bin/bash".into()),
            ..QuayConfig::default()
        };
        temp_env::with_var("SHELL", Some("/bin/zsh"), || {
            assert_eq!(config.shell_program(), "/bin/bash");
            assert_eq!(QuayConfig::default().shell_program(), "/bin/zsh");
        });
        temp_env::with_var_unset("SHELL", || {
            assert_eq!(QuayConfig::default().shell_program(), "/bin/sh");
        });
    }

    #[test]
    fn extra_experiments_are_deduplicated() {
        let config = QuayConfig {
            experiments: vec!["raw-terminal".into()],
            ..QuayConfig::default()
        }
        .with_extra_experiments(["raw-terminal", "static-recipes"]);
        assert_eq!(config.experiments, vec!["raw-terminal", "static-recipes"]);
    }
}
