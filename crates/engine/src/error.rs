//! Error types surfaced by the engine.

use std::path::PathBuf;

use quay_types::ValidationError;
use thiserror::Error;

/// Fatal to an entry-point invocation: nothing is resolved or executed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no recipe providers are configured")]
    NoRecipes,

    #[error("unrecognized completion method '{0}'")]
    UnknownCompletionMethod(String),

    #[error("unrecognized run mode '{0}'")]
    UnknownRunMode(String),

    #[error("experiment '{0}' has been retired")]
    RetiredExperiment(String),

    #[error("unknown experiment '{0}'")]
    UnknownExperiment(String),

    #[error("invalid recipe '{0}'")]
    InvalidRecipe(String),

    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while resolving a single recipe provider.
///
/// `Configuration` aborts the whole invocation; the other variants only
/// remove that provider's candidates.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("recipe '{provider}' produced an invalid command: {source}")]
    Validation {
        provider: String,
        #[source]
        source: ValidationError,
    },

    #[error("recipe '{provider}' failed: {error:#}")]
    Provider { provider: String, error: anyhow::Error },
}

impl RecipeError {
    /// Label of the provider this error belongs to, when known.
    pub fn provider(&self) -> Option<&str> {
        match self {
            RecipeError::Configuration(_) => None,
            RecipeError::Validation { provider, .. } | RecipeError::Provider { provider, .. } => Some(provider),
        }
    }
}
