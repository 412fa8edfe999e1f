//! Errors raised while turning provider drafts into command specs.

use thiserror::Error;

/// A draft was missing (or had blank) required fields.
///
/// Carries the raw draft so the offending record can be shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("command name must be a non-empty string: {draft}")]
    MissingName { draft: String },
    #[error("command line must be a non-empty string: {draft}")]
    MissingCommandLine { draft: String },
}

impl ValidationError {
    /// Raw contents of the rejected draft.
    pub fn draft(&self) -> &str {
        match self {
            ValidationError::MissingName { draft } | ValidationError::MissingCommandLine { draft } => draft,
        }
    }
}

/// A configuration string did not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
