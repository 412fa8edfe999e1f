//! Shared type definitions for Quay: command drafts and specs, normalization,
//! and the configuration enums used by the engine and the terminal front end.

pub mod command;
pub mod error;
pub mod mode;

pub use command::{CommandSpec, CommandSpecDraft, NormalizeContext, normalize, slot_key};
pub use error::{UnknownVariant, ValidationError};
pub use mode::{CompletionMethod, RunMode};
