//! Small, dependency-light helpers shared across the Quay crates.

pub mod fuzzy;
pub mod path_processing;

pub use fuzzy::{fuzzy_score, rank_labels};
pub use path_processing::{abbreviate_home, abbreviate_path, encode_file_component, expand_tilde, normalize_lexically};
