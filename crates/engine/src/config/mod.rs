//! Configuration for pick-and-run invocations.
//! This module handles loading `~/.config/quay/config.json` and interpreting
//! its string-valued settings.

mod io;
mod model;

pub use io::{CONFIG_PATH_ENV, default_config_path, load_config, load_config_from_path};
pub use model::{DEFAULT_PICKER_PRIORITY, DEFAULT_RECIPES, QuayConfig};
