//! # Quay Engine
//!
//! The Quay engine turns configured recipe providers into a catalog of
//! shell commands, validates experiment flags, and runs a selected command
//! in a per-command process slot through an interchangeable backend.
//!
//! ## Key Features
//!
//! - **Recipe resolution**: invocable providers and gated named tables, normalized into `CommandSpec`s
//! - **Experiment gating**: retired and unknown flags fail fast; deprecated flags warn once per session
//! - **Picker contract**: front ends register pickers; `auto` walks a priority list with a fallback
//! - **Process slots**: one live process per `name[scope]`, with kill confirmation and repeat-last-run
//!
//! ## Usage
//!
//! ```rust
//! use quay_engine::{EnabledExperiments, RecipeEngine, RecipeProvider, load_config_from_path};
//! use quay_types::{CommandSpecDraft, NormalizeContext};
//!
//! let temp_dir = tempfile::tempdir()?;
//! let config_path = temp_dir.path().join("config.json");
//! std::fs::write(&config_path, r#"{ "recipes": ["local"] }"#)?;
//! let config = load_config_from_path(&config_path)?;
//!
//! let context = NormalizeContext::new("/proj", None);
//! let engine = RecipeEngine::new(&context, &config.static_recipes, &EnabledExperiments::default());
//! let provider = RecipeProvider::invocable("local", || Ok(vec![CommandSpecDraft::new("build", "make")]));
//!
//! let specs = engine.resolve(&provider)?;
//! assert_eq!(specs[0].slot_key(), "build[/proj]");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`config`**: configuration file model and loading
//! - **`experiment`**: experiment registry, session state and gate
//! - **`recipe`**: providers, built-in recipes and the resolution engine
//! - **`picker`**: selection contract and picker registry
//! - **`executor`**: backends, process handles and the slot registry
//! - **`logging`**: captured-log buffers and files
//! - **`entry`**: the pick-and-run flow tying the above together

pub mod config;
pub mod entry;
pub mod error;
pub mod executor;
pub mod experiment;
pub mod logging;
pub mod picker;
pub mod prompt;
pub mod recipe;

pub use config::{CONFIG_PATH_ENV, QuayConfig, default_config_path, load_config, load_config_from_path};
pub use entry::{EDIT_PROMPT, Launcher, PickOutcome, PickReport, Prepared};
pub use error::{ConfigurationError, RecipeError};
pub use executor::{
    Backend, CapturedLogBackend, ChildProcess, Executor, KILL_PROMPT, ProcessHandle, ProcessSlot, RunOutcome, SlotRegistry,
    SlotState, SlotSummary,
};
pub use experiment::{EnabledExperiments, ExperimentGate, ExperimentRegistry, ExperimentSession, ExperimentStatus};
pub use logging::{LogLine, LogManager, LogStream};
pub use picker::{Picker, PickerCandidate, PickerGroup, PickerRegistry, Selection};
pub use prompt::{Prompter, ScriptedPrompter};
pub use recipe::{RecipeCatalog, RecipeEngine, RecipeGroup, RecipeProvider, ResolvedRecipes};
