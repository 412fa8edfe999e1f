//! Built-in recipe providers that inspect a project directory.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use quay_types::CommandSpecDraft;
use regex::Regex;
use serde::Deserialize;

/// Files consulted by the `project` provider, first match wins.
pub const PROJECT_FILE_NAMES: [&str; 3] = [".quay.yaml", ".quay.yml", ".quay.json"];

const MAKEFILE_NAMES: [&str; 3] = ["GNUmakefile", "makefile", "Makefile"];

const CARGO_SUBCOMMANDS: [&str; 5] = ["build", "check", "test", "run", "clippy"];

/// A rule line: one or two colons not followed by `=` or a further colon, which
/// rules out `:=`, `::=` and `:::=` assignments.
static MAKE_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9_./-]*)\s*:{1,2}([^=:]|$)").expect("valid make target pattern"));

/// Either a bare list of drafts or a table with a `commands` list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProjectFile {
    List(Vec<CommandSpecDraft>),
    Table {
        #[serde(default)]
        commands: Vec<CommandSpecDraft>,
    },
}

impl ProjectFile {
    fn into_commands(self) -> Vec<CommandSpecDraft> {
        match self {
            Self::List(commands) | Self::Table { commands } => commands,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PackageJson {
    scripts: indexmap::IndexMap<String, serde_json::Value>,
}

/// Commands declared in a project file (`.quay.yaml`, `.quay.yml` or
/// `.quay.json`) under `dir`.
///
/// Drafts that do not name a working directory run in `dir`.
pub fn project_recipes(dir: &Path) -> Result<Vec<CommandSpecDraft>> {
    let Some(path) = first_existing(dir, &PROJECT_FILE_NAMES) else {
        return Ok(Vec::new());
    };
    let content = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let project: ProjectFile = serde_yaml::from_str(&content).with_context(|| format!("parse {}", path.display()))?;

    Ok(project
        .into_commands()
        .into_iter()
        .map(|mut draft| {
            match &draft.working_dir {
                Some(working_dir) if working_dir.is_relative() && !working_dir.starts_with("~") => {
                    draft.working_dir = Some(dir.join(working_dir));
                }
                Some(_) => {}
                None => draft.working_dir = Some(dir.to_path_buf()),
            }
            draft
        })
        .collect())
}

/// Standard cargo subcommands when `dir` holds a `Cargo.toml`.
pub fn cargo_recipes(dir: &Path) -> Result<Vec<CommandSpecDraft>> {
    if !dir.join("Cargo.toml").is_file() {
        return Ok(Vec::new());
    }
    Ok(CARGO_SUBCOMMANDS
        .iter()
        .map(|subcommand| {
            CommandSpecDraft::new(format!("cargo-{subcommand}"), format!("cargo {subcommand}"))
                .with_display(format!("cargo {subcommand}"))
                .with_working_dir(dir)
        })
        .collect())
}

/// One command per explicit Makefile target.
///
/// Special targets (leading `.`) and variable assignments are skipped;
/// duplicate targets keep their first position.
pub fn make_recipes(dir: &Path) -> Result<Vec<CommandSpecDraft>> {
    let Some(path) = first_existing(dir, &MAKEFILE_NAMES) else {
        return Ok(Vec::new());
    };
    let content = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;

    let mut seen = HashSet::new();
    Ok(make_targets(&content)
        .into_iter()
        .filter(|target| seen.insert(target.clone()))
        .map(|target| {
            CommandSpecDraft::new(format!("make-{target}"), format!("make {target}"))
                .with_display(format!("make {target}"))
                .with_working_dir(dir)
        })
        .collect())
}

/// `npm run` commands for each script in `package.json`.
pub fn npm_recipes(dir: &Path) -> Result<Vec<CommandSpecDraft>> {
    let path = dir.join("package.json");
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let package: PackageJson = serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))?;

    Ok(package
        .scripts
        .keys()
        .map(|script| {
            CommandSpecDraft::new(format!("npm-{script}"), format!("npm run {script}"))
                .with_display(format!("npm run {script}"))
                .with_working_dir(dir)
        })
        .collect())
}

fn make_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| MAKE_TARGET.captures(line))
        .filter_map(|captures| captures.get(1))
        .map(|target| target.as_str().to_string())
        .collect()
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}
