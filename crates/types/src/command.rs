//! Command descriptions: the raw drafts recipe providers emit and the
//! normalized, immutable [`CommandSpec`] the picker and executor work with.
//!
//! A `CommandSpec` can only be obtained through [`normalize`], so a spec with
//! an empty name or command line never exists.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use quay_util::{abbreviate_home, expand_tilde, normalize_lexically};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Raw, provider-supplied description of one runnable entry.
///
/// Every field is optional at this stage; [`normalize`] enforces the
/// required ones and fills in defaults for the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpecDraft {
    /// Command identity within its scope (e.g. "build").
    #[serde(rename = "command-name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Shell text handed verbatim to `<shell> -c`.
    #[serde(rename = "command-line", default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    /// Label shown in pickers; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Directory the command runs in; defaults to the resolution-time cwd.
    #[serde(rename = "working-dir", default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Disambiguates identically named commands; defaults to the abbreviated working dir.
    #[serde(rename = "scope-name", default, skip_serializing_if = "Option::is_none")]
    pub scope_name: Option<String>,
}

impl CommandSpecDraft {
    pub fn new(name: impl Into<String>, command_line: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            command_line: Some(command_line.into()),
            ..Self::default()
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(working_dir.into());
        self
    }

    pub fn with_scope_name(mut self, scope_name: impl Into<String>) -> Self {
        self.scope_name = Some(scope_name.into());
        self
    }

    /// True when the provider omitted `command-line` entirely.
    ///
    /// Such drafts are dropped during resolution; a present-but-blank
    /// command line is a validation failure instead.
    pub fn lacks_command_line(&self) -> bool {
        self.command_line.is_none()
    }

    /// Uninterpreted rendering of the draft used in error reports.
    pub fn raw_contents(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }

    /// Normalize this draft against `context`. See [`normalize`].
    pub fn normalize(&self, context: &NormalizeContext) -> Result<CommandSpec, ValidationError> {
        normalize(self, context)
    }
}

/// Environment captured at resolution time and used to fill draft defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeContext {
    current_dir: PathBuf,
    home_dir: Option<PathBuf>,
}

impl NormalizeContext {
    pub fn new(current_dir: impl Into<PathBuf>, home_dir: Option<PathBuf>) -> Self {
        Self {
            current_dir: current_dir.into(),
            home_dir,
        }
    }

    /// Capture the process working directory and the user's home directory.
    pub fn from_environment() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?, dirs_next::home_dir()))
    }

    /// Same home directory, different working directory.
    pub fn with_current_dir(&self, current_dir: impl Into<PathBuf>) -> Self {
        Self::new(current_dir, self.home_dir.clone())
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    /// Canonical scope string for `path` (home directory shown as `~`).
    pub fn abbreviate(&self, path: &Path) -> String {
        abbreviate_home(path, self.home_dir())
    }

    fn resolve_working_dir(&self, candidate: Option<&Path>) -> PathBuf {
        let Some(candidate) = candidate.filter(|path| !path.as_os_str().is_empty()) else {
            return self.current_dir.clone();
        };
        let expanded = expand_tilde(&candidate.to_string_lossy());
        if expanded.is_absolute() {
            normalize_lexically(&expanded)
        } else {
            normalize_lexically(&self.current_dir.join(expanded))
        }
    }
}

/// Normalized, immutable description of one runnable entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CommandSpec {
    #[serde(rename = "command-name")]
    name: String,
    #[serde(rename = "command-line")]
    command_line: String,
    display: String,
    #[serde(rename = "working-dir")]
    working_dir: PathBuf,
    #[serde(rename = "scope-name")]
    scope_name: String,
}

impl CommandSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    /// Identity of the execution slot this spec runs in: `name[scope]`.
    pub fn slot_key(&self) -> String {
        slot_key(&self.name, &self.scope_name)
    }

    /// Copy of this spec with a replacement command line (used by the edit flow).
    pub fn with_command_line(&self, command_line: impl Into<String>) -> Result<Self, ValidationError> {
        let command_line = command_line.into();
        if command_line.trim().is_empty() {
            let mut draft = self.to_draft();
            draft.command_line = Some(command_line);
            return Err(ValidationError::MissingCommandLine {
                draft: draft.raw_contents(),
            });
        }
        Ok(Self {
            command_line,
            ..self.clone()
        })
    }

    /// Fully populated draft; normalizing it yields an identical spec.
    pub fn to_draft(&self) -> CommandSpecDraft {
        CommandSpecDraft {
            name: Some(self.name.clone()),
            command_line: Some(self.command_line.clone()),
            display: Some(self.display.clone()),
            working_dir: Some(self.working_dir.clone()),
            scope_name: Some(self.scope_name.clone()),
        }
    }
}

impl From<&CommandSpec> for CommandSpecDraft {
    fn from(spec: &CommandSpec) -> Self {
        spec.to_draft()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display, self.command_line)
    }
}

/// Build the slot key for a command name and scope.
pub fn slot_key(name: &str, scope_name: &str) -> String {
    format!("{name}[{scope_name}]")
}

/// Turn a draft into a [`CommandSpec`].
///
/// 1. `name` must be a non-blank string.
/// 2. `command_line` must be a non-blank string.
/// 3. `display` defaults to `name`.
/// 4. `working_dir` defaults to the context's current directory; `~` is
///    expanded and relative paths are joined onto the current directory.
/// 5. `scope_name` defaults to the abbreviated working directory and is
///    never overwritten when supplied.
pub fn normalize(draft: &CommandSpecDraft, context: &NormalizeContext) -> Result<CommandSpec, ValidationError> {
    let name = non_blank(draft.name.as_deref()).ok_or_else(|| ValidationError::MissingName {
        draft: draft.raw_contents(),
    })?;
    let command_line = non_blank(draft.command_line.as_deref()).ok_or_else(|| ValidationError::MissingCommandLine {
        draft: draft.raw_contents(),
    })?;

    let display = non_blank(draft.display.as_deref()).unwrap_or(name);
    let working_dir = context.resolve_working_dir(draft.working_dir.as_deref());
    let scope_name = match non_blank(draft.scope_name.as_deref()) {
        Some(scope) => scope.to_string(),
        None => context.abbreviate(&working_dir),
    };

    Ok(CommandSpec {
        name: name.to_string(),
        command_line: command_line.to_string(),
        display: display.to_string(),
        working_dir,
        scope_name,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> NormalizeContext {
        NormalizeContext::new("/home/dev/proj", Some(PathBuf::from("/home/dev")))
    }

    #[test]
    fn fills_defaults_from_context() {
        let context = NormalizeContext::new("/proj", Some(PathBuf::from("/home/dev")));
        let spec = normalize(&CommandSpecDraft::new("build", "make"), &context).unwrap();
        assert_eq!(spec.name(), "build");
        assert_eq!(spec.command_line(), "make");
        assert_eq!(spec.display(), "build");
        assert_eq!(spec.working_dir(), Path::new("/proj"));
        assert_eq!(spec.scope_name(), context.abbreviate(Path::new("/proj")));
    }

    #[test]
    fn scope_defaults_to_abbreviated_working_dir() {
        let spec = normalize(&CommandSpecDraft::new("build", "make"), &context()).unwrap();
        assert_eq!(spec.scope_name(), "~/proj");
        assert_eq!(spec.slot_key(), "build[~/proj]");
    }

    #[test]
    fn explicit_scope_is_kept() {
        let draft = CommandSpecDraft::new("build", "make")
            .with_working_dir("/elsewhere")
            .with_scope_name("release");
        let spec = normalize(&draft, &context()).unwrap();
        assert_eq!(spec.scope_name(), "release");
        assert_eq!(spec.working_dir(), Path::new("/elsewhere"));
    }

    #[test]
    fn relative_working_dir_joins_current_dir() {
        let draft = CommandSpecDraft::new("docs", "mdbook build").with_working_dir("book");
        let spec = normalize(&draft, &context()).unwrap();
        assert_eq!(spec.working_dir(), Path::new("/home/dev/proj/book"));
        assert_eq!(spec.scope_name(), "~/proj/book");
    }

    #[test]
    fn dot_segments_do_not_split_scopes() {
        let plain = normalize(&CommandSpecDraft::new("docs", "mdbook build").with_working_dir("book"), &context()).unwrap();
        for dir in ["./book", "book/", "web/../book", "/home/dev/proj/./book"] {
            let spec = normalize(&CommandSpecDraft::new("docs", "mdbook build").with_working_dir(dir), &context()).unwrap();
            assert_eq!(spec.working_dir(), Path::new("/home/dev/proj/book"), "{dir}");
            assert_eq!(spec.slot_key(), plain.slot_key(), "{dir}");
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let drafts = [
            CommandSpecDraft::new("build", "make"),
            CommandSpecDraft::new("run", "cargo run").with_display("Run it"),
            CommandSpecDraft::new("t", "npm test").with_working_dir("web").with_scope_name("frontend"),
        ];
        for draft in drafts {
            let once = normalize(&draft, &context()).unwrap();
            let other_context = NormalizeContext::new("/tmp", None);
            let twice = normalize(&once.to_draft(), &other_context).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn blank_required_fields_fail_with_raw_contents() {
        let error = normalize(&CommandSpecDraft::new("", "make"), &context()).unwrap_err();
        assert!(matches!(error, ValidationError::MissingName { .. }));
        assert!(error.draft().contains("\"command-line\":\"make\""), "{}", error.draft());

        let error = normalize(&CommandSpecDraft::new("build", "   "), &context()).unwrap_err();
        assert!(matches!(error, ValidationError::MissingCommandLine { .. }));

        let missing_name = CommandSpecDraft {
            command_line: Some("make".into()),
            ..CommandSpecDraft::default()
        };
        assert!(matches!(
            normalize(&missing_name, &context()),
            Err(ValidationError::MissingName { .. })
        ));
    }

    #[test]
    fn deserializes_provider_records() {
        let yaml = r#"
- command-name: build
  command-line: make
- command-name: t
  command-line: null
- command-name: serve
  command-line: python -m http.server
  display: Serve docs
  working-dir: site
"#;
        let drafts: Vec<CommandSpecDraft> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(drafts.len(), 3);
        assert!(drafts[1].lacks_command_line());
        assert_eq!(drafts[2].display.as_deref(), Some("Serve docs"));
        assert_eq!(drafts[2].working_dir.as_deref(), Some(Path::new("site")));
    }

    #[test]
    fn edited_command_line_must_not_be_blank() {
        let spec = normalize(&CommandSpecDraft::new("build", "make"), &context()).unwrap();
        let edited = spec.with_command_line("make -j8").unwrap();
        assert_eq!(edited.command_line(), "make -j8");
        assert_eq!(edited.slot_key(), spec.slot_key());
        assert!(spec.with_command_line(" ").is_err());
    }
}
