//! Path helpers shared by the configuration loader and command normalization.
//!
//! `expand_tilde` and `abbreviate_home` are inverses for paths below the
//! user's home directory; the abbreviated form is what scopes commands.

use std::path::{Component, Path, PathBuf};

use dirs_next::home_dir;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Expand a leading `~` into the current user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = p.strip_prefix("~\\") {
        // Windows-style
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

/// Render `path` with the home directory replaced by `~`.
///
/// Paths outside `home` (or any path when `home` is `None`) are rendered
/// unchanged. The result always uses `/` between the tilde and the rest.
pub fn abbreviate_home(path: &Path, home: Option<&Path>) -> String {
    let Some(home) = home.filter(|home| !home.as_os_str().is_empty()) else {
        return path.display().to_string();
    };
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => {
            let segments: Vec<String> = rest
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("~/{}", segments.join("/"))
        }
        Err(_) => path.display().to_string(),
    }
}

/// Abbreviate `path` against the current user's home directory.
pub fn abbreviate_path(path: &Path) -> String {
    abbreviate_home(path, home_dir().as_deref())
}

/// Remove `.` components and resolve `..` against the preceding component
/// without touching the filesystem. `..` never climbs above the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Characters kept verbatim in file names; everything else is percent-encoded.
const FILE_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Encode an arbitrary key as a single file name.
///
/// The mapping is injective: distinct keys never share a file name, and the
/// result never contains a path separator or a leading dot.
///
/// ```rust
/// use quay_util::encode_file_component;
///
/// assert_eq!(encode_file_component("build[~/proj]"), "build%5B%7E%2Fproj%5D");
/// ```
pub fn encode_file_component(key: &str) -> String {
    utf8_percent_encode(key, FILE_COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviates_paths_below_home() {
        let home = Path::new("/home/dev");
        assert_eq!(abbreviate_home(Path::new("/home/dev/proj"), Some(home)), "~/proj");
        assert_eq!(abbreviate_home(Path::new("/home/dev/proj/sub"), Some(home)), "~/proj/sub");
        assert_eq!(abbreviate_home(Path::new("/home/dev"), Some(home)), "~");
    }

    #[test]
    fn leaves_foreign_paths_untouched() {
        let home = Path::new("/home/dev");
        assert_eq!(abbreviate_home(Path::new("/proj"), Some(home)), "/proj");
        assert_eq!(abbreviate_home(Path::new("/home/developer"), Some(home)), "/home/developer");
        assert_eq!(abbreviate_home(Path::new("/proj"), None), "/proj");
    }

    #[test]
    fn expand_and_abbreviate_round_trip() {
        temp_env::with_var("HOME", Some("/home/dev"), || {
            let expanded = expand_tilde("~/proj");
            assert_eq!(expanded, PathBuf::from("/home/dev/proj"));
            assert_eq!(abbreviate_path(&expanded), "~/proj");
        });
    }

    #[test]
    fn dot_components_are_resolved_lexically() {
        assert_eq!(normalize_lexically(Path::new("/proj/./book")), PathBuf::from("/proj/book"));
        assert_eq!(normalize_lexically(Path::new("/proj/app/../book/")), PathBuf::from("/proj/book"));
        assert_eq!(normalize_lexically(Path::new("/../proj")), PathBuf::from("/proj"));
        assert_eq!(normalize_lexically(Path::new("../a/./b/..")), PathBuf::from("../a"));
        assert_eq!(normalize_lexically(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn encodes_slot_keys_as_file_names() {
        assert_eq!(encode_file_component("test-all_v2"), "test-all_v2");
        assert_eq!(encode_file_component(".."), "%2E%2E");
        assert_eq!(encode_file_component("100%"), "100%25");
        assert!(!encode_file_component("build[/x/my/proj]").contains('/'));
    }

    #[test]
    fn similar_slot_keys_get_distinct_file_names() {
        assert_ne!(
            encode_file_component("build[/x/my_proj]"),
            encode_file_component("build[/x/my/proj]")
        );
        assert_ne!(encode_file_component("a_b"), encode_file_component("a b"));
    }
}
