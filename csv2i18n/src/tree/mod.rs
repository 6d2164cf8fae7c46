//! Destination tree flattening.
//!
//! Turns a directory of per-language files into flat entries keyed by their
//! effective key, so they can be matched against the CSV key space.
//!
//! # Key derivation
//!
//! ```text
//! i18n/                      file               key     effective key
//! ├── en.json                en.json            title   title
//! └── pages/
//!     └── nav/
//!         └── en.json        pages/nav/en.json  home    pages.nav.home
//!                                        with alias n:pages.nav.  →  nhome
//! ```

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{TreeError, TreeResult};
use crate::models::{DestinationFile, FileTree, FlatEntry, LanguageCode, Scalar, ScopeAlias};

/// A file tree that refuses duplicate keys instead of keeping the last one.
struct StrictTree(FileTree);

impl<'de> Deserialize<'de> for StrictTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TreeVisitor;

        impl<'de> Visitor<'de> for TreeVisitor {
            type Value = StrictTree;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<StrictTree, A::Error> {
                let mut tree = FileTree::new();
                while let Some((key, value)) = map.next_entry::<String, Scalar>()? {
                    if tree.contains_key(&key) {
                        return Err(serde::de::Error::custom(format!("duplicate key '{}'", key)));
                    }
                    tree.insert(key, value);
                }
                Ok(StrictTree(tree))
            }
        }

        deserializer.deserialize_map(TreeVisitor)
    }
}

/// Recursively list the language files under `root`.
///
/// Only regular files whose extension matches `extension` (case-insensitive)
/// are returned, in file-name order within each directory.
pub fn collect_files(root: &Path, extension: &str) -> TreeResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(extension));
        if matches {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Parse the text of a language file.
///
/// The file must be a JSON object whose values are all scalars, with no
/// key repeated.
pub fn parse_tree(text: &str) -> Result<FileTree, String> {
    serde_json::from_str::<StrictTree>(text)
        .map(|tree| tree.0)
        .map_err(|e| {
            if e.is_data() {
                format!("expected a flat object of scalar values: {}", e)
            } else {
                e.to_string()
            }
        })
}

/// Language of a file: its stem, lower-cased.
pub fn language_of(path: &Path) -> LanguageCode {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    LanguageCode::new(&stem)
}

/// Read and parse every file.
pub fn load_destination(files: &[PathBuf]) -> TreeResult<Vec<DestinationFile>> {
    files
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path).map_err(|source| TreeError::Io {
                path: path.clone(),
                source,
            })?;
            let contents = parse_tree(&text).map_err(|message| TreeError::Parse {
                path: path.clone(),
                message,
            })?;
            Ok(DestinationFile {
                path: path.clone(),
                lang: language_of(path),
                contents,
            })
        })
        .collect()
}

/// Dot-joined directory of `file` relative to `root`, with a trailing dot.
///
/// Files directly under `root` get an empty prefix. A file outside `root`
/// is an error.
pub fn key_prefix(root: &Path, file: &Path) -> TreeResult<String> {
    let relative = file
        .parent()
        .and_then(|dir| dir.strip_prefix(root).ok())
        .ok_or_else(|| TreeError::OutsideRoot {
            path: file.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("{}.", parts.join(".")))
    }
}

/// Apply each alias in order, replacing every occurrence of its scope.
///
/// Later aliases see the output of earlier ones.
pub fn apply_aliases(key: &str, aliases: &[ScopeAlias]) -> String {
    aliases
        .iter()
        .fold(key.to_string(), |acc, a| acc.replace(&a.scope, &a.alias))
}

/// Flatten destination files into one entry per (file, key).
pub fn flatten(
    files: &[DestinationFile],
    root: &Path,
    aliases: &[ScopeAlias],
) -> TreeResult<Vec<FlatEntry>> {
    let mut entries = Vec::new();

    for file in files {
        let prefix = key_prefix(root, &file.path)?;
        for (key, value) in &file.contents {
            entries.push(FlatEntry {
                key_in_file: key.clone(),
                effective_key: apply_aliases(&format!("{}{}", prefix, key), aliases),
                lang: file.lang.clone(),
                filename: file.path.clone(),
                value: value.clone(),
            });
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_key_prefix() {
        let root = Path::new("/app/i18n");
        assert_eq!(key_prefix(root, Path::new("/app/i18n/en.json")).unwrap(), "");
        assert_eq!(key_prefix(root, Path::new("/app/i18n/nav/en.json")).unwrap(), "nav.");
        assert_eq!(
            key_prefix(root, Path::new("/app/i18n/pages/nav/fr.json")).unwrap(),
            "pages.nav."
        );
    }

    #[test]
    fn test_key_prefix_rejects_file_outside_root() {
        let err = key_prefix(Path::new("/app/i18n"), Path::new("/other/en.json")).unwrap_err();
        assert!(matches!(err, TreeError::OutsideRoot { .. }));
    }

    #[test]
    fn test_aliases_applied_in_order() {
        let aliases = vec![ScopeAlias::new("n", "nav."), ScopeAlias::new("x", "nh")];
        assert_eq!(apply_aliases("nav.home", &aliases[..1]), "nhome");
        // second alias sees the output of the first
        assert_eq!(apply_aliases("nav.home", &aliases), "xome");
    }

    #[test]
    fn test_alias_replaces_every_occurrence() {
        let aliases = vec![ScopeAlias::new("", "a.")];
        assert_eq!(apply_aliases("a.b.a.c", &aliases), "b.c");
    }

    #[test]
    fn test_language_of() {
        assert_eq!(language_of(Path::new("i18n/EN.json")), LanguageCode::new("en"));
        assert_eq!(language_of(Path::new("i18n/pt-BR.json")), LanguageCode::new("pt-br"));
    }

    #[test]
    fn test_parse_tree_rejects_nested_objects() {
        assert!(parse_tree(r#"{"a": "x"}"#).is_ok());
        let err = parse_tree(r#"{"a": {"b": "x"}}"#).unwrap_err();
        assert!(err.contains("flat object"));
        assert!(parse_tree(r#"{"a": "x""#).is_err());
        assert!(parse_tree(r#"["a"]"#).is_err());
    }

    #[test]
    fn test_parse_tree_rejects_duplicate_keys() {
        let err = parse_tree(r#"{"a": "x", "a": "y"}"#).unwrap_err();
        assert!(err.contains("duplicate key 'a'"));
    }

    #[test]
    fn test_parse_tree_keeps_file_order() {
        let tree = parse_tree(r#"{"b": "1", "a": "2", "c": 3}"#).unwrap();
        let keys: Vec<&str> = tree.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_collect_files_filters_extension() {
        let dir = tempdir().unwrap();
        write(dir.path(), "en.json", "{}");
        write(dir.path(), "nav/fr.JSON", "{}");
        write(dir.path(), "README.md", "docs");
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let files = collect_files(dir.path(), "json").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("en.json"));
        assert!(files[1].ends_with("nav/fr.JSON"));
    }

    #[test]
    fn test_load_destination_reports_malformed_file() {
        let dir = tempdir().unwrap();
        let bad = write(dir.path(), "en.json", "{ not json");

        let err = load_destination(&[bad.clone()]).unwrap_err();
        match err {
            TreeError::Parse { path, .. } => assert_eq!(path, bad),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_flatten_nested_directories() {
        let dir = tempdir().unwrap();
        write(dir.path(), "en.json", r#"{"title": "Title"}"#);
        write(dir.path(), "nav/en.json", r#"{"home": "Home", "back": "Back"}"#);

        let files = load_destination(&collect_files(dir.path(), "json").unwrap()).unwrap();
        let entries = flatten(&files, dir.path(), &[]).unwrap();

        let keys: Vec<&str> = entries.iter().map(|e| e.effective_key.as_str()).collect();
        assert_eq!(keys, vec!["title", "nav.home", "nav.back"]);

        let home = &entries[1];
        assert_eq!(home.key_in_file, "home");
        assert_eq!(home.lang, LanguageCode::new("en"));
        assert_eq!(home.value, Scalar::from("Home"));
        assert!(home.filename.ends_with("nav/en.json"));
    }

    #[test]
    fn test_flatten_with_alias() {
        let dir = tempdir().unwrap();
        write(dir.path(), "nav/en.json", r#"{"home": "Home"}"#);

        let files = load_destination(&collect_files(dir.path(), "json").unwrap()).unwrap();
        let entries = flatten(&files, dir.path(), &[ScopeAlias::new("n", "nav.")]).unwrap();

        assert_eq!(entries[0].effective_key, "nhome");
        assert_eq!(entries[0].key_in_file, "home");
    }
}
