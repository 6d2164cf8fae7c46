//! Value propagation from the CSV source into the destination files.
//!
//! Propagation is a pure transform. [`plan_updates`] turns a validated
//! [`Correspondence`] into an [`UpdateTable`] (entry index → new value), then
//! [`propagate`] rebuilds one tree per destination file from the untouched
//! flat entries plus that table.
//!
//! ```text
//! FlatEntry[] ──┐
//!               ├──▶ group by filename ──▶ { key_in_file: new or old value }
//! UpdateTable ──┘
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{FileTree, FlatEntry, LanguageCode, Scalar, TabularRecord};
use crate::reconcile::Correspondence;

/// New values keyed by flat entry index.
#[derive(Debug, Clone, Default)]
pub struct UpdateTable {
    values: HashMap<usize, String>,
}

impl UpdateTable {
    pub fn get(&self, entry: usize) -> Option<&str> {
        self.values.get(&entry).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of entries whose value the table actually changes.
    pub fn count_changes(&self, entries: &[FlatEntry]) -> usize {
        self.values
            .iter()
            .filter(|(idx, new)| {
                entries
                    .get(**idx)
                    .is_some_and(|e| e.value.as_text() != Some(new.as_str()))
            })
            .count()
    }
}

/// One rebuilt destination file.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub tree: FileTree,
}

/// Resolve every CSV cell to the entry it overwrites.
///
/// Each (key, language) must resolve through the correspondence, and no
/// entry may be targeted twice.
pub fn plan_updates(
    correspondence: &Correspondence,
    records: &[TabularRecord],
    languages: &[LanguageCode],
) -> ReconcileResult<UpdateTable> {
    let mut values = HashMap::new();

    for record in records {
        for lang in languages {
            let idx = correspondence
                .entry_for(&record.key, lang)
                .ok_or_else(|| ReconcileError::AmbiguousCorrespondence {
                    key: record.key.clone(),
                    lang: lang.to_string(),
                    matches: 0,
                })?;

            let Some(value) = record.value(lang) else {
                continue;
            };

            if values.insert(idx, value.to_string()).is_some() {
                return Err(ReconcileError::AmbiguousCorrespondence {
                    key: record.key.clone(),
                    lang: lang.to_string(),
                    matches: 2,
                });
            }
        }
    }

    Ok(UpdateTable { values })
}

/// Rebuild per-file trees, applying `updates`.
///
/// Files come out in first-encounter order. With `sort`, keys inside each
/// file are sorted lexicographically; otherwise file order is kept.
pub fn propagate(entries: &[FlatEntry], updates: &UpdateTable, sort: bool) -> Vec<OutputFile> {
    let mut groups: IndexMap<&Path, FileTree> = IndexMap::new();

    for (idx, entry) in entries.iter().enumerate() {
        let value = match updates.get(idx) {
            Some(new) => Scalar::from(new),
            None => entry.value.clone(),
        };
        groups
            .entry(entry.filename.as_path())
            .or_default()
            .insert(entry.key_in_file.clone(), value);
    }

    groups
        .into_iter()
        .map(|(path, mut tree)| {
            if sort {
                tree.sort_keys();
            }
            OutputFile {
                path: path.to_path_buf(),
                tree,
            }
        })
        .collect()
}

/// Regroup entries without any update.
pub fn regroup(entries: &[FlatEntry], sort: bool) -> Vec<OutputFile> {
    propagate(entries, &UpdateTable::default(), sort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DestinationFile;
    use crate::reconcile::validate;
    use crate::tree::{flatten, language_of, parse_tree};

    fn file(path: &str, json: &str) -> DestinationFile {
        let path = PathBuf::from(path);
        DestinationFile {
            lang: language_of(&path),
            contents: parse_tree(json).unwrap(),
            path,
        }
    }

    fn langs(codes: &[&str]) -> Vec<LanguageCode> {
        codes.iter().map(|c| LanguageCode::new(c)).collect()
    }

    fn run(files: &[DestinationFile], records: &[TabularRecord], sort: bool) -> Vec<OutputFile> {
        let entries = flatten(files, Path::new("/i18n"), &[]).unwrap();
        let languages = langs(&["en", "fr"]);
        let corr = validate(&entries, records, &languages).unwrap();
        let updates = plan_updates(&corr, records, &languages).unwrap();
        propagate(&entries, &updates, sort)
    }

    #[test]
    fn test_greeting_scenario() {
        let files = vec![
            file("/i18n/en.json", r#"{"greeting": "hi"}"#),
            file("/i18n/fr.json", r#"{"greeting": "salut"}"#),
        ];
        let records = vec![TabularRecord::new("greeting")
            .with_value("en", "hello")
            .with_value("fr", "bonjour")];

        let out = run(&files, &records, true);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].path, PathBuf::from("/i18n/en.json"));
        assert_eq!(out[0].tree["greeting"], Scalar::from("hello"));
        assert_eq!(out[1].tree["greeting"], Scalar::from("bonjour"));
    }

    #[test]
    fn test_every_file_keeps_its_key_set() {
        let files = vec![
            file("/i18n/en.json", r#"{"b": "1", "a": "2"}"#),
            file("/i18n/fr.json", r#"{"a": "3", "b": "4"}"#),
            file("/i18n/nav/en.json", r#"{"home": "Home"}"#),
            file("/i18n/nav/fr.json", r#"{"home": "Maison"}"#),
        ];
        let records = vec![
            TabularRecord::new("a").with_value("en", "A").with_value("fr", "A-fr"),
            TabularRecord::new("b").with_value("en", "B").with_value("fr", "B-fr"),
            TabularRecord::new("nav.home").with_value("en", "Home").with_value("fr", "Accueil"),
        ];

        let out = run(&files, &records, false);

        assert_eq!(out.len(), files.len());
        for (output, input) in out.iter().zip(&files) {
            assert_eq!(output.path, input.path);
            let out_keys: Vec<&String> = output.tree.keys().collect();
            let in_keys: Vec<&String> = input.contents.keys().collect();
            assert_eq!(out_keys, in_keys);
        }
        assert_eq!(out[3].tree["home"], Scalar::from("Accueil"));
    }

    #[test]
    fn test_sort_orders_keys() {
        let files = vec![
            file("/i18n/en.json", r#"{"b": "1", "a": "2"}"#),
            file("/i18n/fr.json", r#"{"b": "3", "a": "4"}"#),
        ];
        let records = vec![
            TabularRecord::new("a").with_value("en", "a").with_value("fr", "a"),
            TabularRecord::new("b").with_value("en", "b").with_value("fr", "b"),
        ];

        let sorted = run(&files, &records, true);
        let kept = run(&files, &records, false);

        assert_eq!(sorted[0].tree.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(kept[0].tree.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_regroup_is_identity() {
        let files = vec![
            file("/i18n/en.json", r#"{"z": "last", "n": 3, "flag": true, "none": null}"#),
            file("/i18n/nav/en.json", r#"{"home": "Home"}"#),
        ];
        let entries = flatten(&files, Path::new("/i18n"), &[]).unwrap();

        let out = regroup(&entries, false);

        assert_eq!(out.len(), 2);
        for (output, input) in out.iter().zip(&files) {
            assert_eq!(output.path, input.path);
            assert_eq!(output.tree, input.contents);
        }
    }

    #[test]
    fn test_non_text_values_replaced_by_text() {
        let files = vec![
            file("/i18n/en.json", r#"{"count": 3}"#),
            file("/i18n/fr.json", r#"{"count": 3}"#),
        ];
        let records = vec![TabularRecord::new("count").with_value("en", "3").with_value("fr", "trois")];

        let out = run(&files, &records, true);
        assert_eq!(out[0].tree["count"], Scalar::from("3"));
        assert_eq!(out[1].tree["count"], Scalar::from("trois"));
    }

    #[test]
    fn test_count_changes() {
        let files = vec![
            file("/i18n/en.json", r#"{"greeting": "hello"}"#),
            file("/i18n/fr.json", r#"{"greeting": "salut"}"#),
        ];
        let records = vec![TabularRecord::new("greeting")
            .with_value("en", "hello")
            .with_value("fr", "bonjour")];
        let entries = flatten(&files, Path::new("/i18n"), &[]).unwrap();
        let languages = langs(&["en", "fr"]);
        let corr = validate(&entries, &records, &languages).unwrap();
        let updates = plan_updates(&corr, &records, &languages).unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates.count_changes(&entries), 1);
    }

    #[test]
    fn test_unresolved_cell_is_an_invariant_violation() {
        let records = vec![TabularRecord::new("greeting").with_value("en", "hello")];
        let err = plan_updates(&Correspondence::default(), &records, &langs(&["en"])).unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::AmbiguousCorrespondence { matches: 0, .. }
        ));
    }
}
