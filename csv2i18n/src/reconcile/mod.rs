//! Key reconciliation between the CSV source and the destination tree.
//!
//! [`validate`] proves both sides describe the same languages and the same
//! keys, and that every (key, language) pair maps to exactly one file entry.
//! Its output, a [`Correspondence`], is the only thing the propagator trusts.
//!
//! Checks run in order and the first failure aborts:
//!
//! 1. language sets equal (lower-cased, deduplicated, sorted)
//! 2. key sets equal (reported as two lists, one per side)
//! 3. cardinality: one CSV row per key, one file entry per (key, language)
//! 4. every CSV cell resolves to exactly one entry

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{FlatEntry, LanguageCode, TabularRecord};

/// Validated mapping from (CSV key, language) to a flat entry index.
#[derive(Debug, Clone, Default)]
pub struct Correspondence {
    index: HashMap<String, HashMap<LanguageCode, usize>>,
}

impl Correspondence {
    /// Index into the entry slice given to [`validate`].
    pub fn entry_for(&self, key: &str, lang: &LanguageCode) -> Option<usize> {
        self.index.get(key).and_then(|langs| langs.get(lang)).copied()
    }

    /// Number of (key, language) pairs.
    pub fn len(&self) -> usize {
        self.index.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the destination tree contains, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeySummary {
    pub keys: usize,
    pub languages: Vec<LanguageCode>,
    pub files: usize,
    pub entries: usize,
}

/// Count distinct keys, languages and files among flat entries.
pub fn summarize(entries: &[FlatEntry]) -> KeySummary {
    let keys: BTreeSet<&str> = entries.iter().map(|e| e.effective_key.as_str()).collect();
    let languages: BTreeSet<&LanguageCode> = entries.iter().map(|e| &e.lang).collect();
    let files: BTreeSet<&Path> = entries.iter().map(|e| e.filename.as_path()).collect();

    KeySummary {
        keys: keys.len(),
        languages: languages.into_iter().cloned().collect(),
        files: files.len(),
        entries: entries.len(),
    }
}

/// Validate the destination entries against the CSV source.
///
/// `source_languages` are the language columns of the CSV header.
pub fn validate(
    entries: &[FlatEntry],
    records: &[TabularRecord],
    source_languages: &[LanguageCode],
) -> ReconcileResult<Correspondence> {
    // 1. Languages
    let languages = check_languages(entries, source_languages)?;

    // 2-3. Key sets
    let unique_keys: BTreeSet<&str> = entries.iter().map(|e| e.effective_key.as_str()).collect();
    let record_keys: BTreeSet<&str> = records.iter().map(|r| r.key.as_str()).collect();

    let only_in_source: Vec<String> = record_keys
        .difference(&unique_keys)
        .map(|k| k.to_string())
        .collect();
    let only_in_destination: Vec<String> = unique_keys
        .difference(&record_keys)
        .map(|k| k.to_string())
        .collect();

    if !only_in_source.is_empty() || !only_in_destination.is_empty() {
        return Err(ReconcileError::KeySetMismatch {
            only_in_source,
            only_in_destination,
        });
    }

    // 4. Cardinality
    let mut pairs: BTreeMap<(&str, &LanguageCode), Vec<usize>> = BTreeMap::new();
    for (idx, entry) in entries.iter().enumerate() {
        pairs
            .entry((entry.effective_key.as_str(), &entry.lang))
            .or_default()
            .push(idx);
    }

    let details = cardinality_details(entries, records, &unique_keys, &languages, &pairs);
    let expected_entries = unique_keys.len() * languages.len();

    if !details.is_empty() || unique_keys.len() != records.len() || entries.len() != expected_entries {
        return Err(ReconcileError::KeyCardinalityMismatch {
            unique_keys: unique_keys.len(),
            languages: languages.len(),
            entries: entries.len(),
            records: records.len(),
            details,
        });
    }

    // 5. Correspondence, exactly one entry per CSV cell
    let mut index: HashMap<String, HashMap<LanguageCode, usize>> = HashMap::new();
    for record in records {
        for lang in &languages {
            let matches = pairs
                .get(&(record.key.as_str(), lang))
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let [only] = matches else {
                return Err(ReconcileError::AmbiguousCorrespondence {
                    key: record.key.clone(),
                    lang: lang.to_string(),
                    matches: matches.len(),
                });
            };

            index
                .entry(record.key.clone())
                .or_default()
                .insert(lang.clone(), *only);
        }
    }

    Ok(Correspondence { index })
}

/// Compare language sets; returns the common sorted set.
fn check_languages(
    entries: &[FlatEntry],
    source_languages: &[LanguageCode],
) -> ReconcileResult<Vec<LanguageCode>> {
    let in_files: BTreeSet<LanguageCode> = entries.iter().map(|e| e.lang.clone()).collect();
    // normalize again in case the caller built codes from raw header text
    let in_source: BTreeSet<LanguageCode> = source_languages
        .iter()
        .map(|l| LanguageCode::new(l.as_str()))
        .collect();

    if in_files != in_source {
        return Err(ReconcileError::LanguageSetMismatch {
            in_files: in_files.iter().map(ToString::to_string).collect(),
            in_source: in_source.iter().map(ToString::to_string).collect(),
        });
    }

    Ok(in_files.into_iter().collect())
}

/// Human-readable list of duplicated and missing entries.
fn cardinality_details(
    entries: &[FlatEntry],
    records: &[TabularRecord],
    unique_keys: &BTreeSet<&str>,
    languages: &[LanguageCode],
    pairs: &BTreeMap<(&str, &LanguageCode), Vec<usize>>,
) -> Vec<String> {
    let mut details = Vec::new();

    let mut row_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *row_counts.entry(record.key.as_str()).or_default() += 1;
    }
    for (key, count) in row_counts.iter().filter(|(_, c)| **c > 1) {
        details.push(format!("source key '{}' appears in {} rows", key, count));
    }

    for ((key, lang), indices) in pairs.iter().filter(|(_, v)| v.len() > 1) {
        let sources: Vec<String> = indices
            .iter()
            .map(|&i| format!("{}:{}", entries[i].filename.display(), entries[i].key_in_file))
            .collect();
        details.push(format!("'{}' [{}] defined {} times ({})", key, lang, indices.len(), sources.join(", ")));
    }

    for key in unique_keys {
        for lang in languages {
            if !pairs.contains_key(&(*key, lang)) {
                details.push(format!("'{}' missing for [{}]", key, lang));
            }
        }
    }

    details
}
