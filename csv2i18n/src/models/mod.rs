//! Domain models for the csv2i18n pipeline.
//!
//! This module contains the core data structures shared by every stage:
//!
//! - [`LanguageCode`] - Lower-cased language identifier (CSV column / file stem)
//! - [`TabularRecord`] - One CSV row: a translation key and its values per language
//! - [`Scalar`] / [`FileTree`] - Parsed content of one language file
//! - [`DestinationFile`] - One language file of the destination tree
//! - [`FlatEntry`] - One (key, language) pair materialized from a file
//! - [`ScopeAlias`] - Literal substitution applied to effective keys

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// =============================================================================
// Language Code
// =============================================================================

/// Case-normalized language identifier.
///
/// Joins CSV header columns to destination file names, so `EN`, `en` and
/// ` en ` all denote the same language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

// =============================================================================
// Tabular Record
// =============================================================================

/// One row of the CSV source of truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularRecord {
    /// Translation key (first column).
    pub key: String,
    /// Raw cell value per language column.
    pub values: IndexMap<LanguageCode, String>,
}

impl TabularRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: IndexMap::new(),
        }
    }

    /// Builder-style insertion, mostly for tests and fixtures.
    pub fn with_value(mut self, lang: &str, value: impl Into<String>) -> Self {
        self.values.insert(LanguageCode::new(lang), value.into());
        self
    }

    /// Cell value for a language, if the column exists.
    pub fn value(&self, lang: &LanguageCode) -> Option<&str> {
        self.values.get(lang).map(String::as_str)
    }
}

// =============================================================================
// File Content
// =============================================================================

/// Leaf value of a language file.
///
/// Values are carried opaquely: whatever type a file holds is written back
/// unchanged unless the CSV supplies a replacement, which is always text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
}

impl Scalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

/// Ordered, one-level content of a language file.
pub type FileTree = IndexMap<String, Scalar>;

/// One language file found in the destination tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationFile {
    /// Path as enumerated by the walker.
    pub path: PathBuf,
    /// File stem, lower-cased.
    pub lang: LanguageCode,
    /// Parsed content.
    pub contents: FileTree,
}

// =============================================================================
// Flat Entry
// =============================================================================

/// One (key, language) pair materialized from a [`DestinationFile`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatEntry {
    /// Key as written in the file, without directory prefix.
    pub key_in_file: String,
    /// Directory-prefixed, alias-substituted key matched against the CSV.
    pub effective_key: String,
    pub lang: LanguageCode,
    /// Owning file.
    pub filename: PathBuf,
    /// Value currently stored in the file.
    pub value: Scalar,
}

// =============================================================================
// Scope Alias
// =============================================================================

/// Literal substitution rule for effective keys: every occurrence of
/// `scope` is replaced by `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeAlias {
    pub alias: String,
    pub scope: String,
}

impl ScopeAlias {
    pub fn new(alias: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            scope: scope.into(),
        }
    }
}

impl FromStr for ScopeAlias {
    type Err = String;

    /// Parses `alias:scope`. The alias may be empty (strip the scope), the
    /// scope may not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (alias, scope) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid alias '{}', expected ALIAS:SCOPE", s))?;

        if scope.is_empty() {
            return Err(format!("invalid alias '{}', scope must not be empty", s));
        }

        Ok(ScopeAlias::new(alias, scope))
    }
}

impl fmt::Display for ScopeAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.alias, self.scope)
    }
}
