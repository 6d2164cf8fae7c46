//! Error types for the csv2i18n synchronisation pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - CSV source parsing errors
//! - [`TreeError`] - Destination tree walking and parsing errors
//! - [`ReconcileError`] - Key/language reconciliation failures
//! - [`SyncError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading the tabular source.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the file content.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Invalid CSV structure.
    #[error("Invalid CSV format: {0}")]
    Parse(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Header row has no key column.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        match err.position() {
            Some(pos) => CsvError::Parse(format!("line {}: {}", pos.line(), err)),
            None => CsvError::Parse(err.to_string()),
        }
    }
}

// =============================================================================
// Destination Tree Errors
// =============================================================================

/// Errors while walking or reading the destination tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Directory traversal failed.
    #[error("Cannot walk destination tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// A destination file could not be read.
    #[error("Cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A destination file is not a flat object of scalar values.
    #[error("Malformed file '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// A destination file does not live under the destination root.
    #[error("'{}' is not under '{}'", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

// =============================================================================
// Reconciliation Errors
// =============================================================================

/// Mismatches between the CSV source and the destination tree.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Languages found in files differ from the CSV header languages.
    #[error("Language mismatch: files have [{}], source has [{}]", .in_files.join(", "), .in_source.join(", "))]
    LanguageSetMismatch {
        in_files: Vec<String>,
        in_source: Vec<String>,
    },

    /// Keys present on only one side.
    #[error(
        "Key mismatch: only in source [{}]; only in destination [{}]",
        .only_in_source.join(", "),
        .only_in_destination.join(", ")
    )]
    KeySetMismatch {
        only_in_source: Vec<String>,
        only_in_destination: Vec<String>,
    },

    /// Key sets agree but totals do not, which means duplicated or missing entries.
    #[error(
        "Key count mismatch: {unique_keys} unique keys x {languages} languages, \
         {entries} file entries, {records} source rows; {}",
        .details.join("; ")
    )]
    KeyCardinalityMismatch {
        unique_keys: usize,
        languages: usize,
        entries: usize,
        records: usize,
        details: Vec<String>,
    },

    /// A (key, language) pair did not resolve to exactly one file entry.
    #[error("Key '{key}' [{lang}] resolved to {matches} file entries, expected exactly 1")]
    AmbiguousCorrespondence {
        key: String,
        lang: String,
        matches: usize,
    },
}

// =============================================================================
// Sync Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::pipeline::sync`]. Every variant
/// is fatal for the run and raised before any destination file is rewritten,
/// except [`SyncError::Write`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// The CSV source does not exist.
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The destination directory does not exist.
    #[error("Destination directory not found: {}", .0.display())]
    DestinationNotFound(PathBuf),

    /// The destination directory holds no language files.
    #[error("No language files found in {}", .0.display())]
    EmptyDestination(PathBuf),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Destination tree error.
    #[error("Destination error: {0}")]
    Tree(#[from] TreeError),

    /// Reconciliation failure.
    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    /// A tree could not be serialized.
    #[error("Cannot render '{}': {source}", .path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A destination file could not be written.
    #[error("Cannot write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for destination tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Result type for reconciliation.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Result type for pipeline operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> SyncError
        let csv_err = CsvError::EmptyFile;
        let sync_err: SyncError = csv_err.into();
        assert!(sync_err.to_string().contains("empty"));

        // ReconcileError -> SyncError
        let err = ReconcileError::KeySetMismatch {
            only_in_source: vec!["nav.home".into()],
            only_in_destination: vec![],
        };
        let sync_err: SyncError = err.into();
        assert!(sync_err.to_string().contains("nav.home"));
    }

    #[test]
    fn test_language_mismatch_lists_both_sides() {
        let err = ReconcileError::LanguageSetMismatch {
            in_files: vec!["en".into(), "fr".into()],
            in_source: vec!["en".into(), "de".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("files have [en, fr]"));
        assert!(msg.contains("source has [en, de]"));
    }

    #[test]
    fn test_tree_parse_error_names_path() {
        let err = TreeError::Parse {
            path: PathBuf::from("i18n/nav/en.json"),
            message: "expected a flat object".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("i18n/nav/en.json"));
        assert!(msg.contains("flat object"));
    }
}
