//! High-level pipeline API: CSV source → validated i18n JSON tree.
//!
//! This module combines every step: parsing the CSV, flattening the
//! destination tree, reconciling keys, propagating values and writing files.
//! Nothing is written unless every check passed.
//!
//! # Example
//!
//! ```rust,ignore
//! use csv2i18n::{sync, ConsoleLog, SyncOptions};
//!
//! let report = sync(&SyncOptions::default(), &ConsoleLog::default())?;
//! println!("{} keys in {} languages", report.keys, report.languages.len());
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReconcileError, SyncError, SyncResult};
use crate::logs::LogSink;
use crate::models::{LanguageCode, ScopeAlias};
use crate::parser::parse_source_file;
use crate::propagate::{plan_updates, propagate};
use crate::reconcile::{summarize, validate};
use crate::tree::{collect_files, flatten, load_destination};
use crate::writer::{render_all, write_all};

/// Default CSV source, relative to the working directory
pub const DEFAULT_SOURCE: &str = "source.csv";

/// Default destination tree, relative to the working directory
pub const DEFAULT_DEST_PATH: &str = "src/assets/i18n";

/// Default language file extension
pub const DEFAULT_EXTENSION: &str = "json";

/// Options for a synchronisation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    /// CSV source of truth
    pub source: PathBuf,

    /// Root of the per-language file tree
    pub dest_path: PathBuf,

    /// Substitutions applied to effective keys, in order
    pub aliases: Vec<ScopeAlias>,

    /// Sort keys inside each written file
    pub sort: bool,

    /// Extension of language files
    pub extension: String,

    /// Validate and render, but write nothing
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            dest_path: PathBuf::from(DEFAULT_DEST_PATH),
            aliases: Vec::new(),
            sort: true,
            extension: DEFAULT_EXTENSION.to_string(),
            dry_run: false,
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Distinct translation keys
    pub keys: usize,

    /// Languages found on both sides
    pub languages: Vec<LanguageCode>,

    /// Language files holding at least one key
    pub files: usize,

    /// Files rewritten (0 on dry run)
    pub files_written: usize,

    /// Values that differ from what the files held
    pub values_changed: usize,

    pub dry_run: bool,

    /// RFC 3339 start time
    pub started_at: String,

    pub elapsed_ms: i64,
}

/// Run the full pipeline.
///
/// Fails with the first error found. Every error except
/// [`SyncError::Write`] happens before any file is touched.
pub fn sync(options: &SyncOptions, log: &dyn LogSink) -> SyncResult<SyncReport> {
    let started = chrono::Utc::now();

    if !options.source.is_file() {
        return Err(SyncError::SourceNotFound(options.source.clone()));
    }
    if !options.dest_path.is_dir() {
        return Err(SyncError::DestinationNotFound(options.dest_path.clone()));
    }

    // Step 1: CSV source
    log.info(format!("📖 Reading source: {}", options.source.display()));
    let source = parse_source_file(&options.source)?;
    log.success(format!("Detected encoding: {}", source.encoding));
    log.success(format!("Detected separator: '{}'", format_delimiter(source.delimiter)));
    log.success(format!(
        "Read {} rows, key column '{}', languages [{}]",
        source.records.len(),
        source.key_column,
        join(&source.languages)
    ));

    // Step 2: Destination tree
    log.info(format!("📂 Scanning destination: {}", options.dest_path.display()));
    let files = collect_files(&options.dest_path, &options.extension)?;
    if files.is_empty() {
        log.error(format!("No .{} files found", options.extension));
        return Err(SyncError::EmptyDestination(options.dest_path.clone()));
    }
    let destination = load_destination(&files)?;

    for alias in &options.aliases {
        log.info_indent(format!("alias '{}' ← '{}'", alias.alias, alias.scope), 1);
    }
    let entries = flatten(&destination, &options.dest_path, &options.aliases)?;
    let summary = summarize(&entries);
    log.success(format!(
        "Found {} keys in {} files, languages [{}]",
        summary.keys,
        files.len(),
        join(&summary.languages)
    ));

    // Step 3: Reconcile
    log.info("🔍 Reconciling keys...");
    let correspondence = match validate(&entries, &source.records, &source.languages) {
        Ok(c) => c,
        Err(e) => {
            report_mismatch(&e, log);
            return Err(e.into());
        }
    };
    log.success(format!("{} keys x {} languages matched", summary.keys, summary.languages.len()));

    // Step 4: Propagate
    let updates = plan_updates(&correspondence, &source.records, &summary.languages)?;
    let values_changed = updates.count_changes(&entries);
    let outputs = propagate(&entries, &updates, options.sort);
    let rendered = render_all(&outputs)?;

    // Step 5: Write
    let files_written = if options.dry_run {
        log.warning(format!(
            "Dry run: {} files, {} values would change",
            rendered.len(),
            values_changed
        ));
        0
    } else {
        log.info("💾 Writing files...");
        let written = write_all(&rendered)?;
        log.success(format!("{} files written, {} values changed", written, values_changed));
        written
    };

    let elapsed = chrono::Utc::now() - started;

    Ok(SyncReport {
        keys: summary.keys,
        languages: summary.languages,
        files: summary.files,
        files_written,
        values_changed,
        dry_run: options.dry_run,
        started_at: started.to_rfc3339(),
        elapsed_ms: elapsed.num_milliseconds(),
    })
}

/// Log the offending data of a reconciliation failure
fn report_mismatch(err: &ReconcileError, log: &dyn LogSink) {
    match err {
        ReconcileError::LanguageSetMismatch { in_files, in_source } => {
            log.error("Languages do not match");
            log.error_indent(format!("in files:  [{}]", in_files.join(", ")), 1);
            log.error_indent(format!("in source: [{}]", in_source.join(", ")), 1);
        }
        ReconcileError::KeySetMismatch {
            only_in_source,
            only_in_destination,
        } => {
            log.error("Keys do not match");
            log.error_indent(format!("{} keys only in source:", only_in_source.len()), 1);
            for key in only_in_source {
                log.error_indent(key.as_str(), 2);
            }
            log.error_indent(format!("{} keys only in destination:", only_in_destination.len()), 1);
            for key in only_in_destination {
                log.error_indent(key.as_str(), 2);
            }
        }
        ReconcileError::KeyCardinalityMismatch {
            unique_keys,
            languages,
            entries,
            records,
            details,
        } => {
            log.error(format!(
                "Key counts do not line up: {} keys x {} languages, {} file entries, {} source rows",
                unique_keys, languages, entries, records
            ));
            for detail in details {
                log.error_indent(detail.as_str(), 1);
            }
        }
        other => log.error(other.to_string()),
    }
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

fn join(languages: &[LanguageCode]) -> String {
    languages
        .iter()
        .map(LanguageCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
