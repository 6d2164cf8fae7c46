//! # csv2i18n - CSV translation table to i18n JSON tree
//!
//! csv2i18n keeps a tree of per-language JSON files in sync with a single
//! CSV source of truth (one row per key, one column per language).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐
//! │ source.csv  │────▶│    Parser    │─────┐
//! │ (ISO/UTF8)  │     │  (auto-enc)  │     ▼
//! └─────────────┘     └──────────────┘   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! ┌─────────────┐     ┌──────────────┐   │  Reconciler  │──▶│  Propagator  │──▶│    Writer    │
//! │ i18n/**.json│────▶│  Flattener   │──▶│ (abort on any│   │ (pure, one   │   │ (temp+rename)│
//! │             │     │(prefix+alias)│   │   mismatch)  │   │ tree / file) │   │              │
//! └─────────────┘     └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csv2i18n::{sync, ConsoleLog, SyncOptions};
//!
//! fn main() {
//!     let report = sync(&SyncOptions::default(), &ConsoleLog::default()).unwrap();
//!     println!("Synced {} keys", report.keys);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (TabularRecord, FlatEntry, ScopeAlias)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`tree`] - Destination tree walking and flattening
//! - [`reconcile`] - Key and language validation
//! - [`propagate`] - Value propagation and regrouping
//! - [`writer`] - JSON rendering and file replacement
//! - [`pipeline`] - End-to-end synchronisation
//! - [`logs`] - Injected leveled logging

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Reading
pub mod parser;
pub mod tree;

// Reconciliation and propagation
pub mod propagate;
pub mod reconcile;

// Output
pub mod writer;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, ReconcileError, SyncError, TreeError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    DestinationFile,
    FileTree,
    FlatEntry,
    LanguageCode,
    Scalar,
    ScopeAlias,
    TabularRecord,
};

// =============================================================================
// Re-exports - Logging
// =============================================================================

pub use logs::{ConsoleLog, LogEntry, LogLevel, LogSink, MemoryLog};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes_auto,
    parse_source_file,
    parse_source_str,
    TabularSource,
};

// =============================================================================
// Re-exports - Tree, Reconcile, Propagate
// =============================================================================

pub use tree::{apply_aliases, collect_files, flatten, key_prefix, load_destination, parse_tree};

pub use reconcile::{summarize, validate, Correspondence, KeySummary};

pub use propagate::{plan_updates, propagate, regroup, OutputFile, UpdateTable};

pub use writer::render_tree;

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{sync, SyncOptions, SyncReport};
