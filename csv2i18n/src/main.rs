//! csv2i18n CLI - Populate i18n JSON files from a CSV source
//!
//! # Commands
//!
//! ```bash
//! csv2i18n                                  # same as `csv2i18n json`
//! csv2i18n json -s source.csv -d src/assets/i18n
//! csv2i18n json -a n:pages.nav. --sort false
//! csv2i18n check                            # validate only, write nothing
//! ```
//!
//! Options may also be set in the environment or a `.env` file:
//! `CSV2I18N_SOURCE`, `CSV2I18N_DEST`, `CSV2I18N_SORT`, `CSV2I18N_EXT`.

use clap::{ArgAction, Args, Parser, Subcommand};
use csv2i18n::pipeline::{resolve, DEFAULT_DEST_PATH, DEFAULT_EXTENSION, DEFAULT_SOURCE};
use csv2i18n::{sync, ConsoleLog, ScopeAlias, SyncOptions, SyncReport};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "csv2i18n", version)]
#[command(about = "Populate i18n JSON files from a CSV source", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    args: SyncArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate JSON files from the CSV (default)
    Json(SyncArgs),

    /// Validate the CSV against the JSON files without writing
    Check(SyncArgs),
}

#[derive(Args, Debug, Clone)]
struct SyncArgs {
    /// Path to the source CSV file
    #[arg(short, long, env = "CSV2I18N_SOURCE", default_value = DEFAULT_SOURCE)]
    source: PathBuf,

    /// Path to the folder containing i18n JSON files
    #[arg(short, long = "dest-path", env = "CSV2I18N_DEST", default_value = DEFAULT_DEST_PATH)]
    dest_path: PathBuf,

    /// Key scope alias, applied in the order given
    #[arg(short, long = "alias", value_name = "ALIAS:SCOPE")]
    aliases: Vec<ScopeAlias>,

    /// Sort keys in written files
    #[arg(long, env = "CSV2I18N_SORT", default_value_t = true, action = ArgAction::Set)]
    sort: bool,

    /// Extension of language files
    #[arg(long = "ext", env = "CSV2I18N_EXT", default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// Validate and render, but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Hide progress messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let (args, check) = match cli.command {
        Some(Commands::Json(args)) => (args, false),
        Some(Commands::Check(args)) => (args, true),
        None => (cli.args, false),
    };

    if let Err(e) = run(args, check) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: SyncArgs, check: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;

    let options = SyncOptions {
        source: resolve(&cwd, &args.source),
        dest_path: resolve(&cwd, &args.dest_path),
        aliases: args.aliases,
        sort: args.sort,
        extension: args.extension,
        dry_run: args.dry_run || check,
    };

    eprintln!("📄 Source: {}", options.source.display());
    eprintln!("📁 Destination: {}", options.dest_path.display());

    let log = ConsoleLog::new(args.quiet);
    let report = sync(&options, &log)?;

    print_summary(&report);

    if let Some(path) = args.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(&path, json)?;
        eprintln!("💾 Report written to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &SyncReport) {
    let languages: Vec<&str> = report.languages.iter().map(|l| l.as_str()).collect();

    eprintln!();
    eprintln!("   Keys: {}", report.keys);
    eprintln!("   Languages: {}", languages.join(", "));
    eprintln!("   Files: {}", report.files);
    if report.dry_run {
        eprintln!("   Values to change: {}", report.values_changed);
    } else {
        eprintln!("   Files written: {}", report.files_written);
        eprintln!("   Values changed: {}", report.values_changed);
    }
    eprintln!("\n✨ Done in {} ms", report.elapsed_ms);
}
