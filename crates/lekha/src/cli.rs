//! Clap argument definitions and command handlers.
//!
//! The CLI is the reference collaborator for `lekha_core`: it drives the
//! annotator through the same calls a table UI would (open, write, save,
//! suggestion requests) and prints the notifications the core emits.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use lekha_core::annotator::Annotator;
use lekha_core::events::StoreEvent;
use lekha_core::row::{CellValue, Column, TextColumn};
use lekha_core::transliterate::{Completion, CompletionSession};
use lekha_core::wordcount::WordCounts;

#[derive(Parser)]
#[command(
    name = "lekha",
    version,
    about = "Edit-tracking engine for speech-transcript annotation"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show row and word-count statistics for a transcript
    Stats {
        /// Transcript document (XML)
        file: PathBuf,
    },

    /// Write a value into a cell and save the transcript
    Set {
        /// Transcript document (XML)
        file: PathBuf,
        /// Row index (0-based)
        row: usize,
        /// Target column
        #[arg(value_enum)]
        column: ColumnArg,
        /// New cell value (an integer for the quality columns)
        value: String,
    },

    /// Query transliteration suggestions for a word prefix
    Suggest {
        /// Word prefix to complete
        prefix: String,
        /// Language code, e.g. "hi"
        #[arg(default_value = "hi")]
        lang: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColumnArg {
    Audio,
    Transcript,
    Mispronounced,
    Tags,
    SoundQuality,
    AsrQuality,
}

impl From<ColumnArg> for Column {
    fn from(arg: ColumnArg) -> Self {
        match arg {
            ColumnArg::Audio => Column::Audio,
            ColumnArg::Transcript => Column::Transcript,
            ColumnArg::Mispronounced => Column::Mispronounced,
            ColumnArg::Tags => Column::Tags,
            ColumnArg::SoundQuality => Column::SoundQuality,
            ColumnArg::AsrQuality => Column::AsrQuality,
        }
    }
}

/// Main entry point for the CLI
pub fn run_cli() {
    env_logger::init();
    let cli = Cli::parse();

    let success = match cli.command {
        Commands::Stats { file } => handle_stats(&file),
        Commands::Set {
            file,
            row,
            column,
            value,
        } => handle_set(&file, row, column.into(), value),
        Commands::Suggest { prefix, lang } => handle_suggest(&prefix, &lang),
    };

    if !success {
        std::process::exit(1);
    }
}

fn print_counts(counts: &WordCounts) {
    println!("Total Transcript words: {}", counts.transcript_total);
    println!("Total Mispronounced words: {}", counts.mispronounced_total);
    println!("Total Tagged words: {}", counts.tagged_total);
    println!("Total Transcript edited words: {}", counts.transcript_edited);
    println!(
        "Total Mispronounced edited words: {}",
        counts.mispronounced_edited
    );
    println!("Total Tagged edited words: {}", counts.tagged_edited);
}

fn handle_stats(file: &Path) -> bool {
    let mut annotator = Annotator::new();
    let summary = match annotator.open(file) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    for warning in &summary.warnings {
        eprintln!("⚠ {warning}");
    }

    println!("Rows: {}", summary.rows);
    print_counts(&summary.counts);

    let store = annotator.store();
    println!(
        "Edits in this file (recomputed): transcript {}, mispronounced {}, tags {}",
        store.recompute_edited_words(TextColumn::Transcript),
        store.recompute_edited_words(TextColumn::Mispronounced),
        store.recompute_edited_words(TextColumn::Tags)
    );
    true
}

fn handle_set(file: &Path, row: usize, column: Column, value: String) -> bool {
    let mut annotator = Annotator::new();
    if let Err(e) = annotator.open(file) {
        eprintln!("✗ {}", e);
        return false;
    }

    // Echo the notifications a table UI would repaint from
    annotator.subscribe(Arc::new(|event| match event {
        StoreEvent::EditedWordsDelta { column, delta } => {
            println!("edited-words delta on {column:?}: {delta:+}");
        }
        StoreEvent::CellChanged { row, column } => {
            println!("cell changed: row {row}, {column:?}");
        }
        _ => {}
    }));

    let cell_value = match column {
        Column::SoundQuality | Column::AsrQuality => match value.parse::<i64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => {
                eprintln!("✗ '{value}' is not a number");
                return false;
            }
        },
        _ => CellValue::Text(value),
    };

    if !annotator.write(row, column, cell_value) {
        eprintln!("✗ nothing written: row out of range or wrong value type");
        return false;
    }

    if let Some(text_column) = column.as_text() {
        let history = annotator.store().history_of(row, text_column);
        println!(
            "cell history: {} records, {} active words across the column",
            history.len(),
            annotator.store().total_active_words(text_column)
        );
    }

    match annotator.save() {
        Ok(saved) => {
            println!("Saved {} rows to '{}'", saved.rows, file.display());
            print_counts(&saved.counts);
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn handle_suggest(prefix: &str, lang: &str) -> bool {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    let mut session = CompletionSession::google();
    let outcome = runtime.block_on(session.request(prefix, lang));
    match outcome {
        Completion::Replied(candidates) if candidates.is_empty() => {
            println!("No suggestions for '{prefix}'");
            true
        }
        Completion::Replied(candidates) => {
            for (rank, candidate) in candidates.iter().enumerate() {
                println!("{:>2}. {candidate}", rank + 1);
            }
            true
        }
        Completion::TimedOut => {
            eprintln!("✗ Reply timeout, network connection is slow or inaccessible");
            false
        }
        Completion::Failed(advisory) => {
            eprintln!("✗ {advisory}");
            false
        }
        Completion::Cancelled => {
            eprintln!("✗ nothing requested");
            false
        }
    }
}
