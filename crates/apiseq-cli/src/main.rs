//! APISEQ CLI
//!
//! Curates corpora of generated API-sequence test candidates: parses
//! their metadata headers, scores them against per-library coverage
//! ledgers, and retains a bounded, dominance-free corpus per library.

#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]

use apiseq_cli::{
    format_decision, load_candidates, run_curation, score_file, summarize_store, write_outputs,
};
use apiseq_runner::CurationConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "apiseq")]
#[command(about = "API-sequence test corpus curation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a batch of candidates and write the curated corpus
    Run {
        /// Input directory: one subdirectory per target library
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory for the curated corpus
        #[arg(short, long, default_value = "corpus")]
        output: PathBuf,

        /// Path to a curation config YAML file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override: minimum retained candidates per library
        #[arg(long)]
        min_corpus: Option<usize>,

        /// Override: worker threads for across-library parallelism
        #[arg(long)]
        workers: Option<usize>,

        /// Keep rejected candidates in a sidecar directory
        #[arg(long)]
        keep_rejected: bool,

        /// Suppress per-candidate decision lines
        #[arg(short, long)]
        quiet: bool,
    },

    /// Score a single candidate file against an empty ledger
    Score {
        /// Candidate file (header plus source)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target library name
        #[arg(short, long)]
        library: String,
    },

    /// Summarize an existing corpus store
    Summarize {
        /// Corpus store root
        #[arg(value_name = "CORPUS")]
        corpus: PathBuf,
    },
}

fn build_config(
    config: Option<&PathBuf>,
    min_corpus: Option<usize>,
    workers: Option<usize>,
    keep_rejected: bool,
) -> Result<CurationConfig, String> {
    let mut cfg = match config {
        Some(path) => CurationConfig::from_file(path).map_err(|e| e.to_string())?,
        None => CurationConfig::default(),
    };
    if let Some(min_corpus) = min_corpus {
        cfg.min_corpus = min_corpus;
    }
    if let Some(workers) = workers {
        cfg.workers = workers;
    }
    cfg.keep_rejected |= keep_rejected;
    Ok(cfg)
}

fn cmd_run(
    input: &PathBuf,
    output: &PathBuf,
    cfg: CurationConfig,
    quiet: bool,
) -> Result<(), String> {
    let batch = load_candidates(input).map_err(|e| e.to_string())?;
    for skipped in &batch.skipped {
        eprintln!("[SKIP] {}: {}", skipped.path, skipped.reason);
    }
    println!(
        "Loaded {} candidate(s), skipped {}",
        batch.candidates.len(),
        batch.skipped.len()
    );

    let keep_rejected = cfg.keep_rejected;
    let report = run_curation(batch.candidates, cfg);
    for outcome in &report.outcomes {
        if !quiet {
            for decision in &outcome.decisions {
                println!("{}", format_decision(&outcome.library, decision));
            }
        }
        for error in &outcome.errors {
            eprintln!("[ERROR] lib={}: {error}", outcome.library);
        }
        println!(
            "{}: corpus={} branches={} triage={}",
            outcome.library,
            outcome.corpus.len(),
            outcome.unique_branches,
            outcome.triage.len()
        );
    }

    let written = write_outputs(&report, output, keep_rejected).map_err(|e| e.to_string())?;
    println!("Wrote {written} file(s) to {}", output.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            input,
            output,
            config,
            min_corpus,
            workers,
            keep_rejected,
            quiet,
        } => build_config(config.as_ref(), min_corpus, workers, keep_rejected)
            .and_then(|cfg| cmd_run(&input, &output, cfg, quiet)),
        Commands::Score { file, library } => score_file(&file, &library)
            .map(|json| println!("{json}"))
            .map_err(|e| e.to_string()),
        Commands::Summarize { corpus } => summarize_store(&corpus)
            .map(|table| print!("{table}"))
            .map_err(|e| e.to_string()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
