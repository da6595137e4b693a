//! purrtts command-line interface.
//!
//! Covers the text side of the pipeline (phonemize, tokenize, batch) and
//! voice-blob inspection; model execution needs host-supplied sessions and
//! is not reachable from here.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// purrtts developer CLI
#[derive(Debug, Parser)]
#[command(name = "purrtts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert text to an IPA phoneme string
    Phonemize {
        /// Input text or file path (use @file.txt for file input)
        input: String,
    },

    /// Tokenize text or phonemes into model input ids
    Tokenize {
        /// Input text or file path (use @file.txt for file input)
        input: String,

        /// Tokenizer to use: "fixed" phoneme table or "unigram"
        #[arg(long, default_value = "fixed")]
        tokenizer: String,

        /// Binary vocabulary file (required for the unigram tokenizer)
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Phonemize before tokenizing (fixed tokenizer only)
        #[arg(long)]
        phonemize: bool,
    },

    /// Show how text splits into per-call token batches
    Batch {
        /// Input text or file path (use @file.txt for file input)
        input: String,

        /// Token budget per model call
        #[arg(long, default_value_t = 150)]
        max_tokens: usize,
    },

    /// Inspect a persisted voice blob
    Voice {
        /// Path to a .voice file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    runtime::tracing_setup::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Phonemize { input } => commands::phonemize::run(&read_input(&input)?),
        Commands::Tokenize {
            input,
            tokenizer,
            vocab,
            phonemize,
        } => commands::tokenize::run(&read_input(&input)?, &tokenizer, vocab.as_deref(), phonemize),
        Commands::Batch { input, max_tokens } => {
            commands::batch::run(&read_input(&input)?, max_tokens)
        }
        Commands::Voice { path } => commands::voice::run(&path),
    }
}

/// Resolve the `@file` input convention.
fn read_input(input: &str) -> Result<String> {
    if let Some(path) = input.strip_prefix('@') {
        Ok(std::fs::read_to_string(path)?)
    } else {
        Ok(input.to_string())
    }
}
