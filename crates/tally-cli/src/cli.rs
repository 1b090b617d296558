//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Make sense of grocery receipt OCR text
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Receipt OCR understanding and learning pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse OCR text into a structured receipt
    Parse {
        /// Text file to parse (reads stdin if not given)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Store name hint, overrides identification
        #[arg(short, long)]
        store: Option<String>,

        /// Emit the parsed receipt as JSON
        #[arg(long)]
        json: bool,

        /// Skip the AI collaborator even when one is configured
        #[arg(long)]
        no_ai: bool,
    },

    /// Manage learned corrections
    Learn {
        #[command(subcommand)]
        action: LearnAction,
    },

    /// Show database and collaborator status
    Status,
}

#[derive(Subcommand)]
pub enum LearnAction {
    /// Record a corrected item name for a store
    Correct {
        /// Store the correction applies to
        #[arg(short, long)]
        store: String,

        /// Raw item text as printed on the receipt
        original: String,

        /// Corrected display name
        corrected: String,
    },

    /// Hide an item for a store on every future parse
    Hide {
        /// Store the suppression applies to
        #[arg(short, long)]
        store: String,

        /// Raw item text as printed on the receipt
        original: String,
    },

    /// Record a verdict on a stored correction
    Feedback {
        /// Correction log id (from `tally learn list`)
        id: i64,

        /// Verdict: correct or incorrect
        verdict: String,
    },

    /// List recent corrections
    List {
        /// Maximum entries to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Show learning statistics
    Stats,

    /// Delete all learned corrections and feedback
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}
