//! Tally CLI - Receipt OCR understanding pipeline
//!
//! Usage:
//!   tally parse --file receipt.txt     Parse OCR text into a receipt
//!   tally learn correct ...            Record a corrected item name
//!   tally learn stats                  Show learning statistics
//!   tally status                       Show database and backend status

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Parse {
            file,
            store,
            json,
            no_ai,
        } => {
            commands::cmd_parse(
                cli.db.as_deref(),
                file.as_deref(),
                store.as_deref(),
                json,
                no_ai,
            )
            .await
        }
        Commands::Learn { action } => {
            let db = commands::open_db(cli.db.as_deref())?;
            match action {
                LearnAction::Correct {
                    store,
                    original,
                    corrected,
                } => commands::cmd_learn_correct(&db, &store, &original, &corrected),
                LearnAction::Hide { store, original } => {
                    commands::cmd_learn_hide(&db, &store, &original)
                }
                LearnAction::Feedback { id, verdict } => {
                    commands::cmd_learn_feedback(&db, id, &verdict)
                }
                LearnAction::List { limit } => commands::cmd_learn_list(&db, limit),
                LearnAction::Stats => commands::cmd_learn_stats(&db),
                LearnAction::Reset { yes } => commands::cmd_learn_reset(&db, yes),
            }
        }
        Commands::Status => commands::cmd_status(cli.db.as_deref()),
    }
}
