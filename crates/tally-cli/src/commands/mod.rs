//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `parse` - Receipt parsing command
//! - `learn` - Learned-correction management commands
//! - `status` - Database and collaborator status command

pub mod learn;
pub mod parse;
pub mod status;

// Re-export command functions for main.rs
pub use learn::*;
pub use parse::*;
pub use status::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tally_core::db::Database;

/// Default database location under the platform data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tally").join("tally.db"))
        .unwrap_or_else(|| PathBuf::from("tally.db"))
}

/// Open the database, creating parent directories as needed
pub fn open_db(db_path: Option<&Path>) -> Result<Database> {
    let path = db_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_db_path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let path_str = path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
