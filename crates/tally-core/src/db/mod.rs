//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `learning` - Pattern overrides, correction log, and verdict operations

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;

mod learning;

pub use learning::{PatternOverride, HIDE_SENTINEL};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because each pool
    /// connection would otherwise see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("tally_test_{}_{}.db", std::process::id(), id));
        let path = path.to_string_lossy().to_string();

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Learned pattern table consulted on every parse.
            -- corrected_text holds the hide sentinel when the user hid the item.
            CREATE TABLE IF NOT EXISTS pattern_overrides (
                id INTEGER PRIMARY KEY,
                store_name TEXT NOT NULL,
                original_text TEXT NOT NULL,
                corrected_text TEXT NOT NULL,
                correction_type TEXT NOT NULL,
                hit_count INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(store_name, original_text)
            );

            CREATE INDEX IF NOT EXISTS idx_pattern_overrides_lookup
                ON pattern_overrides(store_name, original_text);

            -- Append-only correction log, capped oldest-first by the writer
            CREATE TABLE IF NOT EXISTS correction_log (
                id INTEGER PRIMARY KEY,
                store_name TEXT NOT NULL,
                original_text TEXT NOT NULL,
                corrected_value TEXT NOT NULL,
                correction_type TEXT NOT NULL,
                user_verdict TEXT,
                content_hash TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_correction_log_store
                ON correction_log(store_name);
            CREATE INDEX IF NOT EXISTS idx_correction_log_created
                ON correction_log(created_at);
            "#,
        )?;

        Ok(())
    }

    /// Clear all learned data: pattern overrides and the correction log
    pub fn reset_learning(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            DELETE FROM correction_log;
            DELETE FROM pattern_overrides;
            "#,
        )?;

        info!("Learning data reset complete");
        Ok(())
    }
}
