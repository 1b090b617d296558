//! Learned-correction operations
//!
//! Two structures back the learning loop: `pattern_overrides` is the live
//! lookup table consulted during parsing (one row per store + original text),
//! and `correction_log` is the append-only history the stats are derived
//! from. Both are written in one transaction so a crash can't leave an
//! override without its log entry.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{
    CorrectionType, LearningRecord, LearningStats, NewLearningRecord, UserVerdict,
};

/// Sentinel stored as the corrected text when the user hid an item
pub const HIDE_SENTINEL: &str = "__HIDDEN__";

/// Oldest log rows are evicted past this count
const FEEDBACK_CAP: i64 = 1000;

/// One live pattern-table row
#[derive(Debug, Clone)]
pub struct PatternOverride {
    pub id: i64,
    pub store_name: String,
    pub original_text: String,
    pub corrected_text: String,
    pub correction_type: CorrectionType,
    pub hit_count: i64,
}

impl PatternOverride {
    /// True when this override suppresses the item instead of renaming it
    pub fn is_hidden(&self) -> bool {
        self.corrected_text == HIDE_SENTINEL
    }
}

impl Database {
    /// Record a user correction: upsert the live override and append to the
    /// log in one transaction, evicting the oldest log rows past the cap.
    ///
    /// Returns the log row id.
    pub fn record_correction(&self, record: &NewLearningRecord) -> Result<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let store = record.store_name.to_uppercase();

        tx.execute(
            r#"
            INSERT INTO pattern_overrides (
                store_name, original_text, corrected_text, correction_type
            ) VALUES (?, ?, ?, ?)
            ON CONFLICT(store_name, original_text) DO UPDATE SET
                corrected_text = excluded.corrected_text,
                correction_type = excluded.correction_type,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![
                store,
                record.original_text,
                record.corrected_value,
                record.correction_type.as_str(),
            ],
        )?;

        tx.execute(
            r#"
            INSERT INTO correction_log (
                store_name, original_text, corrected_value, correction_type, content_hash
            ) VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                store,
                record.original_text,
                record.corrected_value,
                record.correction_type.as_str(),
                record.content_hash,
            ],
        )?;
        let log_id = tx.last_insert_rowid();

        tx.execute(
            r#"
            DELETE FROM correction_log
            WHERE id NOT IN (SELECT id FROM correction_log ORDER BY id DESC LIMIT ?)
            "#,
            params![FEEDBACK_CAP],
        )?;

        tx.commit()?;

        debug!(
            store = %store,
            original = %record.original_text,
            correction_type = %record.correction_type,
            "correction recorded"
        );
        Ok(log_id)
    }

    /// Record that the user hid an item on this store's receipts
    pub fn record_hidden(
        &self,
        store_name: &str,
        original_text: &str,
        content_hash: Option<String>,
    ) -> Result<i64> {
        self.record_correction(&NewLearningRecord {
            original_text: original_text.to_string(),
            store_name: store_name.to_string(),
            corrected_value: HIDE_SENTINEL.to_string(),
            correction_type: CorrectionType::ItemHidden,
            content_hash,
        })
    }

    /// Look up a learned override for this exact store + raw text pair.
    ///
    /// A hit bumps the override's hit count.
    pub fn lookup_override(
        &self,
        store_name: &str,
        original_text: &str,
    ) -> Result<Option<PatternOverride>> {
        let conn = self.conn()?;
        let store = store_name.to_uppercase();

        let found = conn
            .query_row(
                r#"
                SELECT id, store_name, original_text, corrected_text, correction_type, hit_count
                FROM pattern_overrides
                WHERE store_name = ? AND original_text = ?
                "#,
                params![store, original_text],
                |row| {
                    let correction_type_str: String = row.get(4)?;
                    Ok(PatternOverride {
                        id: row.get(0)?,
                        store_name: row.get(1)?,
                        original_text: row.get(2)?,
                        corrected_text: row.get(3)?,
                        correction_type: correction_type_str
                            .parse()
                            .unwrap_or(CorrectionType::UserEdit),
                        hit_count: row.get(5)?,
                    })
                },
            )
            .optional()?;

        if let Some(ref hit) = found {
            conn.execute(
                "UPDATE pattern_overrides SET hit_count = hit_count + 1 WHERE id = ?",
                params![hit.id],
            )?;
        }

        Ok(found)
    }

    /// Attach an explicit correct/incorrect verdict to a log entry
    pub fn record_verdict(&self, log_id: i64, verdict: UserVerdict) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE correction_log SET user_verdict = ? WHERE id = ?",
            params![verdict.as_str(), log_id],
        )?;
        if updated == 0 {
            return Err(crate::error::Error::NotFound(format!(
                "correction log entry {}",
                log_id
            )));
        }

        Ok(())
    }

    /// Most recent log entries, newest first
    pub fn list_corrections(&self, limit: i64) -> Result<Vec<LearningRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, original_text, store_name, corrected_value, correction_type,
                   user_verdict, content_hash, created_at
            FROM correction_log
            ORDER BY id DESC
            LIMIT ?
            "#,
        )?;

        let records = stmt
            .query_map(params![limit], |row| {
                let correction_type_str: String = row.get(4)?;
                let verdict_str: Option<String> = row.get(5)?;
                let created_at_str: String = row.get(7)?;

                Ok(LearningRecord {
                    id: row.get(0)?,
                    original_text: row.get(1)?,
                    store_name: row.get(2)?,
                    corrected_value: row.get(3)?,
                    correction_type: correction_type_str
                        .parse()
                        .unwrap_or(CorrectionType::UserEdit),
                    user_verdict: verdict_str.and_then(|s| s.parse().ok()),
                    content_hash: row.get(6)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Aggregate statistics over the correction log
    pub fn learning_stats(&self) -> Result<LearningStats> {
        let conn = self.conn()?;

        let total_feedback: i64 =
            conn.query_row("SELECT COUNT(*) FROM correction_log", [], |row| row.get(0))?;

        let correct: i64 = conn.query_row(
            "SELECT COUNT(*) FROM correction_log WHERE user_verdict = 'correct'",
            [],
            |row| row.get(0),
        )?;
        let incorrect: i64 = conn.query_row(
            "SELECT COUNT(*) FROM correction_log WHERE user_verdict = 'incorrect'",
            [],
            |row| row.get(0),
        )?;
        let accuracy = if correct + incorrect > 0 {
            Some(correct as f64 / (correct + incorrect) as f64)
        } else {
            None
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT correction_type, COUNT(*) FROM correction_log
            GROUP BY correction_type ORDER BY COUNT(*) DESC
            "#,
        )?;
        let by_correction_type = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<(String, i64)>, _>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT store_name, COUNT(*) FROM correction_log
            GROUP BY store_name ORDER BY COUNT(*) DESC LIMIT 5
            "#,
        )?;
        let most_corrected_stores = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<(String, i64)>, _>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT original_text, COUNT(*) FROM correction_log
            GROUP BY original_text ORDER BY COUNT(*) DESC LIMIT 5
            "#,
        )?;
        let most_corrected_texts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<(String, i64)>, _>>()?;

        Ok(LearningStats {
            total_feedback,
            accuracy,
            by_correction_type,
            most_corrected_stores,
            most_corrected_texts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(store: &str, original: &str, corrected: &str) -> NewLearningRecord {
        NewLearningRecord {
            original_text: original.to_string(),
            store_name: store.to_string(),
            corrected_value: corrected.to_string(),
            correction_type: CorrectionType::UserEdit,
            content_hash: None,
        }
    }

    #[test]
    fn test_record_and_lookup_override() {
        let db = Database::in_memory().unwrap();

        db.record_correction(&edit("Safeway", "G-P MUSTARD", "Grey Poupon Mustard"))
            .unwrap();

        // store name matching is case-insensitive
        let hit = db.lookup_override("safeway", "G-P MUSTARD").unwrap().unwrap();
        assert_eq!(hit.corrected_text, "Grey Poupon Mustard");
        assert_eq!(hit.correction_type, CorrectionType::UserEdit);
        assert!(!hit.is_hidden());

        assert!(db.lookup_override("SAFEWAY", "OTHER").unwrap().is_none());
        assert!(db.lookup_override("KROGER", "G-P MUSTARD").unwrap().is_none());
    }

    #[test]
    fn test_lookup_bumps_hit_count() {
        let db = Database::in_memory().unwrap();
        db.record_correction(&edit("SAFEWAY", "WHP CRM", "Whipped Cream"))
            .unwrap();

        db.lookup_override("SAFEWAY", "WHP CRM").unwrap();
        let second = db.lookup_override("SAFEWAY", "WHP CRM").unwrap().unwrap();
        assert_eq!(second.hit_count, 1);
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let db = Database::in_memory().unwrap();
        db.record_correction(&edit("SAFEWAY", "LUC MILK", "Lucerne Milk"))
            .unwrap();
        db.record_correction(&edit("SAFEWAY", "LUC MILK", "Lucerne Whole Milk"))
            .unwrap();

        let hit = db.lookup_override("SAFEWAY", "LUC MILK").unwrap().unwrap();
        assert_eq!(hit.corrected_text, "Lucerne Whole Milk");

        // both writes landed in the log
        let stats = db.learning_stats().unwrap();
        assert_eq!(stats.total_feedback, 2);
    }

    #[test]
    fn test_hide_sentinel() {
        let db = Database::in_memory().unwrap();
        db.record_hidden("SAFEWAY", "LND O LKS BUTTER", None).unwrap();

        let hit = db
            .lookup_override("SAFEWAY", "LND O LKS BUTTER")
            .unwrap()
            .unwrap();
        assert!(hit.is_hidden());
        assert_eq!(hit.correction_type, CorrectionType::ItemHidden);
    }

    #[test]
    fn test_log_capped_fifo() {
        let db = Database::in_memory().unwrap();

        for i in 0..1005 {
            db.record_correction(&edit("SAFEWAY", &format!("ITEM {}", i), "Item"))
                .unwrap();
        }

        let stats = db.learning_stats().unwrap();
        assert_eq!(stats.total_feedback, 1000);

        // newest entries survive
        let recent = db.list_corrections(1).unwrap();
        assert_eq!(recent[0].original_text, "ITEM 1004");

        // oldest were evicted from the log, but overrides are untouched
        assert!(db.lookup_override("SAFEWAY", "ITEM 0").unwrap().is_some());
    }

    #[test]
    fn test_verdicts_and_accuracy() {
        let db = Database::in_memory().unwrap();

        let a = db
            .record_correction(&edit("SAFEWAY", "A", "Alpha"))
            .unwrap();
        let b = db
            .record_correction(&edit("SAFEWAY", "B", "Beta"))
            .unwrap();
        let c = db
            .record_correction(&edit("SAFEWAY", "C", "Gamma"))
            .unwrap();

        db.record_verdict(a, UserVerdict::Correct).unwrap();
        db.record_verdict(b, UserVerdict::Correct).unwrap();
        db.record_verdict(c, UserVerdict::Incorrect).unwrap();

        let stats = db.learning_stats().unwrap();
        assert_eq!(stats.total_feedback, 3);
        let accuracy = stats.accuracy.unwrap();
        assert!((accuracy - 2.0 / 3.0).abs() < 1e-9);

        assert!(db.record_verdict(9999, UserVerdict::Correct).is_err());
    }

    #[test]
    fn test_stats_without_verdicts() {
        let db = Database::in_memory().unwrap();
        db.record_correction(&edit("SAFEWAY", "A", "Alpha")).unwrap();

        let stats = db.learning_stats().unwrap();
        assert!(stats.accuracy.is_none());
        assert_eq!(stats.by_correction_type[0].0, "user_edit");
    }

    #[test]
    fn test_reset_learning() {
        let db = Database::in_memory().unwrap();
        db.record_correction(&edit("SAFEWAY", "A", "Alpha")).unwrap();
        db.reset_learning().unwrap();

        assert!(db.lookup_override("SAFEWAY", "A").unwrap().is_none());
        assert_eq!(db.learning_stats().unwrap().total_feedback, 0);
    }
}
