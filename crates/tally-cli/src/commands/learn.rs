//! Learned-correction management commands

use anyhow::{bail, Result};
use tally_core::db::Database;
use tally_core::models::{CorrectionType, NewLearningRecord, UserVerdict};

use super::truncate;

pub fn cmd_learn_correct(
    db: &Database,
    store: &str,
    original: &str,
    corrected: &str,
) -> Result<()> {
    let id = db.record_correction(&NewLearningRecord {
        original_text: original.to_string(),
        store_name: store.to_string(),
        corrected_value: corrected.to_string(),
        correction_type: CorrectionType::UserEdit,
        content_hash: None,
    })?;

    println!(
        "✅ Learned: \"{}\" → \"{}\" at {} (log id {})",
        original,
        corrected,
        store.to_uppercase(),
        id
    );
    Ok(())
}

pub fn cmd_learn_hide(db: &Database, store: &str, original: &str) -> Result<()> {
    let id = db.record_hidden(store, original, None)?;
    println!(
        "✅ \"{}\" will be hidden at {} (log id {})",
        original,
        store.to_uppercase(),
        id
    );
    Ok(())
}

pub fn cmd_learn_feedback(db: &Database, id: i64, verdict: &str) -> Result<()> {
    let verdict: UserVerdict = match verdict.parse() {
        Ok(v) => v,
        Err(e) => bail!("{} (expected: correct, incorrect)", e),
    };

    db.record_verdict(id, verdict)?;
    println!("✅ Marked correction {} as {}", id, verdict.as_str());
    Ok(())
}

pub fn cmd_learn_list(db: &Database, limit: i64) -> Result<()> {
    let records = db.list_corrections(limit)?;

    if records.is_empty() {
        println!("No corrections recorded yet");
        return Ok(());
    }

    println!();
    println!(
        "   {:>5}  {:<10}  {:<24}  {:<24}  {:<14}  {}",
        "ID", "STORE", "ORIGINAL", "CORRECTED", "TYPE", "VERDICT"
    );
    for r in &records {
        let verdict = r
            .user_verdict
            .map(|v| v.as_str())
            .unwrap_or("-");
        println!(
            "   {:>5}  {:<10}  {:<24}  {:<24}  {:<14}  {}",
            r.id,
            truncate(&r.store_name, 10),
            truncate(&r.original_text, 24),
            truncate(&r.corrected_value, 24),
            r.correction_type.as_str(),
            verdict
        );
    }
    println!();
    Ok(())
}

pub fn cmd_learn_stats(db: &Database) -> Result<()> {
    let stats = db.learning_stats()?;

    println!();
    println!("📊 Learning Statistics");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Feedback entries: {}", stats.total_feedback);
    match stats.accuracy {
        Some(acc) => println!("   Accuracy: {:.1}%", acc * 100.0),
        None => println!("   Accuracy: (no verdicts yet)"),
    }

    if !stats.by_correction_type.is_empty() {
        println!();
        println!("   By type:");
        for (kind, count) in &stats.by_correction_type {
            println!("     {:<16} {}", kind, count);
        }
    }

    if !stats.most_corrected_stores.is_empty() {
        println!();
        println!("   Most corrected stores:");
        for (store, count) in &stats.most_corrected_stores {
            println!("     {:<16} {}", store, count);
        }
    }

    if !stats.most_corrected_texts.is_empty() {
        println!();
        println!("   Most corrected items:");
        for (text, count) in &stats.most_corrected_texts {
            println!("     {:<32} {}", truncate(text, 32), count);
        }
    }

    println!();
    Ok(())
}

pub fn cmd_learn_reset(db: &Database, yes: bool) -> Result<()> {
    if !yes {
        println!("⚠️  This deletes every learned correction and feedback entry.");
        println!("   Re-run with --yes to confirm.");
        return Ok(());
    }

    db.reset_learning()?;
    println!("✅ Learning store reset");
    Ok(())
}
