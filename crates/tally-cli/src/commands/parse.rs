//! Receipt parsing command

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tally_core::ai::AiClient;
use tally_core::geocode::GeocodeClient;
use tally_core::models::{ParsedReceipt, SuggestedAction};
use tally_core::pipeline::ReceiptParser;

use super::{open_db, truncate};

pub async fn cmd_parse(
    db_path: Option<&Path>,
    file: Option<&Path>,
    store: Option<&str>,
    json: bool,
    no_ai: bool,
) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let db = open_db(db_path)?;
    let ai = if no_ai { None } else { AiClient::from_env() };
    let geocoder = GeocodeClient::from_env();
    let parser = ReceiptParser::with_collaborators(db, ai, geocoder);

    let receipt = parser.parse(&text, store).await?;

    if json {
        let content_hash = hex::encode(Sha256::digest(text.as_bytes()));
        let out = serde_json::json!({
            "receipt": receipt,
            "content_hash": content_hash,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_receipt(&receipt);
    Ok(())
}

fn print_receipt(receipt: &ParsedReceipt) {
    println!();
    println!("🧾 {}", receipt.store_name);
    if let Some(ref location) = receipt.metadata.location {
        println!("   {}", location);
    }
    if let Some(ref date) = receipt.metadata.date {
        println!("   {}", date);
    }
    println!(
        "   Source: {}  Store confidence: {:.0}%  Format: {}",
        receipt.source.as_str(),
        receipt.store.confidence * 100.0,
        receipt.metadata.store_format
    );
    println!("   ─────────────────────────────────────────────────────────────");

    for item in &receipt.items {
        let marker = match item.suggested_action {
            SuggestedAction::Hide => "✗",
            SuggestedAction::Review => "?",
            SuggestedAction::Keep => " ",
        };
        let learned = if item.learned { "📌" } else { "  " };
        println!(
            "   {} {} {:<40} {:>8.2}  {:<13} {:.0}%",
            marker,
            learned,
            truncate(&item.enhanced_name, 40),
            item.price,
            item.category.as_str(),
            item.confidence * 100.0
        );
    }

    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {} items kept, total {:.2}",
        receipt.metadata.item_count, receipt.total
    );
    let hidden = receipt.items.iter().filter(|i| i.should_hide).count();
    if hidden > 0 {
        println!("   ({} hidden, ✗ = hide, ? = review, 📌 = learned)", hidden);
    }
    println!();
}
