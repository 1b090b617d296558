//! Database and collaborator status command

use std::path::Path;

use anyhow::Result;

use super::{default_db_path, open_db};

pub fn cmd_status(db_path: Option<&Path>) -> Result<()> {
    let path = db_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_db_path);

    println!();
    println!("📊 Tally Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Database: {}", path.display());

    if path.exists() {
        if let Ok(metadata) = std::fs::metadata(&path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }

        match open_db(db_path) {
            Ok(db) => {
                if let Ok(stats) = db.learning_stats() {
                    println!("   Feedback entries: {}", stats.total_feedback);
                    if let Some(acc) = stats.accuracy {
                        println!("   Accuracy: {:.1}%", acc * 100.0);
                    }
                }
            }
            Err(e) => {
                println!("   ❌ Error opening database: {}", e);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    println!();
    println!("   AI backend:");
    let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());
    match backend.as_str() {
        "mock" => println!("   🤖 mock (testing)"),
        "ollama" => match std::env::var("OLLAMA_HOST") {
            Ok(host) => {
                let model =
                    std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
                println!("   🤖 ollama at {} (model: {})", host, model);
            }
            Err(_) => {
                println!("   💡 Not configured. Set OLLAMA_HOST for AI-assisted extraction");
            }
        },
        other => println!("   ❌ Unknown AI_BACKEND: {}", other),
    }

    println!();
    println!("   Online store lookup:");
    match std::env::var("GEOCODE_URL") {
        Ok(url) => println!("   🌐 {}", url),
        Err(_) => println!("   💡 Not configured. Set GEOCODE_URL for the online fallback"),
    }

    println!();
    Ok(())
}
