//! Tally Core Library
//!
//! Shared functionality for the tally receipt understanding tool:
//! - Garbled-OCR detection and degraded-text recovery
//! - Line-item extraction from receipt text
//! - Store identification (keyword, address registry, online fallback)
//! - Item-name enhancement and non-food classification
//! - Learned-correction store backed by SQLite
//! - Pluggable local AI extraction backends (Ollama, mock)

pub mod ai;
pub mod classify;
pub mod db;
pub mod dictionaries;
pub mod enhance;
pub mod error;
pub mod extract;
pub mod garble;
pub mod geocode;
pub mod models;
pub mod patterns;
pub mod pipeline;
pub mod recovery;
pub mod registry;
pub mod similarity;
pub mod stores;

pub use ai::{AiClient, AiItem, AiReceipt, ExtractionBackend, MockBackend, OllamaBackend};
pub use classify::{classify, Classification, ClassifyContext};
pub use db::{Database, PatternOverride, HIDE_SENTINEL};
pub use enhance::{enhance, Enhancement};
pub use error::{Error, Result};
pub use extract::{extract, ExtractionResult};
pub use garble::{detect, GarbleReport};
pub use geocode::GeocodeClient;
pub use models::{
    Category, ClassifiedItem, CorrectionType, ExtractedLineItem, LearningRecord, LearningStats,
    NewLearningRecord, ParseSource, ParsedReceipt, ReceiptMetadata, StoreIdentity, StoreSource,
    SuggestedAction, UserVerdict,
};
pub use pipeline::ReceiptParser;
pub use recovery::{recover, RecoveredText};
pub use stores::{extract_address, identify, ExtractedAddress};
