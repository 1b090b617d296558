//! Pluggable local AI extraction abstraction
//!
//! The AI collaborator is optional: when configured it gets the first shot at
//! a receipt, and its output is validated before being trusted. All backends
//! run locally.
//!
//! # Architecture
//!
//! - `ExtractionBackend` trait: the interface a backend implements
//! - `AiClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)

mod mock;
mod ollama;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use types::{AiItem, AiReceipt};

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;

/// Trait defining the interface for AI extraction backends
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Extract a full receipt from OCR text, already validated
    async fn extract_receipt(&self, text: &str, store_hint: Option<&str>) -> Result<AiReceipt>;

    /// Check whether the backend is reachable
    async fn health_check(&self) -> Result<()>;

    /// Model name in use
    fn model(&self) -> &str;

    /// Host the backend talks to
    fn host(&self) -> &str;
}

/// Concrete AI client with compile-time dispatch over the known backends
#[derive(Clone)]
pub enum AiClient {
    Ollama(OllamaBackend),
    Mock(MockBackend),
}

impl AiClient {
    /// Create from environment variables; None when no backend is configured
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());
        match backend.as_str() {
            "mock" => {
                info!("using mock AI backend");
                Some(Self::Mock(MockBackend::new()))
            }
            "ollama" => {
                let client = OllamaBackend::from_env()?;
                info!(host = %client.host(), model = %client.model(), "using Ollama AI backend");
                Some(Self::Ollama(client))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl ExtractionBackend for AiClient {
    async fn extract_receipt(&self, text: &str, store_hint: Option<&str>) -> Result<AiReceipt> {
        match self {
            Self::Ollama(b) => b.extract_receipt(text, store_hint).await,
            Self::Mock(b) => b.extract_receipt(text, store_hint).await,
        }
    }

    async fn health_check(&self) -> Result<()> {
        match self {
            Self::Ollama(b) => b.health_check().await,
            Self::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            Self::Ollama(b) => b.model(),
            Self::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            Self::Ollama(b) => b.host(),
            Self::Mock(b) => b.host(),
        }
    }
}
