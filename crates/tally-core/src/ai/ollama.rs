//! Ollama backend implementation
//!
//! HTTP client for the Ollama generate API. One attempt per parse with a
//! fixed timeout; on any failure the orchestrator falls back to the
//! deterministic pipeline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Category;

use super::parsing::{parse_extraction_response, validate_receipt};
use super::types::AiReceipt;
use super::ExtractionBackend;

/// Timeout for one extraction call
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(30);

/// Ollama extraction backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables (`OLLAMA_HOST`, `OLLAMA_MODEL`)
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    fn build_prompt(&self, text: &str, store_hint: Option<&str>) -> String {
        let categories: Vec<&str> = Category::all().iter().map(|c| c.as_str()).collect();
        let hint = store_hint
            .map(|s| format!("The receipt is from {}.\n", s))
            .unwrap_or_default();

        format!(
            "Extract the purchased items from this grocery receipt OCR text.\n\
             {hint}\
             Respond with only a JSON object of the form:\n\
             {{\"store_name\": \"...\", \"items\": [{{\"raw_name\": \"...\", \
             \"enhanced_name\": \"...\", \"price\": 0.00, \"category\": \"...\", \
             \"confidence\": 0.0, \"is_non_food\": false}}], \"total\": 0.00}}\n\
             raw_name is the text exactly as printed; enhanced_name is the readable \
             product name. category must be one of: {categories}.\n\
             Skip totals, tax, payment, and store-address lines.\n\n\
             Receipt text:\n{text}",
            hint = hint,
            categories = categories.join(", "),
            text = text,
        )
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl ExtractionBackend for OllamaBackend {
    async fn extract_receipt(&self, text: &str, store_hint: Option<&str>) -> Result<AiReceipt> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: self.build_prompt(text, store_hint),
            stream: false,
        };

        debug!(model = %self.model, "requesting AI extraction");
        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(EXTRACT_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("AI extraction timed out after {:?}", EXTRACT_TIMEOUT))
                } else {
                    Error::Http(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::InvalidData(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let body: OllamaResponse = response.json().await?;
        validate_receipt(parse_extraction_response(&body.response)?)
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::InvalidData(format!(
                "Ollama health check returned status {}",
                response.status()
            )))
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
