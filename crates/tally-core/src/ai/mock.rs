//! Mock backend for testing
//!
//! Provides a configurable canned extraction so the orchestrator's AI path
//! can be exercised without a running LLM server.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Category;

use super::types::{AiItem, AiReceipt};
use super::ExtractionBackend;

/// Mock extraction backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check and extract_receipt succeed
    pub healthy: bool,
    /// Canned extraction returned by extract_receipt; None means the mock
    /// answers with a basic single-item receipt
    pub canned: Option<AiReceipt>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            canned: None,
        }
    }

    /// Create an unhealthy mock backend; every call errors
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            canned: None,
        }
    }

    /// Create a mock that answers with a fixed extraction
    pub fn with_receipt(receipt: AiReceipt) -> Self {
        Self {
            healthy: true,
            canned: Some(receipt),
        }
    }
}

#[async_trait]
impl ExtractionBackend for MockBackend {
    async fn extract_receipt(&self, _text: &str, store_hint: Option<&str>) -> Result<AiReceipt> {
        if !self.healthy {
            return Err(Error::Timeout("mock backend is unhealthy".to_string()));
        }
        if let Some(ref canned) = self.canned {
            return Ok(canned.clone());
        }

        Ok(AiReceipt {
            store_name: store_hint.map(str::to_string),
            items: vec![AiItem {
                raw_name: "MLK WHL GAL".to_string(),
                enhanced_name: "Whole Milk Gallon".to_string(),
                price: 3.99,
                category: Category::Dairy,
                confidence: 0.9,
                is_non_food: false,
            }],
            total: Some(3.99),
        })
    }

    async fn health_check(&self) -> Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(Error::Timeout("mock backend is unhealthy".to_string()))
        }
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
