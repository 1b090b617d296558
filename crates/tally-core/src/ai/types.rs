//! Types for AI extraction responses

use serde::Deserialize;
use serde_json::Value;

use crate::models::Category;

/// Receipt extraction as deserialized straight from the model output.
///
/// Numeric fields are raw `Value`s because models frequently quote numbers;
/// coercion and validation happen in [`super::parsing::validate_receipt`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawAiReceipt {
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub items: Vec<RawAiItem>,
    #[serde(default)]
    pub total: Option<Value>,
}

/// One item as the model returned it
#[derive(Debug, Clone, Deserialize)]
pub struct RawAiItem {
    #[serde(default)]
    pub raw_name: Option<String>,
    #[serde(default)]
    pub enhanced_name: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub is_non_food: Option<bool>,
}

/// A validated extraction, every field coerced and range-checked
#[derive(Debug, Clone)]
pub struct AiReceipt {
    pub store_name: Option<String>,
    pub items: Vec<AiItem>,
    pub total: Option<f64>,
}

/// A validated item: non-empty names, strictly positive price, category
/// coerced into the fixed enumeration
#[derive(Debug, Clone)]
pub struct AiItem {
    pub raw_name: String,
    pub enhanced_name: String,
    pub price: f64,
    pub category: Category,
    pub confidence: f64,
    pub is_non_food: bool,
}
