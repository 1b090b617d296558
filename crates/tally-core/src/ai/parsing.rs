//! JSON parsing and validation for AI extraction responses
//!
//! Models wrap their JSON in prose, markdown fences, or both, so the payload
//! is located by brace scanning rather than parsed whole. Validation then
//! coerces quoted numbers, drops items that fail the plausibility rules, and
//! clamps confidences. An extraction with zero surviving items is untrusted.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Category, MAX_ITEM_PRICE, MIN_ITEM_PRICE};

use super::types::{AiItem, AiReceipt, RawAiReceipt};

/// Parse the receipt extraction JSON out of a raw model response
pub fn parse_extraction_response(response: &str) -> Result<RawAiReceipt> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|e| {
                let truncated = if json_str.len() > 200 {
                    format!("{}...", &json_str[..200])
                } else {
                    json_str.to_string()
                };
                Error::InvalidData(format!("Invalid JSON from AI: {} | Raw: {}", e, truncated))
            })
        }
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            if response.len() > 200 {
                format!("{}...", &response[..200])
            } else {
                response.to_string()
            }
        ))),
    }
}

/// Coerce a JSON number or numeric string to f64
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse().ok(),
        _ => None,
    }
}

/// Validate a raw extraction, dropping items that fail plausibility checks.
///
/// Errors with [`Error::UntrustedResponse`] when no item survives, so the
/// caller falls through to the deterministic pipeline.
pub fn validate_receipt(raw: RawAiReceipt) -> Result<AiReceipt> {
    let item_count = raw.items.len();
    let mut items = Vec::with_capacity(item_count);

    for raw_item in raw.items {
        let raw_name = match raw_item.raw_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                warn!("dropping AI item without a raw name");
                continue;
            }
        };
        let enhanced_name = match raw_item.enhanced_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                warn!(raw_name = %raw_name, "dropping AI item without an enhanced name");
                continue;
            }
        };
        let price = match raw_item.price.as_ref().and_then(coerce_f64) {
            Some(p) if (MIN_ITEM_PRICE..=MAX_ITEM_PRICE).contains(&p) => p,
            other => {
                warn!(raw_name = %raw_name, price = ?other, "dropping AI item with implausible price");
                continue;
            }
        };

        // anything outside the fixed enumeration is coerced to Other
        let category = raw_item
            .category
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(Category::Other);

        let confidence = raw_item
            .confidence
            .as_ref()
            .and_then(coerce_f64)
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);

        items.push(AiItem {
            raw_name,
            enhanced_name,
            price,
            category,
            confidence,
            is_non_food: raw_item.is_non_food.unwrap_or(false),
        });
    }

    if items.is_empty() {
        return Err(Error::UntrustedResponse(format!(
            "no valid items in AI extraction ({} offered)",
            item_count
        )));
    }

    debug!(
        accepted = items.len(),
        offered = item_count,
        "AI extraction validated"
    );

    Ok(AiReceipt {
        store_name: raw
            .store_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        items,
        total: raw.total.as_ref().and_then(coerce_f64),
    })
}
