//! Non-food classification: which extracted lines are not grocery items.
//!
//! Rule layers run in a fixed order. The first two are short-circuiting
//! (definite non-food, store services); the rest accumulate onto a running
//! score: likely-non-food patterns take the max of their sub-scores, the
//! brand lexicon and anomaly checks floor the score, and context scoring
//! adds price- and position-based evidence on top. The final score is
//! clamped to [0, 1] before thresholds pick the suggested action.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::SuggestedAction;
use crate::patterns::{
    ALNUM_CODE, COUPON_PATTERN, FEE_PATTERN, NEGATIVE_AMOUNT, RECEIPT_ID_PATTERN, TAX_PATTERN,
};
use crate::stores::is_pharmacy_chain;

/// Score at or above which an item should be hidden
pub const HIDE_THRESHOLD: f64 = 0.85;

/// Score at or above which an item needs user review
pub const REVIEW_THRESHOLD: f64 = 0.6;

/// Score at or above which an item counts as non-food
pub const NON_FOOD_THRESHOLD: f64 = 0.6;

lazy_static! {
    static ref TENDER_PATTERN: Regex = Regex::new(
        r"(?i)\b(cash|credit|debit|visa|mastercard|amex|discover|tender|payment|change\s+due|balance|ebt)\b"
    ).unwrap();

    static ref STORE_SERVICE_PATTERN: Regex = Regex::new(
        r"(?i)\b(gift\s+card|lottery|lotto|money\s+order|western\s+union|postage|stamps|atm|car\s+wash|propane\s+exchange|photo\s+(print|center))\b"
    ).unwrap();

    // (pattern, score) sub-rules; the layer takes the max matching score
    static ref LIKELY_NON_FOOD: Vec<(Regex, f64)> = vec![
        (Regex::new(r"(?i)\b(cigarette|tobacco|vape|nicotine)\b").unwrap(), 0.85),
        (Regex::new(r"(?i)\b(shampoo|conditioner|deodorant|toothpaste|tooth\s*brush|mouthwash|body\s+wash|lotion|razor|cosmetics?)\b").unwrap(), 0.8),
        (Regex::new(r"(?i)\b(detergent|paper\s+towels?|toilet\s+paper|bleach|cleaner|dish\s+soap|sponges?|trash\s+bags?|laundry|air\s+freshener)\b").unwrap(), 0.8),
        (Regex::new(r"(?i)\b(vitamins?|ibuprofen|acetaminophen|aspirin|antacid|allergy\s+relief|cough\s+(drops?|syrup)|band-?aids?|first\s+aid)\b").unwrap(), 0.8),
        (Regex::new(r"(?i)\b(diapers?|baby\s+wipes|dog\s+(food|treats?)|cat\s+(food|litter)|pet\s+(food|toys?))\b").unwrap(), 0.75),
        (Regex::new(r"(?i)\b(magazine|newspaper|greeting\s+card)\b").unwrap(), 0.75),
        (Regex::new(r"(?i)\b(batter(y|ies)|light\s*bulb|charger|earbuds?)\b").unwrap(), 0.7),
        (Regex::new(r"(?i)\b(t-?shirt|socks|apparel|sunglasses)\b").unwrap(), 0.7),
        (Regex::new(r"(?i)\b(misc|miscellaneous|general\s+merch(andise)?)\b").unwrap(), 0.65),
    ];

    // brands that never appear on a plate
    static ref NON_FOOD_BRANDS: Regex = Regex::new(
        r"(?i)\b(marlboro|camel\s+crush|duracell|energizer|tide|clorox|lysol|windex|charmin|bounty|colgate|crest|gillette|pampers|huggies|advil|tylenol|purina|friskies)\b"
    ).unwrap();
}

/// Classifier verdict for one item
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub is_non_food: bool,
    pub confidence: f64,
    pub action: SuggestedAction,
}

/// Positional and store context for one item
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyContext<'a> {
    pub line_index: usize,
    pub total_lines: usize,
    pub store: Option<&'a str>,
}

/// Layer 1: unambiguous receipt furniture, short-circuits at 0.95
fn definite_non_food(name: &str, price: f64) -> bool {
    price < 0.0
        || TAX_PATTERN.is_match(name)
        || TENDER_PATTERN.is_match(name)
        || FEE_PATTERN.is_match(name)
        || COUPON_PATTERN.is_match(name)
        || NEGATIVE_AMOUNT.is_match(name)
}

/// Layer 2: in-store services and receipt identifiers, short-circuits at 0.9
fn store_service(name: &str) -> bool {
    STORE_SERVICE_PATTERN.is_match(name) || RECEIPT_ID_PATTERN.is_match(name)
}

/// Layer 3: max sub-score over likely-non-food patterns
fn likely_non_food(name: &str) -> f64 {
    LIKELY_NON_FOOD
        .iter()
        .filter(|(re, _)| re.is_match(name))
        .map(|(_, score)| *score)
        .fold(0.0, f64::max)
}

/// Layer 4: known non-food brand floors the score at 0.8
fn brand_floor(name: &str) -> Option<f64> {
    NON_FOOD_BRANDS.is_match(name).then_some(0.8)
}

/// Layer 5: additive price and position evidence
fn context_score(price: f64, ctx: ClassifyContext) -> f64 {
    let mut score = 0.0;
    if price < 0.0 {
        score += 0.9;
    } else if price > 100.0 {
        score += 0.8;
    } else if price > 50.0 {
        score += 0.4;
    }
    // round dollar amounts of $20+ read like gift cards or cash back
    if price >= 20.0 && (price.fract()).abs() < 1e-9 {
        score += 0.3;
    }
    // totals and tenders cluster at the bottom of the receipt
    if price > 20.0 && ctx.total_lines >= 3 && ctx.line_index + 3 >= ctx.total_lines {
        score += 0.2;
    }
    if ctx.store.map(is_pharmacy_chain).unwrap_or(false) {
        score += 0.1;
    }
    score
}

/// Layer 6: structural anomalies floor the score
fn anomaly_floor(name: &str) -> Option<f64> {
    let trimmed = name.trim();
    if ALNUM_CODE.is_match(trimmed) && trimmed.chars().any(|c| c.is_ascii_digit()) {
        Some(0.8)
    } else if trimmed.len() < 3 {
        Some(0.7)
    } else {
        None
    }
}

fn verdict(confidence: f64) -> Classification {
    let action = if confidence >= HIDE_THRESHOLD {
        SuggestedAction::Hide
    } else if confidence >= REVIEW_THRESHOLD {
        SuggestedAction::Review
    } else {
        SuggestedAction::Keep
    };
    Classification {
        is_non_food: confidence >= NON_FOOD_THRESHOLD,
        confidence,
        action,
    }
}

/// Classify one extracted item as food or non-food.
pub fn classify(name: &str, price: f64, ctx: ClassifyContext) -> Classification {
    if definite_non_food(name, price) {
        return verdict(0.95);
    }
    if store_service(name) {
        return verdict(0.9);
    }

    let mut score = likely_non_food(name);
    if let Some(floor) = brand_floor(name) {
        score = score.max(floor);
    }
    score += context_score(price, ctx);
    if let Some(floor) = anomaly_floor(name) {
        score = score.max(floor);
    }

    verdict(score.clamp(0.0, 1.0))
}
