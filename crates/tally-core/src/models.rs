//! Domain models for tally

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest price a line item may carry (below this is noise or a quantity).
pub const MIN_ITEM_PRICE: f64 = 0.01;

/// Highest price a line item may carry (above this is a card number fragment
/// or an OCR artifact, not a grocery price).
pub const MAX_ITEM_PRICE: f64 = 999.99;

/// A candidate (name, price) pair pulled from one or two receipt lines.
///
/// `line_index` preserves receipt order; later items are more likely to be
/// totals or payment lines, and the classifier uses that position context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedLineItem {
    pub raw_name: String,
    /// Price in dollars, always within [MIN_ITEM_PRICE, MAX_ITEM_PRICE].
    pub price: f64,
    pub line_index: usize,
}

/// Fixed product category enumeration.
///
/// The AI collaborator must answer within this list; anything else is
/// coerced to `Other` during response validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Produce,
    Dairy,
    Meat,
    Seafood,
    Bakery,
    Deli,
    Frozen,
    Pantry,
    Beverages,
    Snacks,
    Household,
    PersonalCare,
    Pharmacy,
    Baby,
    Pet,
    Fee,
    Tax,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Produce => "produce",
            Self::Dairy => "dairy",
            Self::Meat => "meat",
            Self::Seafood => "seafood",
            Self::Bakery => "bakery",
            Self::Deli => "deli",
            Self::Frozen => "frozen",
            Self::Pantry => "pantry",
            Self::Beverages => "beverages",
            Self::Snacks => "snacks",
            Self::Household => "household",
            Self::PersonalCare => "personal_care",
            Self::Pharmacy => "pharmacy",
            Self::Baby => "baby",
            Self::Pet => "pet",
            Self::Fee => "fee",
            Self::Tax => "tax",
            Self::Other => "other",
        }
    }

    /// All variants, in declaration order. Sent to the AI collaborator so it
    /// answers within the fixed enumeration.
    pub fn all() -> &'static [Category] {
        &[
            Self::Produce,
            Self::Dairy,
            Self::Meat,
            Self::Seafood,
            Self::Bakery,
            Self::Deli,
            Self::Frozen,
            Self::Pantry,
            Self::Beverages,
            Self::Snacks,
            Self::Household,
            Self::PersonalCare,
            Self::Pharmacy,
            Self::Baby,
            Self::Pet,
            Self::Fee,
            Self::Tax,
            Self::Other,
        ]
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "produce" => Ok(Self::Produce),
            "dairy" => Ok(Self::Dairy),
            "meat" => Ok(Self::Meat),
            "seafood" => Ok(Self::Seafood),
            "bakery" => Ok(Self::Bakery),
            "deli" => Ok(Self::Deli),
            "frozen" => Ok(Self::Frozen),
            "pantry" => Ok(Self::Pantry),
            "beverages" | "beverage" => Ok(Self::Beverages),
            "snacks" | "snack" => Ok(Self::Snacks),
            "household" => Ok(Self::Household),
            "personal_care" => Ok(Self::PersonalCare),
            "pharmacy" => Ok(Self::Pharmacy),
            "baby" => Ok(Self::Baby),
            "pet" => Ok(Self::Pet),
            "fee" | "fees" => Ok(Self::Fee),
            "tax" => Ok(Self::Tax),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifier recommendation for how a non-food item should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedAction {
    /// Confidence >= 0.85: suppress from the item list by default
    Hide,
    /// Confidence >= 0.6: show, but flag for the user
    Review,
    /// Keep as a normal food item
    Keep,
}

impl SuggestedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Review => "review",
            Self::Keep => "keep",
        }
    }
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully processed line item: extraction + enhancement + classification.
///
/// Immutable once returned from a parse call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedItem {
    pub raw_name: String,
    pub enhanced_name: String,
    pub category: Category,
    pub price: f64,
    pub line_index: usize,
    /// Clamped to [0, 1]
    pub confidence: f64,
    pub is_non_food: bool,
    pub suggested_action: SuggestedAction,
    /// True when a learned pattern-table entry forced suppression, or the
    /// classifier recommended hiding.
    pub should_hide: bool,
    /// True when the enhanced name came from a learned user correction
    /// rather than the automatic enhancer.
    pub learned: bool,
}

impl ClassifiedItem {
    /// Items that count toward the receipt total and item count
    pub fn is_kept(&self) -> bool {
        !self.should_hide
    }
}

/// How a store identity was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreSource {
    /// Chain name found verbatim in the text
    Keyword,
    /// Address fingerprint matched the location registry
    Address,
    /// External geocoding collaborator supplied a low-confidence guess
    Online,
}

impl StoreSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Address => "address",
            Self::Online => "online",
        }
    }
}

/// Identified issuing store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreIdentity {
    pub name: String,
    pub confidence: f64,
    pub source: StoreSource,
}

/// Where a ParsedReceipt came from.
///
/// `Synthetic` marks recovery output fabricated after unrecoverable garbling
/// or zero extraction; callers must never treat it as a genuine parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseSource {
    /// AI-assisted extraction collaborator, validated
    Ai,
    /// Deterministic rule pipeline
    Rules,
    /// Degraded-text recovery placeholder
    Synthetic,
}

impl ParseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Rules => "rules",
            Self::Synthetic => "synthetic",
        }
    }
}

/// Receipt metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptMetadata {
    /// Purchase date as printed on the receipt, if one was found
    pub date: Option<String>,
    /// "City, ST" from the matched registry location, if any
    pub location: Option<String>,
    /// Store format: grocery, warehouse, pharmacy, supercenter, unknown
    pub store_format: String,
    /// Final kept-item count
    pub item_count: usize,
}

/// The structured result of one parse call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedReceipt {
    pub store_name: String,
    pub store: StoreIdentity,
    /// Receipt line order preserved
    pub items: Vec<ClassifiedItem>,
    pub total: f64,
    pub metadata: ReceiptMetadata,
    pub source: ParseSource,
}

impl ParsedReceipt {
    /// Sum of kept items' prices, rounded to the cent
    pub fn kept_sum(&self) -> f64 {
        let sum: f64 = self
            .items
            .iter()
            .filter(|i| i.is_kept())
            .map(|i| i.price)
            .sum();
        (sum * 100.0).round() / 100.0
    }
}

/// Kind of correction stored in the learning log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionType {
    /// User edited an item name
    UserEdit,
    /// Accepted AI output recorded for reuse
    AiCorrection,
    /// Dictionary/pattern maintenance entry
    PatternUpdate,
    /// User hid an item (stored as the hide sentinel)
    ItemHidden,
}

impl CorrectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserEdit => "user_edit",
            Self::AiCorrection => "ai_correction",
            Self::PatternUpdate => "pattern_update",
            Self::ItemHidden => "item_hidden",
        }
    }
}

impl std::str::FromStr for CorrectionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user_edit" => Ok(Self::UserEdit),
            "ai_correction" => Ok(Self::AiCorrection),
            "pattern_update" => Ok(Self::PatternUpdate),
            "item_hidden" => Ok(Self::ItemHidden),
            _ => Err(format!("Unknown correction type: {}", s)),
        }
    }
}

impl std::fmt::Display for CorrectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Explicit user verdict on a stored correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerdict {
    Correct,
    Incorrect,
}

impl UserVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }
}

impl std::str::FromStr for UserVerdict {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            _ => Err(format!("Unknown verdict: {}", s)),
        }
    }
}

/// One appended feedback-log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningRecord {
    pub id: i64,
    pub original_text: String,
    pub store_name: String,
    pub corrected_value: String,
    pub correction_type: CorrectionType,
    pub user_verdict: Option<UserVerdict>,
    /// SHA-256 of the source OCR text, when the correction came from a parse
    pub content_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New feedback-log entry (id and timestamp assigned on insert)
#[derive(Debug, Clone)]
pub struct NewLearningRecord {
    pub original_text: String,
    pub store_name: String,
    pub corrected_value: String,
    pub correction_type: CorrectionType,
    pub content_hash: Option<String>,
}

/// Aggregate learning-store statistics, derived on demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningStats {
    pub total_feedback: i64,
    /// correct / (correct + incorrect), over records with an explicit verdict
    pub accuracy: Option<f64>,
    pub by_correction_type: Vec<(String, i64)>,
    /// Stores with the most corrections, descending
    pub most_corrected_stores: Vec<(String, i64)>,
    /// Original texts corrected most often, descending
    pub most_corrected_texts: Vec<(String, i64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for cat in Category::all() {
            let parsed: Category = cat.as_str().parse().unwrap();
            assert_eq!(parsed, *cat);
        }
    }

    #[test]
    fn test_category_coercion_variants() {
        assert_eq!("Personal Care".parse::<Category>().unwrap(), Category::PersonalCare);
        assert_eq!("BEVERAGE".parse::<Category>().unwrap(), Category::Beverages);
        assert!("electronics".parse::<Category>().is_err());
    }

    #[test]
    fn test_kept_sum_excludes_hidden() {
        let item = |price, hide| ClassifiedItem {
            raw_name: "X".into(),
            enhanced_name: "X".into(),
            category: Category::Other,
            price,
            line_index: 0,
            confidence: 0.5,
            is_non_food: false,
            suggested_action: SuggestedAction::Keep,
            should_hide: hide,
            learned: false,
        };
        let receipt = ParsedReceipt {
            store_name: "TEST".into(),
            store: StoreIdentity {
                name: "TEST".into(),
                confidence: 0.5,
                source: StoreSource::Keyword,
            },
            items: vec![item(1.10, false), item(2.25, false), item(9.99, true)],
            total: 0.0,
            metadata: ReceiptMetadata {
                date: None,
                location: None,
                store_format: "grocery".into(),
                item_count: 2,
            },
            source: ParseSource::Rules,
        };
        assert!((receipt.kept_sum() - 3.35).abs() < f64::EPSILON);
    }
}
