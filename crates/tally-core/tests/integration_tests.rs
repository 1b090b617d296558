//! Integration tests for tally-core
//!
//! These tests exercise the full parse → learn → reparse workflow.

use tally_core::{
    ai::{AiClient, AiItem, AiReceipt, ExtractionBackend, MockBackend},
    classify::{classify, ClassifyContext},
    db::Database,
    models::{Category, CorrectionType, NewLearningRecord, ParseSource, SuggestedAction, UserVerdict},
    pipeline::ReceiptParser,
};

/// A clean Safeway receipt with a store-brand abbreviation, tax and payment
/// lines, and a declared total that includes tax.
fn safeway_receipt() -> &'static str {
    "SAFEWAY\n\
     STORE #910\n\
     1554 FIRST STREET\n\
     LIVERMORE, CA 94550\n\
     (925) 555-0142\n\
     04/12/2025 14:31\n\
     MILK WHOLE GALLON 3.99\n\
     BREAD WHEAT LOAF 2.50\n\
     G-P MUSTARD 4.49\n\
     SALES TAX 0.35\n\
     SUBTOTAL 10.98\n\
     TOTAL 11.33\n\
     VISA TEND 11.33\n\
     THANK YOU FOR SHOPPING"
}

fn parser() -> ReceiptParser {
    ReceiptParser::new(Database::in_memory().expect("Failed to create in-memory database"))
}

// =============================================================================
// End-to-End Parse Tests
// =============================================================================

#[tokio::test]
async fn test_clean_receipt_full_workflow() {
    let receipt = parser().parse(safeway_receipt(), None).await.unwrap();

    assert_eq!(receipt.store_name, "SAFEWAY");
    assert_eq!(receipt.source, ParseSource::Rules);
    assert_eq!(receipt.metadata.date.as_deref(), Some("04/12/2025"));
    assert_eq!(receipt.metadata.location.as_deref(), Some("LIVERMORE, CA"));
    assert_eq!(receipt.metadata.store_format, "grocery");

    // declared total is within 50% of the kept sum and survives
    assert!((receipt.total - 11.33).abs() < f64::EPSILON);

    // tax and payment lines never count as kept grocery items
    for item in receipt.items.iter().filter(|i| i.is_kept()) {
        assert!(!item.raw_name.contains("TAX"), "{} kept", item.raw_name);
        assert!(!item.raw_name.contains("TEND"), "{} kept", item.raw_name);
    }

    // receipt order is preserved
    for pair in receipt.items.windows(2) {
        assert!(pair[0].line_index < pair[1].line_index);
    }
}

#[tokio::test]
async fn test_store_brand_abbreviation_expanded() {
    let receipt = parser().parse(safeway_receipt(), None).await.unwrap();

    let mustard = receipt
        .items
        .iter()
        .find(|i| i.raw_name == "G-P MUSTARD")
        .expect("mustard line not extracted");

    assert_eq!(mustard.enhanced_name, "Grey Poupon Mustard");
    assert_eq!(mustard.category, Category::Pantry);
    assert!(
        mustard.confidence > 0.7,
        "confidence {} too low",
        mustard.confidence
    );
    assert!(!mustard.learned);
}

#[tokio::test]
async fn test_missing_total_recomputed_from_kept_items() {
    let text = "SAFEWAY\nMILK WHOLE GALLON 3.99\nBREAD WHEAT LOAF 2.50\nG-P MUSTARD 4.49";
    let receipt = parser().parse(text, None).await.unwrap();

    let kept_sum = receipt.kept_sum();
    assert!((receipt.total - kept_sum).abs() < 0.001);
    assert!((receipt.total - 10.98).abs() < 0.001);
}

#[tokio::test]
async fn test_implausible_declared_total_replaced() {
    let text = "SAFEWAY\nMILK WHOLE GALLON 3.99\nBREAD WHEAT LOAF 2.50\nTOTAL 99.99";
    let receipt = parser().parse(text, None).await.unwrap();
    assert!((receipt.total - 6.49).abs() < 0.001);
}

// =============================================================================
// Degraded-Text Recovery Tests
// =============================================================================

#[tokio::test]
async fn test_garbled_text_produces_synthetic_receipt() {
    let text = "MNBVCXZLKJHG QQQQ\nXZXZXZ PQZDFWRT\n|||{{}}@@@abc ~~==++";
    let receipt = parser().parse(text, None).await.unwrap();

    assert_eq!(receipt.source, ParseSource::Synthetic);
    assert!(!receipt.items.is_empty());

    // the fabricated receipt must be internally consistent: the declared
    // total is kept sum plus synthetic tax, well inside the deviation bound
    let kept_sum = receipt.kept_sum();
    assert!(receipt.total >= kept_sum);
    assert!(receipt.total - kept_sum <= kept_sum * 0.5);
    for item in &receipt.items {
        assert!(item.price >= 0.01 && item.price <= 999.99);
        assert!(!item.enhanced_name.is_empty());
    }
}

#[tokio::test]
async fn test_chain_fingerprint_survives_garbling() {
    let receipt = parser()
        .parse("@@@@ S4FEWAY |||| ~~~~ {{{{ zzzz qqqq", None)
        .await
        .unwrap();
    assert_eq!(receipt.source, ParseSource::Synthetic);
    assert_eq!(receipt.store_name, "SAFEWAY");
}

#[tokio::test]
async fn test_synthetic_output_is_deterministic() {
    // no chain fingerprint, so the seeded catalog sampler runs
    let text = "MNBVCXZLKJHG QQQQ\nXZXZXZ PQZDFWRT\n|||{{}}@@@abc ~~==++";
    let a = parser().parse(text, None).await.unwrap();
    let b = parser().parse(text, None).await.unwrap();

    assert_eq!(a.items.len(), b.items.len());
    for (x, y) in a.items.iter().zip(b.items.iter()) {
        assert_eq!(x.enhanced_name, y.enhanced_name);
        assert!((x.price - y.price).abs() < f64::EPSILON);
    }
    assert!((a.total - b.total).abs() < f64::EPSILON);
}

// =============================================================================
// Learning Loop Tests
// =============================================================================

#[tokio::test]
async fn test_correction_applied_on_reparse() {
    let p = parser();

    // first parse: the enhancer guesses
    let before = p.parse(safeway_receipt(), None).await.unwrap();
    let milk = before
        .items
        .iter()
        .find(|i| i.raw_name == "MILK WHOLE GALLON")
        .unwrap();
    assert!(!milk.learned);

    // user corrects the name
    p.database()
        .record_correction(&NewLearningRecord {
            original_text: "MILK WHOLE GALLON".to_string(),
            store_name: "SAFEWAY".to_string(),
            corrected_value: "Lucerne Whole Milk".to_string(),
            correction_type: CorrectionType::UserEdit,
            content_hash: None,
        })
        .unwrap();

    // second parse: the learned name wins at full confidence
    let after = p.parse(safeway_receipt(), None).await.unwrap();
    let milk = after
        .items
        .iter()
        .find(|i| i.raw_name == "MILK WHOLE GALLON")
        .unwrap();
    assert_eq!(milk.enhanced_name, "Lucerne Whole Milk");
    assert!(milk.learned);
    assert!((milk.confidence - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_hidden_item_excluded_on_reparse() {
    let p = parser();

    let before = p.parse(safeway_receipt(), None).await.unwrap();
    let kept_before = before.metadata.item_count;

    p.database()
        .record_hidden("SAFEWAY", "BREAD WHEAT LOAF", None)
        .unwrap();

    let after = p.parse(safeway_receipt(), None).await.unwrap();
    let bread = after
        .items
        .iter()
        .find(|i| i.raw_name == "BREAD WHEAT LOAF")
        .unwrap();
    assert!(bread.should_hide);
    assert!(bread.learned);
    assert_eq!(after.metadata.item_count, kept_before - 1);
    assert!(after.kept_sum() < before.kept_sum());
}

#[tokio::test]
async fn test_corrections_are_store_scoped() {
    let p = parser();
    p.database()
        .record_correction(&NewLearningRecord {
            original_text: "MILK WHOLE GALLON".to_string(),
            store_name: "KROGER".to_string(),
            corrected_value: "Kroger Brand Milk".to_string(),
            correction_type: CorrectionType::UserEdit,
            content_hash: None,
        })
        .unwrap();

    // a Kroger-scoped correction never leaks into a Safeway parse
    let receipt = p.parse(safeway_receipt(), None).await.unwrap();
    let milk = receipt
        .items
        .iter()
        .find(|i| i.raw_name == "MILK WHOLE GALLON")
        .unwrap();
    assert_ne!(milk.enhanced_name, "Kroger Brand Milk");
    assert!(!milk.learned);
}

#[tokio::test]
async fn test_verdicts_drive_accuracy_stats() {
    let db = Database::in_memory().unwrap();
    let record = |orig: &str, val: &str| NewLearningRecord {
        original_text: orig.to_string(),
        store_name: "SAFEWAY".to_string(),
        corrected_value: val.to_string(),
        correction_type: CorrectionType::UserEdit,
        content_hash: None,
    };

    let a = db.record_correction(&record("MLK", "Milk")).unwrap();
    let b = db.record_correction(&record("BRD", "Bread")).unwrap();
    let c = db.record_correction(&record("EGS", "Eggs")).unwrap();

    db.record_verdict(a, UserVerdict::Correct).unwrap();
    db.record_verdict(b, UserVerdict::Correct).unwrap();
    db.record_verdict(c, UserVerdict::Incorrect).unwrap();

    let stats = db.learning_stats().unwrap();
    assert_eq!(stats.total_feedback, 3);
    let accuracy = stats.accuracy.unwrap();
    assert!((accuracy - 2.0 / 3.0).abs() < 0.001);
}

#[tokio::test]
async fn test_reset_learning_clears_everything() {
    let p = parser();
    p.database()
        .record_hidden("SAFEWAY", "BREAD WHEAT LOAF", None)
        .unwrap();

    p.database().reset_learning().unwrap();

    assert!(p
        .database()
        .lookup_override("SAFEWAY", "BREAD WHEAT LOAF")
        .unwrap()
        .is_none());
    assert_eq!(p.database().learning_stats().unwrap().total_feedback, 0);

    // post-reset parse behaves as if nothing was ever learned
    let receipt = p.parse(safeway_receipt(), None).await.unwrap();
    let bread = receipt
        .items
        .iter()
        .find(|i| i.raw_name == "BREAD WHEAT LOAF")
        .unwrap();
    assert!(!bread.learned);
    assert!(bread.is_kept());
}

// =============================================================================
// Classifier Property Tests
// =============================================================================

#[test]
fn test_negative_price_always_hidden() {
    let ctx = ClassifyContext {
        line_index: 3,
        total_lines: 10,
        store: Some("SAFEWAY"),
    };
    let cls = classify("MFR COUPON", -1.50, ctx);
    assert!(cls.is_non_food);
    assert_eq!(cls.action, SuggestedAction::Hide);
    assert!(cls.confidence >= 0.85);
}

#[test]
fn test_ordinary_grocery_item_kept() {
    let ctx = ClassifyContext {
        line_index: 4,
        total_lines: 12,
        store: Some("SAFEWAY"),
    };
    let cls = classify("MILK WHOLE GALLON", 3.99, ctx);
    assert!(!cls.is_non_food);
    assert_eq!(cls.action, SuggestedAction::Keep);
}

// =============================================================================
// AI Collaborator Tests
// =============================================================================

#[tokio::test]
async fn test_ai_extraction_with_learned_hide() {
    let db = Database::in_memory().unwrap();
    db.record_hidden("SAFEWAY", "GIFT CARD", None).unwrap();

    let ai = AiClient::Mock(MockBackend::with_receipt(AiReceipt {
        store_name: Some("SAFEWAY".to_string()),
        items: vec![
            AiItem {
                raw_name: "MILK WHOLE GALLON".to_string(),
                enhanced_name: "Whole Milk Gallon".to_string(),
                price: 3.99,
                category: Category::Dairy,
                confidence: 0.9,
                is_non_food: false,
            },
            AiItem {
                raw_name: "GIFT CARD".to_string(),
                enhanced_name: "Gift Card".to_string(),
                price: 25.0,
                category: Category::Other,
                confidence: 0.9,
                is_non_food: true,
            },
        ],
        total: Some(28.99),
    }));

    let p = ReceiptParser::with_collaborators(db, Some(ai), None);
    let receipt = p.parse("irrelevant ocr text here 1.00", None).await.unwrap();

    assert_eq!(receipt.source, ParseSource::Ai);
    let gift = receipt
        .items
        .iter()
        .find(|i| i.raw_name == "GIFT CARD")
        .unwrap();
    assert!(gift.should_hide);
    assert!(gift.learned);
    assert_eq!(receipt.metadata.item_count, 1);
}

#[tokio::test]
async fn test_unhealthy_ai_falls_back_to_rules() {
    let db = Database::in_memory().unwrap();
    let p = ReceiptParser::with_collaborators(
        db,
        Some(AiClient::Mock(MockBackend::unhealthy())),
        None,
    );

    let receipt = p.parse(safeway_receipt(), None).await.unwrap();
    assert_eq!(receipt.source, ParseSource::Rules);
    assert_eq!(receipt.store_name, "SAFEWAY");
    assert!(!receipt.items.is_empty());
}

#[tokio::test]
async fn test_mock_backend_health_check() {
    assert!(MockBackend::new().health_check().await.is_ok());
    assert!(MockBackend::unhealthy().health_check().await.is_err());
}
