//! Line-item extraction: receipt text to ordered (name, price) candidates.
//!
//! Non-item lines (addresses, phones, payment/total furniture, footers) are
//! skipped up front. For each remaining line, extraction strategies are tried
//! in a fixed order until one matches; candidates then pass price-range and
//! garbled-name validation before acceptance.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::models::{ExtractedLineItem, MAX_ITEM_PRICE, MIN_ITEM_PRICE};
use crate::patterns::*;

lazy_static! {
    // vocabulary that disqualifies a candidate *name*, even if a price parsed
    static ref NAME_REJECT: Regex = Regex::new(
        r"(?i)\b(subtotal|sub\s*total|total|tax|balance|change|cash|credit|debit|visa|mastercard|amex|discover|tender|payment|approved|auth|cashier|clerk|operator|checker|thank|welcome|receipt|transaction|register|store|invoice)\b"
    ).unwrap();
}

/// Result of one extraction pass
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    /// Candidates in receipt line order
    pub items: Vec<ExtractedLineItem>,
    /// Trailing value of the TOTAL line, if one was seen
    pub declared_total: Option<f64>,
}

/// Lines that can never yield an item and are skipped before any strategy
fn is_skippable(line: &str) -> bool {
    line.len() < 3
        || PHONE_LINE.is_match(line)
        || STREET_LINE.is_match(line)
        || CITY_STATE_ZIP_LINE.is_match(line)
        || PAYMENT_LINE.is_match(line)
        || STORE_NUMBER_LINE.is_match(line)
        || THANK_YOU_LINE.is_match(line)
        || STAFF_LINE.is_match(line)
        || DEPARTMENT_HEADER_LINE.is_match(line)
        || WEIGHT_PRICING_LINE.is_match(line)
        || (DATE_LINE.is_match(line) && !NAME_THEN_PRICE.is_match(line))
}

/// Garbled-name check: word-length ratio, vowel presence, repeated-letter run
fn is_plausible_name(name: &str) -> bool {
    if has_letter_triple(name) {
        return false;
    }

    let words: Vec<&str> = name.split_whitespace().collect();
    if words.is_empty() {
        return false;
    }

    // a name that is mostly 1-2 letter fragments is OCR shrapnel
    let short = words.iter().filter(|w| w.len() <= 2).count();
    if short * 2 > words.len() {
        return false;
    }

    // at least one word must contain a vowel
    let has_vowel = name
        .chars()
        .any(|c| matches!(c.to_ascii_uppercase(), 'A' | 'E' | 'I' | 'O' | 'U'));
    if !has_vowel {
        return false;
    }

    // every 4+ letter word must not be a pure consonant run
    !words
        .iter()
        .filter(|w| w.len() >= 4)
        .all(|w| VOWELLESS_WORD_4.is_match(w))
        || words.iter().all(|w| w.len() < 4)
}

fn parse_price(s: &str) -> Option<f64> {
    let value: f64 = s.parse().ok()?;
    (MIN_ITEM_PRICE..=MAX_ITEM_PRICE).contains(&value).then_some(value)
}

fn accept(name: &str, price: f64, line_index: usize) -> Option<ExtractedLineItem> {
    let name = name.trim().trim_end_matches(['*', '.', ',']).trim();
    if name.len() < 2 || NAME_REJECT.is_match(name) || !is_plausible_name(name) {
        return None;
    }
    Some(ExtractedLineItem {
        raw_name: name.to_string(),
        price,
        line_index,
    })
}

/// Extract ordered line items and the provisional declared total.
pub fn extract(text: &str) -> ExtractionResult {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut result = ExtractionResult::default();
    let mut consumed_next = false;

    for (idx, line) in lines.iter().enumerate() {
        if consumed_next {
            consumed_next = false;
            continue;
        }
        if line.is_empty() {
            continue;
        }

        // the TOTAL line is furniture, but its trailing value is the
        // provisional declared total
        if let Some(caps) = TOTAL_LINE.captures(line) {
            if result.declared_total.is_none() {
                result.declared_total = caps[1].parse().ok();
            }
            continue;
        }
        if SUBTOTAL_TAX_TOTAL_LINE.is_match(line) {
            continue;
        }
        if is_skippable(line) {
            continue;
        }

        // (a) name then trailing price on the same line
        if let Some(caps) = NAME_THEN_PRICE.captures(line) {
            if let Some(price) = parse_price(&caps[2]) {
                if let Some(item) = accept(&caps[1], price, idx) {
                    result.items.push(item);
                    continue;
                }
            }
        }

        // (b) name on this line, price-only line immediately following
        if let Some(next) = lines.get(idx + 1) {
            if let Some(caps) = PRICE_ONLY_LINE.captures(next) {
                if !ANY_PRICE.is_match(line) {
                    if let Some(price) = parse_price(&caps[1]) {
                        if let Some(item) = accept(line, price, idx) {
                            result.items.push(item);
                            consumed_next = true;
                            continue;
                        }
                    }
                }
            }
        }

        // (c) price then name
        if let Some(caps) = PRICE_THEN_NAME.captures(line) {
            if let Some(price) = parse_price(&caps[1]) {
                if let Some(item) = accept(&caps[2], price, idx) {
                    result.items.push(item);
                    continue;
                }
            }
        }

        // (d) any price substring, last resort; address/phone fragments were
        // already rejected by the skip pass
        if let Some(caps) = ANY_PRICE.captures(line) {
            if let Some(price) = parse_price(&caps[1]) {
                let name = line.replace(caps.get(0).map_or("", |m| m.as_str()), "");
                if let Some(item) = accept(&name, price, idx) {
                    result.items.push(item);
                }
            }
        }
    }

    debug!(
        items = result.items.len(),
        declared_total = ?result.declared_total,
        "extraction complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_then_price() {
        let result = extract("MILK WHOLE GALLON 3.99\nBREAD WHEAT LOAF 2.50\nTOTAL 6.49");
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].raw_name, "MILK WHOLE GALLON");
        assert!((result.items[0].price - 3.99).abs() < f64::EPSILON);
        assert_eq!(result.items[1].raw_name, "BREAD WHEAT LOAF");
        assert_eq!(result.declared_total, Some(6.49));
    }

    #[test]
    fn test_line_order_preserved() {
        let result = extract("RITZ CRACKERS 1.99\nZEBRA CAKES 2.99\nMANGO 0.99");
        let names: Vec<&str> = result.items.iter().map(|i| i.raw_name.as_str()).collect();
        assert_eq!(names, vec!["RITZ CRACKERS", "ZEBRA CAKES", "MANGO"]);
        assert!(result.items[0].line_index < result.items[2].line_index);
    }

    #[test]
    fn test_price_on_following_line() {
        let result = extract("ORGANIC STRAWBERRIES\n4.99\nTOTAL 4.99");
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].raw_name, "ORGANIC STRAWBERRIES");
        assert!((result.items[0].price - 4.99).abs() < f64::EPSILON);
    }

    #[test]
    fn test_price_then_name() {
        let result = extract("2.49 FROZEN PEAS");
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].raw_name, "FROZEN PEAS");
    }

    #[test]
    fn test_skips_furniture() {
        let text = "SAFEWAY\n\
            1554 FIRST STREET\n\
            LIVERMORE, CA 94550\n\
            (925) 555-0142\n\
            MILK WHOLE GALLON 3.99\n\
            SUBTOTAL 3.99\n\
            TAX 0.00\n\
            TOTAL 3.99\n\
            VISA TEND 3.99\n\
            CHANGE 0.00\n\
            YOUR CASHIER WAS PAT\n\
            THANK YOU FOR SHOPPING";
        let result = extract(text);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].raw_name, "MILK WHOLE GALLON");
        assert_eq!(result.declared_total, Some(3.99));
    }

    #[test]
    fn test_price_out_of_range_rejected() {
        let result = extract("GIFT CARD BALANCE 0.00\nWIDGET 1000.00");
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_garbled_name_rejected() {
        // no vowels and repeated-letter run
        let result = extract("XXXQZ 3.99\nZXCWQ KPT 2.99");
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_payment_vocab_name_rejected() {
        let result = extract("CASH BACK 20.00");
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_zero_items_on_empty() {
        let result = extract("");
        assert!(result.items.is_empty());
        assert!(result.declared_total.is_none());
    }
}
