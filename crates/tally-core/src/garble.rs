//! Garbled-text detection: is this OCR output too corrupted to parse?
//!
//! Every line is first tested against a whitelist of valid receipt-line
//! shapes; a line matching any whitelist shape is counted valid and is never
//! also counted garbled. Lines matching neither whitelist nor garble
//! signatures are simply neutral. A separate whole-text scan counts
//! "extreme" indicators that short-circuit the verdict.

use regex::Regex;

use crate::patterns::*;
use crate::stores::KNOWN_CHAIN_PATTERN;

/// Garbled-line share above which the text is rejected
const GARBLED_LINE_RATIO: f64 = 0.15;

/// Valid-line share below which the text is rejected
const VALID_LINE_RATIO: f64 = 0.10;

/// Extreme-indicator count for an immediate garbled verdict
const EXTREME_IMMEDIATE: usize = 5;

/// Extreme-indicator count that fails the combined check
const EXTREME_COMBINED: usize = 2;

/// Diagnostic counts from one detection pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarbleReport {
    pub garbled: bool,
    pub total_lines: usize,
    pub valid_lines: usize,
    pub garbled_lines: usize,
    pub extreme_indicators: usize,
}

/// Ordered whitelist of valid receipt-line shapes
fn whitelist() -> [&'static Regex; 12] {
    [
        &PRICE_ONLY_LINE,
        &NAME_THEN_PRICE,
        &SUBTOTAL_TAX_TOTAL_LINE,
        &PAYMENT_LINE,
        &WEIGHT_PRICING_LINE,
        &STORE_NUMBER_LINE,
        &STREET_LINE,
        &CITY_STATE_ZIP_LINE,
        &PHONE_LINE,
        &THANK_YOU_LINE,
        &DEPARTMENT_HEADER_LINE,
        &GENERIC_WORDS_PLUS_PRICE,
    ]
}

/// Garble signatures tested against lines that failed the whitelist
fn garble_signatures() -> [&'static Regex; 6] {
    [
        &UPPER_RUN_6,
        &DENSE_SHORT_TOKENS,
        &PUNCT_GLUED_TO_LETTERS,
        &MIXED_CASE_SHORT_WORDS,
        &VOWELLESS_WORD_4,
        &CONSONANT_RUN_4,
    ]
}

/// Denser whole-text indicators of hopeless corruption
fn extreme_signatures() -> [&'static Regex; 5] {
    [
        &EXTREME_UPPER_RUN,
        &EXTREME_CONSONANT_RUN,
        &EXTREME_SHORT_TOKENS,
        &EXTREME_PUNCT_CLUSTER,
        &NONSENSE_CONSONANT_TOKEN,
    ]
}

/// True when the line matches any valid receipt-line shape
pub fn is_valid_receipt_line(line: &str) -> bool {
    if KNOWN_CHAIN_PATTERN.is_match(line) {
        return true;
    }
    whitelist().iter().any(|re| re.is_match(line))
}

fn is_garbled_line(line: &str) -> bool {
    has_leading_letter_triple(line) || garble_signatures().iter().any(|re| re.is_match(line))
}

/// Count extreme-garbling indicator matches over the flattened text
fn count_extreme_indicators(text: &str) -> usize {
    let flat = text.replace(['\n', '\r'], " ");
    extreme_signatures()
        .iter()
        .map(|re| re.find_iter(&flat).count())
        .sum()
}

/// Classify the full OCR text. Never errors; empty input is garbled.
pub fn detect(text: &str) -> GarbleReport {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let total_lines = lines.len();
    if total_lines == 0 {
        return GarbleReport {
            garbled: true,
            total_lines: 0,
            valid_lines: 0,
            garbled_lines: 0,
            extreme_indicators: 0,
        };
    }

    let mut valid_lines = 0;
    let mut garbled_lines = 0;
    for line in &lines {
        if is_valid_receipt_line(line) {
            valid_lines += 1;
        } else if is_garbled_line(line) {
            garbled_lines += 1;
        }
    }

    let extreme_indicators = count_extreme_indicators(text);
    if extreme_indicators > EXTREME_IMMEDIATE {
        return GarbleReport {
            garbled: true,
            total_lines,
            valid_lines,
            garbled_lines,
            extreme_indicators,
        };
    }

    let total = total_lines as f64;
    let garbled = garbled_lines as f64 > GARBLED_LINE_RATIO * total
        || (valid_lines as f64) < VALID_LINE_RATIO * total
        || extreme_indicators > EXTREME_COMBINED;

    GarbleReport {
        garbled,
        total_lines,
        valid_lines,
        garbled_lines,
        extreme_indicators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_RECEIPT: &str = "SAFEWAY\n\
        1554 FIRST STREET\n\
        LIVERMORE, CA 94550\n\
        MILK WHOLE GALLON 3.99\n\
        BREAD WHEAT LOAF 2.50\n\
        SUBTOTAL 6.49\n\
        TOTAL 6.49\n\
        VISA TEND 6.49\n\
        THANK YOU FOR SHOPPING";

    #[test]
    fn test_clean_receipt_not_garbled() {
        let report = detect(CLEAN_RECEIPT);
        assert!(!report.garbled, "{:?}", report);
        assert_eq!(report.total_lines, 9);
        assert!(report.valid_lines >= 8);
        assert_eq!(report.garbled_lines, 0);
    }

    #[test]
    fn test_valid_line_never_counted_garbled() {
        // GALLON is a 6-char uppercase run, but the line matches the
        // name-then-price whitelist shape first.
        let report = detect("MILK WHOLE GALLON 3.99\nBREAD LOAF 2.50\nTOTAL 6.49");
        assert_eq!(report.garbled_lines, 0);
        assert!(!report.garbled);
    }

    #[test]
    fn test_garbled_ratio_trips() {
        // 2 garbled lines out of 4 = 50% > 15%
        let text = "MILK WHOLE GALLON 3.99\n\
            BREAD LOAF 2.50\n\
            XKCDQ ZVWXR PQZDF\n\
            |||{{}}@@@abc";
        let report = detect(text);
        assert!(report.garbled_lines >= 2);
        assert!(report.garbled);
    }

    #[test]
    fn test_triplet_counts_only_at_line_start() {
        // "glasss" carries a triple mid-word but opens normally; "sssoap"
        // opens with one
        let report = detect("glasss cleaner\nsssoap bar");
        assert_eq!(report.garbled_lines, 1);
    }

    #[test]
    fn test_no_valid_lines_trips() {
        let report = detect("groceries and sundries\nassorted purchases");
        assert_eq!(report.valid_lines, 0);
        assert!(report.garbled);
    }

    #[test]
    fn test_extreme_indicators_immediate() {
        let text = "ZXKQWRTPLMN BCDFGHJKLMN ||||@@@ QWRTZPSDFG {{{===}}} XKCDQZV MNBVCXZLK";
        let report = detect(text);
        assert!(report.extreme_indicators > EXTREME_IMMEDIATE);
        assert!(report.garbled);
    }

    #[test]
    fn test_empty_text_is_garbled() {
        assert!(detect("").garbled);
        assert!(detect("  \n \n").garbled);
    }

    #[test]
    fn test_three_lines_two_extreme() {
        // tiny text dominated by extreme indicators
        let text = "MNBVCXZLKJHG QQQQ\nXZXZXZ PQZDFWRT\nTOTAL 4.99";
        let report = detect(text);
        assert!(report.extreme_indicators > EXTREME_COMBINED);
        assert!(report.garbled);
    }
}
