//! Shared compiled regex patterns for receipt text analysis.
//!
//! Everything that more than one component matches against lives here so the
//! garble detector, extractor, store identifier, and classifier agree on what
//! a "price", "phone number", or "payment line" looks like.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // ----- prices -----

    pub static ref PRICE_ONLY_LINE: Regex = Regex::new(
        r"^\s*\$?(\d{1,3}\.\d{2})\s*-?[A-Za-z]{0,2}\s*$"
    ).unwrap();

    // name then trailing price, optional 1-2 letter tax/status code
    pub static ref NAME_THEN_PRICE: Regex = Regex::new(
        r"^\s*(.{2,}?)\s+\$?(\d{1,3}\.\d{2})\s*-?[A-Za-z]{0,2}\s*$"
    ).unwrap();

    pub static ref PRICE_THEN_NAME: Regex = Regex::new(
        r"^\s*\$?(\d{1,3}\.\d{2})\s+(.{2,}?)\s*$"
    ).unwrap();

    pub static ref ANY_PRICE: Regex = Regex::new(
        r"\$?(\d{1,3}\.\d{2})"
    ).unwrap();

    // TOTAL but not SUBTOTAL; trailing decimal is the declared total
    pub static ref TOTAL_LINE: Regex = Regex::new(
        r"(?i)^\s*\*{0,3}\s*(?:grand\s+)?total\b\D*(\d{1,4}\.\d{2})\s*$"
    ).unwrap();

    pub static ref SUBTOTAL_TAX_TOTAL_LINE: Regex = Regex::new(
        r"(?i)^\s*(sub\s*-?\s*total|subtotal|tax|sales\s+tax|total|balance(\s+due)?|amount\s+due)\b.*\d{1,4}\.\d{2}\s*$"
    ).unwrap();

    // ----- receipt furniture -----

    pub static ref PAYMENT_LINE: Regex = Regex::new(
        r"(?i)^\s*(cash|credit|debit|visa|master\s*card|mastercard|amex|american\s+express|discover|gift\s+card|ebt|check|change(\s+due)?|tend(er)?(ed)?|payment|card\s*#|chip\s+read|contactless|approved|auth(orization)?\b)"
    ).unwrap();

    pub static ref WEIGHT_PRICING_LINE: Regex = Regex::new(
        r"(?i)^\s*\d+(\.\d+)?\s*(lb|lbs|kg|oz)s?\.?\s*@\s*\$?\d{1,3}\.\d{2}"
    ).unwrap();

    pub static ref STORE_NUMBER_LINE: Regex = Regex::new(
        r"(?i)^\s*(store|str|st)\s*#?\s*\d{1,6}\b"
    ).unwrap();

    pub static ref PHONE_LINE: Regex = Regex::new(
        r"(\(\d{3}\)|\b\d{3})[\s.-]?\d{3}[\s.-]?\d{4}\b"
    ).unwrap();

    pub static ref STREET_LINE: Regex = Regex::new(
        r"(?i)^\s*\d{1,6}\s+[A-Za-z0-9][A-Za-z0-9 .'-]*\b(street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|way|parkway|pkwy|highway|hwy|plaza|court|ct)\.?\s*$"
    ).unwrap();

    pub static ref CITY_STATE_ZIP_LINE: Regex = Regex::new(
        r"^\s*([A-Za-z][A-Za-z .'-]{1,30}?)[,\s]+([A-Z]{2})[,\s]+(\d{5})(-\d{4})?\s*$"
    ).unwrap();

    pub static ref THANK_YOU_LINE: Regex = Regex::new(
        r"(?i)(thank\s*you|thanks\s+for\s+shopping|have\s+a\s+(nice|great)\s+day|please\s+come\s+again|welcome\s+to)"
    ).unwrap();

    pub static ref STAFF_LINE: Regex = Regex::new(
        r"(?i)\b(cashier|clerk|operator|your\s+checker|server|manager|associate)\b"
    ).unwrap();

    pub static ref DEPARTMENT_HEADER_LINE: Regex = Regex::new(
        r"(?i)^\s*(grocery|produce|dairy|meat|seafood|bakery|deli|frozen(\s+foods?)?|beverages?|pharmacy|general\s+merchandise|household|liquor|floral)\s*$"
    ).unwrap();

    // multi-word text plus a decimal somewhere: generic item-ish shape
    pub static ref GENERIC_WORDS_PLUS_PRICE: Regex = Regex::new(
        r"^\s*\S+(\s+\S+)+\s+\$?\d{1,3}\.\d{2}\b"
    ).unwrap();

    pub static ref DATE_LINE: Regex = Regex::new(
        r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b"
    ).unwrap();

    // ----- garble signatures (per line) -----

    pub static ref UPPER_RUN_6: Regex = Regex::new(
        r"[A-Z]{6,}"
    ).unwrap();

    // 4+ consecutive 1-2 letter tokens
    pub static ref DENSE_SHORT_TOKENS: Regex = Regex::new(
        r"\b([A-Za-z]{1,2}\s+){3,}[A-Za-z]{1,2}\b"
    ).unwrap();

    pub static ref PUNCT_GLUED_TO_LETTERS: Regex = Regex::new(
        r#"[\[\]{}|\\<>~^*%#@!?;:"'=+_]{2,}[A-Za-z]|[A-Za-z][\[\]{}|\\<>~^*%#@!?;:"'=+_]{2,}"#
    ).unwrap();

    // runs of 1-2 letter words that mix upper and lower case
    pub static ref MIXED_CASE_SHORT_WORDS: Regex = Regex::new(
        r"\b[a-z][A-Z]\b|\b[A-Z][a-z]\b\s+\b[a-z]{1,2}\b\s+\b[A-Z][a-z]?\b"
    ).unwrap();

    pub static ref VOWELLESS_WORD_4: Regex = Regex::new(
        r"\b[b-df-hj-np-tv-zB-DF-HJ-NP-TV-Z]{4,}\b"
    ).unwrap();

    pub static ref CONSONANT_RUN_4: Regex = Regex::new(
        r"[b-df-hj-np-tv-zB-DF-HJ-NP-TV-Z]{4,}"
    ).unwrap();

    // ----- extreme garble indicators (whole text, denser variants) -----

    pub static ref EXTREME_UPPER_RUN: Regex = Regex::new(
        r"[A-Z]{9,}"
    ).unwrap();

    pub static ref EXTREME_CONSONANT_RUN: Regex = Regex::new(
        r"[b-df-hj-np-tv-zB-DF-HJ-NP-TV-Z]{6,}"
    ).unwrap();

    pub static ref EXTREME_SHORT_TOKENS: Regex = Regex::new(
        r"\b([A-Za-z]{1,2}\s+){5,}[A-Za-z]{1,2}\b"
    ).unwrap();

    pub static ref EXTREME_PUNCT_CLUSTER: Regex = Regex::new(
        r#"[\[\]{}|\\<>~^*%#@!?;:"'=+_]{3,}"#
    ).unwrap();

    // vowel-free 5+ letter tokens that aren't plausible receipt abbreviations
    pub static ref NONSENSE_CONSONANT_TOKEN: Regex = Regex::new(
        r"\b[b-df-hj-np-tv-zB-DF-HJ-NP-TV-Z]{5,}\b"
    ).unwrap();

    // ----- classifier rule patterns -----

    pub static ref TAX_PATTERN: Regex = Regex::new(
        r"(?i)\b(sales\s+tax|state\s+tax|local\s+tax|city\s+tax|tax)\b"
    ).unwrap();

    pub static ref FEE_PATTERN: Regex = Regex::new(
        r"(?i)\b(bag\s*(fee|chg|charge)|bottle\s+(deposit|fee)|crv|redemption|recycl\w*|service\s+(fee|charge)|surcharge|env\w*\s+fee)\b"
    ).unwrap();

    pub static ref COUPON_PATTERN: Regex = Regex::new(
        r"(?i)\b(coupon|discount|savings|you\s+saved|saved|member\s+savings|card\s+savings|promo(tion)?|rebate|% off)\b"
    ).unwrap();

    pub static ref NEGATIVE_AMOUNT: Regex = Regex::new(
        r"-\s*\$?\d{1,3}\.\d{2}|\(\s*\$?\d{1,3}\.\d{2}\s*\)"
    ).unwrap();

    pub static ref RECEIPT_ID_PATTERN: Regex = Regex::new(
        r"(?i)\b(receipt|trans(action)?|ref(erence)?|invoice|order)\s*#?\s*\d+"
    ).unwrap();

    pub static ref ALNUM_CODE: Regex = Regex::new(
        r"^[A-Z0-9]{4,}$"
    ).unwrap();

    // ----- enhancer cleanup -----

    pub static ref TRAILING_LONG_DIGITS: Regex = Regex::new(
        r"\s*\d{12,}\s*$"
    ).unwrap();

    pub static ref TRAILING_STATUS_TOKEN: Regex = Regex::new(
        r"(?i)\s+(EA|CT|PK|VOID|WT|NP)$"
    ).unwrap();

    pub static ref MULTI_SPACE: Regex = Regex::new(
        r"\s{2,}"
    ).unwrap();

    pub static ref PURELY_NUMERIC: Regex = Regex::new(
        r"^[\d\s.,#-]+$"
    ).unwrap();
}

/// Three identical letters opening the line ("WWWMLK 3.99"), case-insensitive.
/// A triplet later in the line is often a legitimate word ("GLASSS" typo,
/// "ZZZQUIL") and is left to the other signatures.
pub fn has_leading_letter_triple(s: &str) -> bool {
    let mut chars = s.trim_start().chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(a), Some(b), Some(c)) => {
            a.is_ascii_alphabetic() && a.eq_ignore_ascii_case(&b) && a.eq_ignore_ascii_case(&c)
        }
        _ => false,
    }
}

/// Three identical letters in a row, case-insensitive ("WWWMLK", "aaab")
pub fn has_letter_triple(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(3).any(|w| {
        w[0].is_ascii_alphabetic()
            && w[0].eq_ignore_ascii_case(&w[1])
            && w[0].eq_ignore_ascii_case(&w[2])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_then_price_captures() {
        let caps = NAME_THEN_PRICE.captures("MILK WHOLE GALLON 3.99").unwrap();
        assert_eq!(&caps[1], "MILK WHOLE GALLON");
        assert_eq!(&caps[2], "3.99");
    }

    #[test]
    fn test_name_then_price_with_tax_code() {
        let caps = NAME_THEN_PRICE.captures("KELLOGGS CEREAL 4.49 F").unwrap();
        assert_eq!(&caps[2], "4.49");
    }

    #[test]
    fn test_total_line_excludes_subtotal() {
        assert!(TOTAL_LINE.is_match("TOTAL 6.49"));
        assert!(TOTAL_LINE.is_match("*** TOTAL    23.10"));
        assert!(!TOTAL_LINE.is_match("SUBTOTAL 6.49"));
    }

    #[test]
    fn test_weight_pricing() {
        assert!(WEIGHT_PRICING_LINE.is_match("1.23 lb @ $2.99"));
        assert!(WEIGHT_PRICING_LINE.is_match("0.85 LB @ 1.49"));
    }

    #[test]
    fn test_city_state_zip() {
        let caps = CITY_STATE_ZIP_LINE.captures("LIVERMORE, CA 94550").unwrap();
        assert_eq!(&caps[1], "LIVERMORE");
        assert_eq!(&caps[2], "CA");
        assert_eq!(&caps[3], "94550");
    }

    #[test]
    fn test_letter_triple() {
        assert!(has_letter_triple("WWWMLK 3.99"));
        assert!(has_letter_triple("GLASSS CLEANER"));
        assert!(!has_letter_triple("WHOLE MILK"));
    }

    #[test]
    fn test_leading_letter_triple() {
        assert!(has_leading_letter_triple("WWWMLK 3.99"));
        assert!(has_leading_letter_triple("  qqqX"));
        assert!(!has_leading_letter_triple("GLASSS CLEANER"));
        assert!(!has_leading_letter_triple("111 MAIN"));
    }

    #[test]
    fn test_vowelless_word() {
        assert!(VOWELLESS_WORD_4.is_match("XKCDQ"));
        assert!(!VOWELLESS_WORD_4.is_match("MILK"));
    }

}
