//! Store identification: keyword tier, address-fingerprint tier, and the
//! scoring used by the online (geocoding) fallback decision.
//!
//! Tier 1 scans for known chain names and wins immediately at confidence
//! 0.95. Tier 2 extracts address fragments and fuzzy-matches them against
//! the static registry with a weighted score; it runs when Tier 1 fails and
//! also to corroborate a keyword hit. Tier 3 (online) is wired up by the
//! orchestrator when local scores stay below the online threshold.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::models::{StoreIdentity, StoreSource};
use crate::patterns::{CITY_STATE_ZIP_LINE, STREET_LINE};
use crate::registry::{StoreLocation, LOCATIONS};
use crate::similarity::similarity;

lazy_static! {
    /// Chain names recognized verbatim anywhere in the text
    pub static ref KNOWN_CHAIN_PATTERN: Regex = Regex::new(
        r"(?i)\b(SAFEWAY|COSTCO(\s+WHOLESALE)?|WAL-?MART|TARGET|KROGER|TRADER\s+JOE'?S|WHOLE\s+FOODS(\s+MARKET)?|CVS(/PHARMACY)?|WALGREENS|ALBERTSONS|LUCKY|RALEY'?S|SAVE\s+MART|FOOD\s+MAXX|RITE\s+AID|SPROUTS|ALDI|PUBLIX|H-?E-?B|MEIJER|WINCO)\b"
    ).unwrap();

    static ref PHONE_DIGITS: Regex = Regex::new(
        r"\(?(\d{3})\)?[\s.-]?(\d{3})[\s.-]?(\d{4})"
    ).unwrap();

    static ref STORE_NUMBER: Regex = Regex::new(
        r"(?i)(?:store|str)\s*#?\s*(\d{1,6})|#\s?(\d{3,6})\b"
    ).unwrap();

    /// Suffix words stripped before street similarity comparison
    static ref STREET_SUFFIX: Regex = Regex::new(
        r"(?i)\b(STREET|ST|AVENUE|AVE|ROAD|RD|BOULEVARD|BLVD|DRIVE|DR|LANE|LN|WAY|PARKWAY|PKWY|HIGHWAY|HWY|PLAZA|COURT|CT)\.?\b"
    ).unwrap();
}

/// Keyword-tier confidence
const KEYWORD_CONFIDENCE: f64 = 0.95;

/// Minimum normalized address score to accept a registry entry
pub const ADDRESS_ACCEPT_SCORE: f64 = 0.6;

/// Below this, the orchestrator may consult the online fallback
pub const ONLINE_FALLBACK_THRESHOLD: f64 = 0.8;

/// Address fragments pulled from the receipt text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub store_number: Option<String>,
}

impl ExtractedAddress {
    /// Anything usable for matching at all?
    pub fn has_data(&self) -> bool {
        self.street.is_some()
            || self.zip.is_some()
            || self.phone.is_some()
            || (self.city.is_some() && self.state.is_some())
    }

    /// Single-line form handed to the geocoding collaborator
    pub fn to_query(&self) -> String {
        let mut parts = Vec::new();
        if let Some(s) = &self.street {
            parts.push(s.clone());
        }
        if let Some(c) = &self.city {
            parts.push(c.clone());
        }
        if let Some(s) = &self.state {
            parts.push(s.clone());
        }
        if let Some(z) = &self.zip {
            parts.push(z.clone());
        }
        parts.join(", ")
    }
}

/// Extract street/city/state/zip/phone/store-number fragments
pub fn extract_address(text: &str) -> ExtractedAddress {
    let mut addr = ExtractedAddress::default();

    for line in text.lines().map(str::trim) {
        if addr.street.is_none() {
            if let Some(m) = STREET_LINE.find(line) {
                addr.street = Some(m.as_str().trim().to_uppercase());
            }
        }
        if addr.city.is_none() {
            if let Some(caps) = CITY_STATE_ZIP_LINE.captures(line) {
                addr.city = Some(caps[1].trim().to_uppercase());
                addr.state = Some(caps[2].to_string());
                addr.zip = Some(caps[3].to_string());
            }
        }
        if addr.phone.is_none() {
            if let Some(caps) = PHONE_DIGITS.captures(line) {
                addr.phone = Some(format!("{}{}{}", &caps[1], &caps[2], &caps[3]));
            }
        }
        if addr.store_number.is_none() {
            if let Some(caps) = STORE_NUMBER.captures(line) {
                let num = caps.get(1).or_else(|| caps.get(2));
                addr.store_number = num.map(|m| m.as_str().to_string());
            }
        }
    }

    addr
}

fn strip_suffix_words(street: &str) -> String {
    let stripped = STREET_SUFFIX.replace_all(street, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Weighted address score against one registry entry, normalized to [0, 1].
///
/// street similarity 40, exact city 20, exact state 15, exact zip 15,
/// store number 10, phone 5 - out of 100.
pub fn score_against(addr: &ExtractedAddress, loc: &StoreLocation) -> f64 {
    let mut score = 0.0;

    if let Some(street) = &addr.street {
        let ours = strip_suffix_words(street);
        let theirs = strip_suffix_words(loc.street);
        score += 40.0 * similarity(&ours, &theirs);
    }
    if let Some(city) = &addr.city {
        if city.eq_ignore_ascii_case(loc.city) {
            score += 20.0;
        }
    }
    if let Some(state) = &addr.state {
        if state.eq_ignore_ascii_case(loc.state) {
            score += 15.0;
        }
    }
    if let Some(zip) = &addr.zip {
        if zip == loc.zip {
            score += 15.0;
        }
    }
    if let Some(num) = &addr.store_number {
        if num == loc.store_number {
            score += 10.0;
        }
    }
    if let Some(phone) = &addr.phone {
        if phone == loc.phone {
            score += 5.0;
        }
    }

    // the nominal weights sum slightly past 100 when a phone also matches
    (score / 100.0).min(1.0)
}

/// Best-scoring registry entry for the extracted address, if any fragment
/// was usable
pub fn best_address_match(addr: &ExtractedAddress) -> Option<(&'static StoreLocation, f64)> {
    if !addr.has_data() {
        return None;
    }
    LOCATIONS
        .iter()
        .map(|loc| (loc, score_against(addr, loc)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Tier 1 + Tier 2 identification. Returns None when neither tier reaches
/// its acceptance threshold; the orchestrator may then try the online tier.
pub fn identify(text: &str) -> Option<StoreIdentity> {
    let keyword = KNOWN_CHAIN_PATTERN
        .find(text)
        .map(|m| normalize_chain(m.as_str()));

    let addr = extract_address(text);
    let address_match = best_address_match(&addr).filter(|(_, s)| *s > ADDRESS_ACCEPT_SCORE);

    match (keyword, address_match) {
        (Some(chain), Some((loc, score))) => {
            // corroborated keyword hit
            let confidence = if loc.chain == chain {
                (KEYWORD_CONFIDENCE + score * 0.05).min(1.0)
            } else {
                KEYWORD_CONFIDENCE
            };
            debug!(chain = %chain, score, "keyword identification (address corroborated)");
            Some(StoreIdentity {
                name: chain,
                confidence,
                source: StoreSource::Keyword,
            })
        }
        (Some(chain), None) => {
            debug!(chain = %chain, "keyword identification");
            Some(StoreIdentity {
                name: chain,
                confidence: KEYWORD_CONFIDENCE,
                source: StoreSource::Keyword,
            })
        }
        (None, Some((loc, score))) => {
            debug!(chain = loc.chain, score, "address identification");
            Some(StoreIdentity {
                name: loc.chain.to_string(),
                confidence: score,
                source: StoreSource::Address,
            })
        }
        (None, None) => None,
    }
}

/// Canonical uppercase chain name from a regex hit
fn normalize_chain(raw: &str) -> String {
    let upper = raw.to_uppercase().split_whitespace().collect::<Vec<_>>().join(" ");
    match upper.as_str() {
        "WAL-MART" => "WALMART".to_string(),
        "COSTCO WHOLESALE" => "COSTCO".to_string(),
        "WHOLE FOODS MARKET" => "WHOLE FOODS".to_string(),
        "CVS/PHARMACY" => "CVS".to_string(),
        "TRADER JOES" => "TRADER JOE'S".to_string(),
        other => other.to_string(),
    }
}

/// Pharmacy-heavy chains: used as positional context by the classifier
pub fn is_pharmacy_chain(name: &str) -> bool {
    matches!(
        name.to_uppercase().as_str(),
        "CVS" | "WALGREENS" | "RITE AID"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_tier() {
        let id = identify("SAFEWAY\nMILK 3.99\nTOTAL 3.99").unwrap();
        assert_eq!(id.name, "SAFEWAY");
        assert_eq!(id.source, StoreSource::Keyword);
        assert!((id.confidence - 0.95).abs() < 0.06);
    }

    #[test]
    fn test_keyword_normalization() {
        let id = identify("WAL-MART SUPERCENTER\nTOTAL 1.00").unwrap();
        assert_eq!(id.name, "WALMART");
    }

    #[test]
    fn test_address_extraction() {
        let addr = extract_address(
            "1554 FIRST STREET\nLIVERMORE, CA 94550\n(925) 555-0142\nSTORE #910",
        );
        assert_eq!(addr.street.as_deref(), Some("1554 FIRST STREET"));
        assert_eq!(addr.city.as_deref(), Some("LIVERMORE"));
        assert_eq!(addr.state.as_deref(), Some("CA"));
        assert_eq!(addr.zip.as_deref(), Some("94550"));
        assert_eq!(addr.phone.as_deref(), Some("9255550142"));
        assert_eq!(addr.store_number.as_deref(), Some("910"));
    }

    #[test]
    fn test_address_tier_exact_match() {
        // exact registry entry, no chain name anywhere in the text
        let text = "1554 FIRST STREET\nLIVERMORE, CA 94550\nSTORE #910\nMILK 3.99\nTOTAL 3.99";
        let id = identify(text).unwrap();
        assert_eq!(id.name, "SAFEWAY");
        assert_eq!(id.source, StoreSource::Address);
        assert!(id.confidence > 0.9, "confidence {}", id.confidence);
    }

    #[test]
    fn test_address_tier_fuzzy_street() {
        // OCR mangled the street a little; zip + city + state still carry it
        let text = "1554 FIRST STREE7\nLIVERMORE, CA 94550\nTOTAL 1.00";
        let addr = extract_address(text);
        // street regex won't match the mangled line, but city/state/zip do
        let (loc, score) = best_address_match(&addr).unwrap();
        assert_eq!(loc.chain, "SAFEWAY");
        assert!(score > ADDRESS_ACCEPT_SCORE * 0.8);
    }

    #[test]
    fn test_no_identification() {
        assert!(identify("CORNER MARKET\nMILK 2.99\nTOTAL 2.99").is_none());
    }

    #[test]
    fn test_score_weights() {
        let loc = &LOCATIONS[0]; // SAFEWAY #910
        let addr = ExtractedAddress {
            street: Some("1554 FIRST STREET".into()),
            city: Some("LIVERMORE".into()),
            state: Some("CA".into()),
            zip: Some("94550".into()),
            phone: Some("9255550142".into()),
            store_number: Some("910".into()),
        };
        let score = score_against(&addr, loc);
        assert!((score - 1.0).abs() < 1e-9);

        let partial = ExtractedAddress {
            zip: Some("94550".into()),
            ..Default::default()
        };
        assert!((score_against(&partial, loc) - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_pharmacy_chain() {
        assert!(is_pharmacy_chain("CVS"));
        assert!(is_pharmacy_chain("walgreens"));
        assert!(!is_pharmacy_chain("SAFEWAY"));
    }
}
