//! Static per-chain location registry used for address-fingerprint matching.
//!
//! Entries are known physical stores; the identifier fuzzy-matches extracted
//! address fragments against them. Phone numbers are stored digits-only.

/// One known store location
#[derive(Debug, Clone, Copy)]
pub struct StoreLocation {
    pub chain: &'static str,
    pub street: &'static str,
    pub city: &'static str,
    pub state: &'static str,
    pub zip: &'static str,
    pub store_number: &'static str,
    pub phone: &'static str,
    /// grocery, warehouse, pharmacy, supercenter
    pub format: &'static str,
}

pub const LOCATIONS: &[StoreLocation] = &[
    StoreLocation {
        chain: "SAFEWAY",
        street: "1554 FIRST STREET",
        city: "LIVERMORE",
        state: "CA",
        zip: "94550",
        store_number: "910",
        phone: "9255550142",
        format: "grocery",
    },
    StoreLocation {
        chain: "SAFEWAY",
        street: "5100 BROADWAY",
        city: "OAKLAND",
        state: "CA",
        zip: "94611",
        store_number: "667",
        phone: "5105550199",
        format: "grocery",
    },
    StoreLocation {
        chain: "COSTCO",
        street: "2800 INDEPENDENCE DRIVE",
        city: "LIVERMORE",
        state: "CA",
        zip: "94551",
        store_number: "146",
        phone: "9255550011",
        format: "warehouse",
    },
    StoreLocation {
        chain: "TRADER JOE'S",
        street: "1122 EAST STANLEY BOULEVARD",
        city: "LIVERMORE",
        state: "CA",
        zip: "94550",
        store_number: "208",
        phone: "9255550077",
        format: "grocery",
    },
    StoreLocation {
        chain: "WALMART",
        street: "4501 ROSEWOOD DRIVE",
        city: "PLEASANTON",
        state: "CA",
        zip: "94588",
        store_number: "2161",
        phone: "9255550246",
        format: "supercenter",
    },
    StoreLocation {
        chain: "CVS",
        street: "3970 EAST AVENUE",
        city: "LIVERMORE",
        state: "CA",
        zip: "94550",
        store_number: "9915",
        phone: "9255550314",
        format: "pharmacy",
    },
    StoreLocation {
        chain: "WALGREENS",
        street: "1511 HOLMES STREET",
        city: "LIVERMORE",
        state: "CA",
        zip: "94550",
        store_number: "4488",
        phone: "9255550420",
        format: "pharmacy",
    },
    StoreLocation {
        chain: "KROGER",
        street: "2620 RICHMOND ROAD",
        city: "LEXINGTON",
        state: "KY",
        zip: "40509",
        store_number: "385",
        phone: "8595550160",
        format: "grocery",
    },
    StoreLocation {
        chain: "TARGET",
        street: "2878 KITTY HAWK ROAD",
        city: "LIVERMORE",
        state: "CA",
        zip: "94551",
        store_number: "2012",
        phone: "9255550523",
        format: "supercenter",
    },
    StoreLocation {
        chain: "WHOLE FOODS",
        street: "100 SAN RAMON VALLEY BOULEVARD",
        city: "DANVILLE",
        state: "CA",
        zip: "94526",
        store_number: "10372",
        phone: "9255550688",
        format: "grocery",
    },
];

/// Store format for a chain name, defaulting to "unknown"
pub fn chain_format(chain: &str) -> &'static str {
    let upper = chain.to_uppercase();
    LOCATIONS
        .iter()
        .find(|loc| loc.chain == upper)
        .map(|loc| loc.format)
        .unwrap_or(match upper.as_str() {
            "ALBERTSONS" | "LUCKY" | "SPROUTS" | "ALDI" | "PUBLIX" | "WINCO" | "RALEYS"
            | "RALEY'S" | "SAVE MART" | "FOOD MAXX" | "MEIJER" | "H-E-B" | "HEB" => "grocery",
            "RITE AID" => "pharmacy",
            _ => "unknown",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_livermore_safeway() {
        let loc = LOCATIONS
            .iter()
            .find(|l| l.chain == "SAFEWAY" && l.store_number == "910")
            .unwrap();
        assert_eq!(loc.street, "1554 FIRST STREET");
        assert_eq!(loc.zip, "94550");
    }

    #[test]
    fn test_chain_format() {
        assert_eq!(chain_format("COSTCO"), "warehouse");
        assert_eq!(chain_format("cvs"), "pharmacy");
        assert_eq!(chain_format("ALDI"), "grocery");
        assert_eq!(chain_format("NO SUCH CHAIN"), "unknown");
    }
}
