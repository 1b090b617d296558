//! Layered correction dictionaries for receipt item names.
//!
//! Applied by the enhancer in fixed priority: store-specific brands first,
//! then universal food terms, store-brand prefixes, national-brand typos,
//! and unit expansions. Word dictionaries substitute whole words
//! case-insensitively; phrase rewrites are literal multi-word replacements.

use crate::models::Category;

/// Store-specific brand abbreviations, selected by matched store name
pub fn store_brand_dictionary(store: &str) -> &'static [(&'static str, &'static str)] {
    match store.to_uppercase().as_str() {
        "SAFEWAY" => &[
            ("G-P", "Grey Poupon"),
            ("GP", "Grey Poupon"),
            ("LUC", "Lucerne"),
            ("LCRN", "Lucerne"),
            ("OO", "O Organics"),
            ("SEL", "Signature Select"),
        ],
        "KROGER" => &[
            ("KRO", "Kroger"),
            ("PSST", "Psst"),
            ("SMPL", "Simple Truth"),
        ],
        "COSTCO" => &[("KS", "Kirkland Signature"), ("KIRK", "Kirkland Signature")],
        "WALMART" => &[("GV", "Great Value"), ("MS", "Marketside")],
        "TRADER JOE'S" => &[("TJ", "Trader Joe's"), ("TJS", "Trader Joe's")],
        "TARGET" => &[("MP", "Market Pantry"), ("GG", "Good & Gather")],
        _ => &[],
    }
}

/// Universal food-term corrections for vowel-dropped OCR output
pub const FOOD_TERMS: &[(&str, &str)] = &[
    ("MLK", "Milk"),
    ("BRD", "Bread"),
    ("CHKN", "Chicken"),
    ("CHCKN", "Chicken"),
    ("BF", "Beef"),
    ("GRND", "Ground"),
    ("CHS", "Cheese"),
    ("CHDR", "Cheddar"),
    ("WHL", "Whole"),
    ("WHT", "Wheat"),
    ("ORG", "Organic"),
    ("ORGNC", "Organic"),
    ("STRWBRY", "Strawberry"),
    ("BTTR", "Butter"),
    ("YGRT", "Yogurt"),
    ("TMTO", "Tomato"),
    ("PNT", "Peanut"),
    ("CRM", "Cream"),
    ("SGR", "Sugar"),
    ("FLR", "Flour"),
    ("JCE", "Juice"),
    ("VEG", "Vegetable"),
    ("FRZ", "Frozen"),
    ("BNLS", "Boneless"),
    ("SKNLS", "Skinless"),
];

/// Store-brand prefixes that read the same at any chain
pub const STORE_BRAND_PREFIXES: &[(&str, &str)] = &[
    ("SIG", "Signature Select"),
    ("SS", "Signature Select"),
    ("KIRKLND", "Kirkland Signature"),
    ("GRTVAL", "Great Value"),
    ("365", "365 Everyday Value"),
];

/// National-brand typo corrections
pub const BRAND_TYPOS: &[(&str, &str)] = &[
    ("KELLOGS", "Kellogg's"),
    ("KELLOGGS", "Kellogg's"),
    ("HIENZ", "Heinz"),
    ("HELLMANS", "Hellmann's"),
    ("NESQUICK", "Nesquik"),
    ("CHEERIOS", "Cheerios"),
    ("DORITO", "Doritos"),
    ("PEPSICO", "Pepsi"),
    ("NABSCO", "Nabisco"),
];

/// Unit and measurement expansions
pub const UNIT_EXPANSIONS: &[(&str, &str)] = &[
    ("GAL", "Gallon"),
    ("QT", "Quart"),
    ("DZ", "Dozen"),
    ("DOZ", "Dozen"),
    ("PKG", "Package"),
    ("BTL", "Bottle"),
];

/// Literal multi-word rewrites for known compound abbreviations
pub const PHRASE_REWRITES: &[(&str, &str)] = &[
    ("LND O LKS", "Land O Lakes"),
    ("LND O LAKES", "Land O Lakes"),
    ("BEN JERRY", "Ben & Jerry's"),
    ("BEN JERRYS", "Ben & Jerry's"),
    ("HLF HLF", "Half & Half"),
    ("HALF HALF", "Half & Half"),
    ("MAC CHS", "Macaroni & Cheese"),
    ("MAC N CHS", "Macaroni & Cheese"),
    ("PB J", "Peanut Butter & Jelly"),
    ("S PELLEGRINO", "San Pellegrino"),
];

/// Keyword-to-category table; first match wins, scanned in order.
pub const CATEGORY_KEYWORDS: &[(&str, Category)] = &[
    ("tax", Category::Tax),
    ("fee", Category::Fee),
    ("deposit", Category::Fee),
    ("milk", Category::Dairy),
    ("cheese", Category::Dairy),
    ("yogurt", Category::Dairy),
    ("butter", Category::Dairy),
    ("cream", Category::Dairy),
    ("egg", Category::Dairy),
    ("half & half", Category::Dairy),
    ("banana", Category::Produce),
    ("apple", Category::Produce),
    ("orange juice", Category::Beverages),
    ("juice", Category::Beverages),
    ("orange", Category::Produce),
    ("strawberr", Category::Produce),
    ("lettuce", Category::Produce),
    ("tomato", Category::Produce),
    ("avocado", Category::Produce),
    ("onion", Category::Produce),
    ("potato", Category::Produce),
    ("produce", Category::Produce),
    ("chicken", Category::Meat),
    ("beef", Category::Meat),
    ("pork", Category::Meat),
    ("turkey", Category::Meat),
    ("bacon", Category::Meat),
    ("salmon", Category::Seafood),
    ("shrimp", Category::Seafood),
    ("tuna", Category::Seafood),
    ("fish", Category::Seafood),
    ("bread", Category::Bakery),
    ("bagel", Category::Bakery),
    ("loaf", Category::Bakery),
    ("muffin", Category::Bakery),
    ("sourdough", Category::Bakery),
    ("deli", Category::Deli),
    ("rotisserie", Category::Deli),
    ("frozen", Category::Frozen),
    ("ice cream", Category::Frozen),
    ("pizza", Category::Frozen),
    ("water", Category::Beverages),
    ("soda", Category::Beverages),
    ("coffee", Category::Beverages),
    ("tea", Category::Beverages),
    ("chip", Category::Snacks),
    ("cracker", Category::Snacks),
    ("cookie", Category::Snacks),
    ("candy", Category::Snacks),
    ("granola", Category::Snacks),
    ("popcorn", Category::Snacks),
    ("detergent", Category::Household),
    ("paper towel", Category::Household),
    ("tissue", Category::Household),
    ("cleaner", Category::Household),
    ("trash bag", Category::Household),
    ("foil", Category::Household),
    ("shampoo", Category::PersonalCare),
    ("toothpaste", Category::PersonalCare),
    ("deodorant", Category::PersonalCare),
    ("soap", Category::PersonalCare),
    ("lotion", Category::PersonalCare),
    ("razor", Category::PersonalCare),
    ("vitamin", Category::Pharmacy),
    ("aspirin", Category::Pharmacy),
    ("ibuprofen", Category::Pharmacy),
    ("medicine", Category::Pharmacy),
    ("diaper", Category::Baby),
    ("formula", Category::Baby),
    ("wipes", Category::Baby),
    ("dog", Category::Pet),
    ("cat ", Category::Pet),
    ("pet ", Category::Pet),
    ("cereal", Category::Pantry),
    ("pasta", Category::Pantry),
    ("rice", Category::Pantry),
    ("sauce", Category::Pantry),
    ("mustard", Category::Pantry),
    ("ketchup", Category::Pantry),
    ("mayo", Category::Pantry),
    ("flour", Category::Pantry),
    ("sugar", Category::Pantry),
    ("oil", Category::Pantry),
    ("soup", Category::Pantry),
    ("beans", Category::Pantry),
    ("peanut butter", Category::Pantry),
];

/// First matching category for an enhanced name, else Other
pub fn categorize(name: &str) -> Category {
    let lower = name.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(kw, _)| lower.contains(kw))
        .map(|(_, cat)| *cat)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        // "orange juice" must hit Beverages before "orange" hits Produce
        assert_eq!(categorize("Orange Juice"), Category::Beverages);
        assert_eq!(categorize("Navel Orange"), Category::Produce);
    }

    #[test]
    fn test_categorize_basics() {
        assert_eq!(categorize("Whole Milk Gallon"), Category::Dairy);
        assert_eq!(categorize("Grey Poupon Mustard"), Category::Pantry);
        assert_eq!(categorize("Mystery Item"), Category::Other);
    }

    #[test]
    fn test_store_dictionary_selection() {
        assert!(store_brand_dictionary("SAFEWAY")
            .iter()
            .any(|(k, _)| *k == "G-P"));
        assert!(store_brand_dictionary("safeway")
            .iter()
            .any(|(k, _)| *k == "G-P"));
        assert!(store_brand_dictionary("NOWHERE").is_empty());
    }
}
