// 🏷️ Category Taxonomy - Fixed, externally-supplied enumeration
// Categories, machine pillars, integrity filters, and root triggers are
// configuration data, never derived from transactions.

/// Terminal suggestion for anything we can't place. Rows carrying it are
/// flagged needs-review and are never silently recategorized.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// The fixed category list. Order matters only for display.
pub const FIXED_CATEGORIES: [&str; 20] = [
    "Income",
    "Housing",
    "Utilities",
    "Groceries",
    "Dining",
    "Transport",
    "Travel",
    "Shopping",
    "Subscriptions",
    "Health",
    "Education",
    "Business",
    "Taxes",
    "Fees",
    "Transfers",
    "Overföring",
    "Tithe",
    "Charity",
    "Savings/Investments",
    UNCATEGORIZED,
];

/// Machine pillar labels (spreadsheet column E).
pub const MACHINE_PILLARS: [&str; 5] = ["Needs", "Wants", "Faith", "Growth", "Internal"];

/// Integrity filter labels (spreadsheet column F).
pub const INTEGRITY_FILTERS: [&str; 3] = ["Planned", "Impulse", "Silent Test Fail"];

/// Root trigger labels (spreadsheet column G).
pub const ROOT_TRIGGERS: [&str; 4] = ["Stress", "Ego", "Social", "Stewardship"];

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Match free text onto the fixed spelling of a category.
///
/// Case-insensitive, ignores surrounding whitespace and a trailing period
/// (model replies tend to add one). Returns None when the text is not
/// exactly one fixed category.
pub fn match_fixed_category(value: &str) -> Option<&'static str> {
    let trimmed = value.trim().trim_end_matches('.').trim();
    if trimmed.is_empty() {
        return None;
    }
    FIXED_CATEGORIES
        .iter()
        .find(|category| trimmed.eq_ignore_ascii_case(category))
        .copied()
}

/// Normalize an optional category onto the fixed taxonomy.
///
/// Anything that doesn't match a fixed category collapses to Uncategorized.
pub fn normalize_category(value: Option<&str>) -> String {
    value
        .and_then(match_fixed_category)
        .unwrap_or(UNCATEGORIZED)
        .to_string()
}

/// Derive the machine pillar for a category.
///
/// Fixed mapping; categories with no pillar return "".
pub fn derive_pillar(category: &str) -> &'static str {
    let lowered = category.trim().to_lowercase();
    match lowered.as_str() {
        "overföring" | "transfers" => "Internal",
        "rent" | "housing" | "utilities" | "groceries" | "transport" | "health" => "Needs",
        "dining" | "shopping" | "subscriptions" | "travel" => "Wants",
        "tithe" | "charity" => "Faith",
        "savings/investments" | "education" | "business" => "Growth",
        _ => "",
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_fixed_category_case_insensitive() {
        assert_eq!(match_fixed_category("groceries"), Some("Groceries"));
        assert_eq!(match_fixed_category("GROCERIES"), Some("Groceries"));
        assert_eq!(match_fixed_category("  Dining  "), Some("Dining"));
    }

    #[test]
    fn test_match_fixed_category_trailing_period() {
        assert_eq!(match_fixed_category("Transport."), Some("Transport"));
    }

    #[test]
    fn test_match_fixed_category_rejects_partial() {
        assert_eq!(match_fixed_category("Grocer"), None);
        assert_eq!(match_fixed_category("Groceries and Dining"), None);
        assert_eq!(match_fixed_category(""), None);
    }

    #[test]
    fn test_normalize_category_unknown_collapses() {
        assert_eq!(normalize_category(Some("Gadgets")), UNCATEGORIZED);
        assert_eq!(normalize_category(None), UNCATEGORIZED);
        assert_eq!(normalize_category(Some("savings/investments")), "Savings/Investments");
    }

    #[test]
    fn test_derive_pillar_mapping() {
        assert_eq!(derive_pillar("Housing"), "Needs");
        assert_eq!(derive_pillar("Dining"), "Wants");
        assert_eq!(derive_pillar("Tithe"), "Faith");
        assert_eq!(derive_pillar("Education"), "Growth");
        assert_eq!(derive_pillar("Transfers"), "Internal");
        assert_eq!(derive_pillar("Income"), "");
        assert_eq!(derive_pillar(UNCATEGORIZED), "");
    }

    #[test]
    fn test_uncategorized_is_a_fixed_category() {
        assert!(FIXED_CATEGORIES.contains(&UNCATEGORIZED));
    }
}
