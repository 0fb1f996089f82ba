// 🔮 Category Suggestion - Heuristic keyword table + model-backed mode
// Two interchangeable strategies. The heuristic is the floor: model mode
// falls back to it whenever the engine is unreachable or replies with
// something that isn't exactly one fixed category.

use serde::{Deserialize, Serialize};

use crate::categories::{derive_pillar, UNCATEGORIZED};
use crate::normalize::normalize_text;

// ============================================================================
// SUGGESTION MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionMode {
    /// Fixed keyword rules only (default)
    Heuristic,

    /// Ask the reasoning engine, fall back to heuristic
    Model,
}

impl SuggestionMode {
    /// Parse from configuration. Anything unrecognized means heuristic.
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "model" => SuggestionMode::Model,
            _ => SuggestionMode::Heuristic,
        }
    }
}

impl Default for SuggestionMode {
    fn default() -> Self {
        SuggestionMode::Heuristic
    }
}

// ============================================================================
// HEURISTIC RULES
// ============================================================================

/// Keyword table, walked in order. First hit wins, so more specific
/// categories sit above catch-alls like Transfers.
const CATEGORY_HINTS: &[(&str, &[&str])] = &[
    ("Housing", &["rent", "mortgage", "lease", "hyra"]),
    ("Utilities", &["electric", "electricity", "water", "internet", "phone", "wifi"]),
    ("Groceries", &["grocery", "supermarket", "ica", "coop", "lidl", "willys"]),
    ("Dining", &["restaurant", "cafe", "coffee", "bar", "pizza", "burger"]),
    ("Transport", &["uber", "taxi", "bus", "metro", "train", "sl", "tram"]),
    ("Travel", &["hotel", "flight", "airbnb", "booking", "ryanair", "sas"]),
    ("Shopping", &["amazon", "ikea", "h&m", "zara", "shop"]),
    ("Subscriptions", &["netflix", "spotify", "subscription", "adobe"]),
    ("Health", &["pharmacy", "doctor", "clinic", "gym"]),
    ("Education", &["course", "tuition", "udemy", "coursera"]),
    ("Business", &["invoice", "client", "office", "supplies"]),
    ("Taxes", &["tax", "skatt"]),
    ("Fees", &["fee", "charge", "commission"]),
    ("Tithe", &["church", "tithe", "tionde", "we are one church", "hillsong", "filadelfia"]),
    ("Charity", &["charity", "donation", "gift", "red cross", "unicef"]),
    (
        "Overföring",
        &[
            "överföring",
            "overföring",
            "internal transfer",
            "balance movement",
            "account transfer",
            "egen överföring",
        ],
    ),
    ("Transfers", &["transfer", "bank", "swish"]),
    ("Savings/Investments", &["investment", "savings", "fund", "stock"]),
    ("Income", &["salary", "payroll", "income", "refund"]),
];

/// Suggest a category from fixed keyword rules.
///
/// Positive amounts with no keyword hit suggest Income; everything else
/// lands on Uncategorized.
pub fn suggest_heuristic(description: &str, amount: Option<f64>) -> String {
    let text = normalize_text(description).to_lowercase();
    for (category, keywords) in CATEGORY_HINTS {
        for keyword in *keywords {
            if text.contains(keyword) {
                return (*category).to_string();
            }
        }
    }
    if let Some(value) = amount {
        if value > 0.0 {
            return "Income".to_string();
        }
    }
    UNCATEGORIZED.to_string()
}

/// Suggested category plus its derived labels, as placed on a preview row.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub category: String,
    pub machine_pillar: String,
    pub needs_review: bool,
}

impl Suggestion {
    pub fn from_category(category: String) -> Self {
        let machine_pillar = derive_pillar(&category).to_string();
        let needs_review = category == UNCATEGORIZED;
        Suggestion {
            category,
            machine_pillar,
            needs_review,
        }
    }
}

/// Run the heuristic strategy for one row.
pub fn suggest(description: &str, amount: Option<f64>) -> Suggestion {
    Suggestion::from_category(suggest_heuristic(description, amount))
}

// ============================================================================
// MODEL MODE
// ============================================================================

/// Re-suggest a preview batch through the reasoning engine.
///
/// Rows already carry their heuristic suggestion; the engine only replaces
/// it when it answers with exactly one fixed category. Engine failures are
/// logged and leave the row untouched.
pub async fn apply_model_suggestions(
    client: &crate::agent::ReasoningClient,
    rows: &mut [crate::ingest::PreviewTransaction],
) {
    for row in rows.iter_mut() {
        match client.suggest_category(&row.description, &row.amount).await {
            Ok(Some(category)) => {
                let refreshed = Suggestion::from_category(category);
                row.category_suggested = refreshed.category;
                row.machine_pillar = refreshed.machine_pillar;
                row.needs_review = refreshed.needs_review;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    source_row = row.source_row,
                    error = %format!("{err:#}"),
                    "model suggestion failed, keeping heuristic"
                );
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_keyword_hit() {
        assert_eq!(suggest_heuristic("ICA SUPERMARKET KISTA", Some(-450.0)), "Groceries");
        assert_eq!(suggest_heuristic("Netflix subscription", Some(-99.0)), "Subscriptions");
        assert_eq!(suggest_heuristic("Hyra december", Some(-9500.0)), "Housing");
    }

    #[test]
    fn test_heuristic_first_hit_wins() {
        // "gym" sits in Health, above the Transfers catch-all "bank"
        assert_eq!(suggest_heuristic("Gym membership bank draft", Some(-300.0)), "Health");
    }

    #[test]
    fn test_heuristic_positive_amount_is_income() {
        assert_eq!(suggest_heuristic("Monthly pay", Some(28000.0)), "Income");
    }

    #[test]
    fn test_heuristic_no_hit_is_uncategorized() {
        assert_eq!(suggest_heuristic("XYZZY 12345", Some(-10.0)), UNCATEGORIZED);
        assert_eq!(suggest_heuristic("XYZZY 12345", None), UNCATEGORIZED);
    }

    #[test]
    fn test_suggestion_flags_needs_review() {
        let s = suggest("XYZZY 12345", Some(-10.0));
        assert_eq!(s.category, UNCATEGORIZED);
        assert!(s.needs_review);
        assert_eq!(s.machine_pillar, "");

        let s = suggest("ICA SUPERMARKET", Some(-450.0));
        assert!(!s.needs_review);
        assert_eq!(s.machine_pillar, "Needs");
    }

    #[test]
    fn test_mode_from_config() {
        assert_eq!(SuggestionMode::from_config("model"), SuggestionMode::Model);
        assert_eq!(SuggestionMode::from_config("Model "), SuggestionMode::Model);
        assert_eq!(SuggestionMode::from_config("heuristic"), SuggestionMode::Heuristic);
        assert_eq!(SuggestionMode::from_config("anything"), SuggestionMode::Heuristic);
    }
}
