// 🧹 Normalization - Canonical forms for dates, amounts, and text
// Dedup identity is (normalized date, normalized amount, normalized
// description), so everything funnels through here before comparison.

use chrono::NaiveDate;

/// Date formats accepted from statements, tried in order.
/// DD/MM comes before MM/DD: ambiguous dates resolve European-first.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%m-%d-%Y",
];

/// Trim and collapse internal whitespace.
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase a merchant string and strip digits/punctuation.
/// Preview metadata only; never used for dedup.
pub fn normalize_merchant(value: &str) -> String {
    let lowered = normalize_text(value).to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_ascii_lowercase() { c } else { ' ' })
        .collect();
    normalize_text(&cleaned)
}

/// Parse a date in any accepted format.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    None
}

/// Normalize a date string to ISO `YYYY-MM-DD`. None if unparseable.
pub fn normalize_date(value: &str) -> Option<String> {
    parse_date(value).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Parse an amount string to a float.
///
/// Spaces are stripped. When both `,` and `.` appear the comma is a
/// thousands separator; a lone comma is a decimal point.
pub fn parse_amount(value: &str) -> Option<f64> {
    let mut raw = value.trim().replace(' ', "");
    if raw.is_empty() {
        return None;
    }
    if raw.contains(',') && raw.contains('.') {
        raw = raw.replace(',', "");
    } else {
        raw = raw.replace(',', ".");
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Canonical amount string with exactly two decimals. None if unparseable.
pub fn normalize_amount(value: &str) -> Option<String> {
    parse_amount(value).map(|v| format!("{:.2}", v))
}

/// Compare two amount strings.
///
/// Numeric comparison when both sides parse; otherwise falls back to a
/// case-insensitive text comparison so junk cells still dedup against
/// themselves.
pub fn amounts_match(left: &str, right: &str) -> bool {
    match (normalize_amount(left), normalize_amount(right)) {
        (Some(l), Some(r)) => l == r,
        _ => normalize_text(left).eq_ignore_ascii_case(&normalize_text(right)),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("  ICA   Supermarket \t Kista "), "ICA Supermarket Kista");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_normalize_merchant_strips_noise() {
        assert_eq!(normalize_merchant("ICA SUPERMARKET 4521"), "ica supermarket");
        assert_eq!(normalize_merchant("UBER *EATS"), "uber eats");
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2024-12-25").as_deref(), Some("2024-12-25"));
        assert_eq!(normalize_date("2024/12/25").as_deref(), Some("2024-12-25"));
        assert_eq!(normalize_date("25.12.2024").as_deref(), Some("2024-12-25"));
        assert_eq!(normalize_date("25-12-2024").as_deref(), Some("2024-12-25"));
    }

    #[test]
    fn test_normalize_date_european_first() {
        // 03/04 is ambiguous: DD/MM wins
        assert_eq!(normalize_date("03/04/2024").as_deref(), Some("2024-04-03"));
    }

    #[test]
    fn test_normalize_date_rejects_garbage() {
        assert_eq!(normalize_date("not a date"), None);
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("2024-13-45"), None);
    }

    #[test]
    fn test_normalize_amount_comma_decimal() {
        assert_eq!(normalize_amount("-1 234,56").as_deref(), Some("-1234.56"));
        assert_eq!(normalize_amount("45,9").as_deref(), Some("45.90"));
    }

    #[test]
    fn test_normalize_amount_thousands_separator() {
        assert_eq!(normalize_amount("1,234.56").as_deref(), Some("1234.56"));
    }

    #[test]
    fn test_normalize_amount_plain() {
        assert_eq!(normalize_amount("-855.94").as_deref(), Some("-855.94"));
        assert_eq!(normalize_amount("100").as_deref(), Some("100.00"));
    }

    #[test]
    fn test_normalize_amount_rejects_garbage() {
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(normalize_amount(""), None);
    }

    #[test]
    fn test_amounts_match_numeric() {
        assert!(amounts_match("100", "100.00"));
        assert!(amounts_match("-1 234,56", "-1234.56"));
        assert!(!amounts_match("100.00", "100.01"));
    }

    #[test]
    fn test_amounts_match_text_fallback() {
        assert!(amounts_match("N/A", "n/a"));
        assert!(!amounts_match("N/A", "100.00"));
    }
}
