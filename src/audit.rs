// 📊 Audit Summary - Ledger rows → income / machine / flow / sovereignty
// Aggregates one month of committed rows into the dashboard's three
// sections, each with a qualitative status label.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerRow;
use crate::normalize::parse_amount;

// Category groups, matched on the normalized (lowercased) label.
const EXCLUDE: &[&str] = &["internal", "transfer", "transfers"];
const INCOME: &[&str] = &["external income", "income"];
const MACHINE: &[&str] = &["rent", "food", "transport", "insurance", "medical", "tithe"];
const FLOW: &[&str] = &["gym", "hair", "dining", "hobbies"];
const SOVEREIGNTY: &[&str] = &["savings", "investment", "investments", "savings/investments"];

/// Machine spend above this share of income flips the status to Fragile.
const MACHINE_CEILING: f64 = 0.50;
/// Flow budget as a share of income.
const FLOW_CEILING: f64 = 0.30;

// ============================================================================
// SUMMARY TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSection {
    pub total: f64,
    pub percentage: f64,
    pub status: String,
}

impl AuditSection {
    fn no_data() -> Self {
        AuditSection {
            total: 0.0,
            percentage: 0.0,
            status: "No Data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    pub income: f64,
    pub machine: AuditSection,
    pub flow: AuditSection,
    pub sovereignty: AuditSection,
    pub last_updated: String,
}

impl AuditSummary {
    fn empty() -> Self {
        AuditSummary {
            income: 0.0,
            machine: AuditSection::no_data(),
            flow: AuditSection::no_data(),
            sovereignty: AuditSection::no_data(),
            last_updated: Utc::now().to_rfc3339(),
        }
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

fn normalize_label(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(total: f64, income: f64) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }
    (total / income * 10_000.0).round() / 10_000.0
}

/// Summarize one month of ledger rows.
pub fn summarize(rows: &[LedgerRow]) -> AuditSummary {
    if rows.is_empty() {
        return AuditSummary::empty();
    }

    let mut income_total = 0.0;
    let mut machine_total = 0.0;
    let mut flow_spend = 0.0;
    let mut sovereignty_total = 0.0;
    let mut tithe_total = 0.0;

    for row in rows {
        let category = normalize_label(&row.category);
        if category.is_empty() || EXCLUDE.contains(&category.as_str()) {
            continue;
        }
        let amount = match parse_amount(&row.amount) {
            Some(v) if v != 0.0 => v.abs(),
            _ => continue,
        };

        if INCOME.contains(&category.as_str()) {
            income_total += amount;
        }
        if MACHINE.contains(&category.as_str()) {
            machine_total += amount;
            if category == "tithe" {
                tithe_total += amount;
            }
        }
        if FLOW.contains(&category.as_str()) {
            flow_spend += amount;
        }
        if SOVEREIGNTY.contains(&category.as_str()) {
            sovereignty_total += amount;
        }
    }

    // Flow shows the full budget envelope: spend plus unspent headroom,
    // clamped so overspending never produces negative headroom.
    let flow_target = income_total * FLOW_CEILING;
    let flow_unspent = (flow_target - flow_spend).max(0.0);
    let flow_total = flow_spend + flow_unspent;

    let (machine_status, flow_status) = if income_total <= 0.0 {
        ("No Data".to_string(), "No Data".to_string())
    } else {
        (
            if machine_total <= income_total * MACHINE_CEILING {
                "Antifragile".to_string()
            } else {
                "Fragile".to_string()
            },
            if flow_total <= income_total * FLOW_CEILING {
                "Disciplined".to_string()
            } else {
                "Undisciplined".to_string()
            },
        )
    };

    let sovereignty_status = if income_total <= 0.0 {
        "No Data".to_string()
    } else if tithe_total > 0.0 && sovereignty_total > 0.0 {
        "Steward".to_string()
    } else {
        "Needs Stewardship".to_string()
    };

    AuditSummary {
        income: round2(income_total),
        machine: AuditSection {
            total: round2(machine_total),
            percentage: percentage(machine_total, income_total),
            status: machine_status,
        },
        flow: AuditSection {
            total: round2(flow_total),
            percentage: percentage(flow_total, income_total),
            status: flow_status,
        },
        sovereignty: AuditSection {
            total: round2(sovereignty_total),
            percentage: percentage(sovereignty_total, income_total),
            status: sovereignty_status,
        },
        last_updated: Utc::now().to_rfc3339(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, amount: &str) -> LedgerRow {
        LedgerRow {
            row_id: 0,
            date: "2024-12-02".to_string(),
            description: "test".to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
            machine_pillar: String::new(),
            integrity_filter: String::new(),
            root_trigger: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_empty_ledger_is_no_data() {
        let summary = summarize(&[]);
        assert_eq!(summary.income, 0.0);
        assert_eq!(summary.machine.status, "No Data");
        assert_eq!(summary.flow.status, "No Data");
        assert_eq!(summary.sovereignty.status, "No Data");
    }

    #[test]
    fn test_no_income_is_no_data() {
        let rows = vec![row("Rent", "-9500.00")];
        let summary = summarize(&rows);
        assert_eq!(summary.income, 0.0);
        assert_eq!(summary.machine.status, "No Data");
        assert_eq!(summary.machine.total, 9500.0);
        assert_eq!(summary.machine.percentage, 0.0);
    }

    #[test]
    fn test_antifragile_machine() {
        let rows = vec![row("Income", "20000"), row("Rent", "-9000"), row("Food", "-1000")];
        let summary = summarize(&rows);
        assert_eq!(summary.income, 20000.0);
        assert_eq!(summary.machine.total, 10000.0);
        assert_eq!(summary.machine.percentage, 0.5);
        assert_eq!(summary.machine.status, "Antifragile");
    }

    #[test]
    fn test_fragile_machine() {
        let rows = vec![row("Income", "10000"), row("Rent", "-6000")];
        let summary = summarize(&rows);
        assert_eq!(summary.machine.status, "Fragile");
    }

    #[test]
    fn test_flow_includes_unspent_headroom() {
        let rows = vec![row("Income", "10000"), row("Dining", "-1000")];
        let summary = summarize(&rows);
        // Spend 1000 + 2000 headroom up to the 30% envelope
        assert_eq!(summary.flow.total, 3000.0);
        assert_eq!(summary.flow.status, "Disciplined");
    }

    #[test]
    fn test_flow_overspend_is_undisciplined() {
        let rows = vec![row("Income", "10000"), row("Dining", "-4000")];
        let summary = summarize(&rows);
        assert_eq!(summary.flow.total, 4000.0);
        assert_eq!(summary.flow.status, "Undisciplined");
    }

    #[test]
    fn test_steward_needs_tithe_and_savings() {
        let rows = vec![
            row("Income", "10000"),
            row("Tithe", "-1000"),
            row("Savings", "-2000"),
        ];
        assert_eq!(summarize(&rows).sovereignty.status, "Steward");

        let no_tithe = vec![row("Income", "10000"), row("Savings", "-2000")];
        assert_eq!(summarize(&no_tithe).sovereignty.status, "Needs Stewardship");
    }

    #[test]
    fn test_excluded_and_zero_rows_are_skipped() {
        let rows = vec![
            row("Income", "10000"),
            row("Transfers", "-5000"),
            row("Internal", "-5000"),
            row("Rent", "0"),
            row("", "-100"),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.income, 10000.0);
        assert_eq!(summary.machine.total, 0.0);
    }
}
