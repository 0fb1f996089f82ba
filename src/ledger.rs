// 📒 Ledger Store - Append-only workbook with row-wise idempotent commits
// One CSV sheet per calendar month, eight fixed columns. A row's identity
// is (date, amount, description); appending an already-present identity is
// a no-op, never an error. Corrections are new rows: the ledger is a log,
// not a mutable table.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::categories::UNCATEGORIZED;
use crate::normalize::{amounts_match, normalize_date, normalize_text};

/// Fixed sheet columns, in order.
pub const LEDGER_HEADERS: [&str; 8] = [
    "Date",
    "Description",
    "Amount",
    "Category",
    "Machine Pillar",
    "Integrity Filter",
    "Root Trigger",
    "Notes",
];

// ============================================================================
// ROW TYPES
// ============================================================================

/// One committed row as read back from a sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Physical 1-based row number in the sheet (header included)
    pub row_id: usize,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub category: String,
    pub machine_pillar: String,
    pub integrity_filter: String,
    pub root_trigger: String,
    pub notes: String,
}

/// One row to be appended.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub category: String,
    pub machine_pillar: String,
    pub integrity_filter: String,
    pub root_trigger: String,
    pub notes: String,
}

/// Per-row append result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    Duplicate,
}

/// Batch commit report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub appended: usize,
    pub duplicates: usize,
}

/// Sheet name for a date: `YYYY-MM`. Unparseable dates land in the
/// current month rather than failing the append.
pub fn monthly_sheet_name(date: &str) -> String {
    match normalize_date(date) {
        Some(iso) => iso[..7].to_string(),
        None => Utc::now().format("%Y-%m").to_string(),
    }
}

// ============================================================================
// LEDGER STORE TRAIT
// ============================================================================

/// The two operations the rest of the system needs from the ledger:
/// list a month's rows, and append with a duplicate check.
pub trait LedgerStore: Send + Sync {
    /// All rows of one month sheet, in append order. Empty when the sheet
    /// doesn't exist yet.
    fn list_month(&self, month: &str) -> Result<Vec<LedgerRow>>;

    /// Append one row unless its (date, amount, description) identity is
    /// already present in its month sheet.
    fn append(&self, entry: &NewEntry) -> Result<AppendOutcome>;

    /// Row-wise idempotent batch append. Each row is independently checked
    /// and appended; one row's failure aborts the remainder but never rolls
    /// back rows already written, so re-running the same batch is safe.
    fn append_batch(&self, entries: &[NewEntry]) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for entry in entries {
            match self.append(entry)? {
                AppendOutcome::Appended => report.appended += 1,
                AppendOutcome::Duplicate => report.duplicates += 1,
            }
        }
        Ok(report)
    }
}

// ============================================================================
// WORKBOOK STORE (CSV sheets in a directory)
// ============================================================================

/// Ledger backed by a directory of per-month CSV sheets.
pub struct WorkbookLedgerStore {
    dir: PathBuf,
}

impl WorkbookLedgerStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        WorkbookLedgerStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn sheet_path(&self, month: &str) -> PathBuf {
        self.dir.join(format!("{month}.csv"))
    }

    fn read_sheet(&self, month: &str) -> Result<Vec<Vec<String>>> {
        let path = self.sheet_path(month);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .with_context(|| format!("failed to open sheet {}", path.display()))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.with_context(|| format!("failed to read sheet {}", path.display()))?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(rows)
    }

    /// Create the month sheet with its header row. Returns true when the
    /// sheet was created by this call.
    fn ensure_sheet(&self, month: &str) -> Result<bool> {
        let path = self.sheet_path(month);
        if path.exists() {
            return Ok(false);
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create ledger dir {}", self.dir.display()))?;

        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create sheet {}", path.display()))?;
        writer.write_record(LEDGER_HEADERS)?;
        writer.flush()?;
        tracing::info!(month, "ledger sheet created");
        Ok(true)
    }

    fn is_duplicate(&self, month: &str, date: &str, amount: &str, description: &str) -> Result<bool> {
        let rows = self.read_sheet(month)?;
        let start = if rows.first().map(|r| row_is_header(r)).unwrap_or(false) {
            1
        } else {
            0
        };

        let target_date = normalize_date(date).unwrap_or_else(|| date.trim().to_string());
        let target_desc = normalize_text(description);

        for row in &rows[start..] {
            let row_date = row
                .first()
                .map(|c| normalize_date(c).unwrap_or_else(|| c.trim().to_string()))
                .unwrap_or_default();
            let row_desc = row.get(1).map(|c| normalize_text(c)).unwrap_or_default();
            let row_amount = row.get(2).map(String::as_str).unwrap_or("");
            if row_date == target_date
                && row_desc == target_desc
                && amounts_match(row_amount, amount)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn row_is_header(row: &[String]) -> bool {
    if row.len() < LEDGER_HEADERS.len() {
        return false;
    }
    row.iter()
        .zip(LEDGER_HEADERS.iter())
        .all(|(cell, header)| normalize_text(cell).eq_ignore_ascii_case(header))
}

impl LedgerStore for WorkbookLedgerStore {
    fn list_month(&self, month: &str) -> Result<Vec<LedgerRow>> {
        let rows = self.read_sheet(month)?;
        let start = if rows.first().map(|r| row_is_header(r)).unwrap_or(false) {
            1
        } else {
            0
        };

        let mut out = Vec::new();
        for (i, row) in rows[start..].iter().enumerate() {
            let get = |idx: usize| row.get(idx).map(|c| c.trim().to_string()).unwrap_or_default();
            let date = row
                .first()
                .map(|c| normalize_date(c).unwrap_or_else(|| c.trim().to_string()))
                .unwrap_or_default();
            let description = get(1);
            let amount = get(2);
            let category = get(3);

            // Skip rows that are blank across the identity columns
            if date.is_empty() && description.is_empty() && amount.is_empty() && category.is_empty()
            {
                continue;
            }

            out.push(LedgerRow {
                row_id: start + i + 1,
                date,
                description,
                amount,
                category,
                machine_pillar: get(4),
                integrity_filter: get(5),
                root_trigger: get(6),
                notes: get(7),
            });
        }
        Ok(out)
    }

    fn append(&self, entry: &NewEntry) -> Result<AppendOutcome> {
        let description = {
            let d = normalize_text(&entry.description);
            if d.is_empty() {
                "Unknown".to_string()
            } else {
                d
            }
        };
        let category = {
            let c = entry.category.trim();
            if c.is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                c.to_string()
            }
        };
        let date = normalize_date(&entry.date)
            .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());

        let month = monthly_sheet_name(&date);
        let created = self.ensure_sheet(&month)?;

        // A sheet created by this call can't contain the row yet
        if !created && self.is_duplicate(&month, &date, &entry.amount, &description)? {
            tracing::info!(%date, amount = %entry.amount, %description, "duplicate skipped");
            return Ok(AppendOutcome::Duplicate);
        }

        let path = self.sheet_path(&month);
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open sheet {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record([
            date.as_str(),
            description.as_str(),
            entry.amount.as_str(),
            category.as_str(),
            entry.machine_pillar.as_str(),
            entry.integrity_filter.as_str(),
            entry.root_trigger.as_str(),
            entry.notes.as_str(),
        ])?;
        writer.flush()?;

        tracing::info!(%date, amount = %entry.amount, %description, "ledger appended");
        Ok(AppendOutcome::Appended)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

    fn temp_store() -> WorkbookLedgerStore {
        let seq = DIR_SEQ.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "finance-proxy-ledger-{}-{}",
            std::process::id(),
            seq
        ));
        WorkbookLedgerStore::new(dir)
    }

    fn entry(date: &str, description: &str, amount: &str, category: &str) -> NewEntry {
        NewEntry {
            date: date.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
            machine_pillar: String::new(),
            integrity_filter: "Planned".to_string(),
            root_trigger: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_append_then_duplicate_skip() {
        let store = temp_store();
        let row = entry("2024-12-02", "ICA SUPERMARKET", "-452.30", "Groceries");

        assert_eq!(store.append(&row).unwrap(), AppendOutcome::Appended);
        assert_eq!(store.append(&row).unwrap(), AppendOutcome::Duplicate);

        let rows = store.list_month("2024-12").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "ICA SUPERMARKET");
    }

    #[test]
    fn test_rebatch_is_idempotent() {
        let store = temp_store();
        let batch = vec![
            entry("2024-12-02", "ICA SUPERMARKET", "-452.30", "Groceries"),
            entry("2024-12-03", "Netflix", "-99.00", "Subscriptions"),
        ];

        let first = store.append_batch(&batch).unwrap();
        assert_eq!(first.appended, 2);
        assert_eq!(first.duplicates, 0);

        // Re-running the same batch after a "partial failure" writes nothing
        let second = store.append_batch(&batch).unwrap();
        assert_eq!(second.appended, 0);
        assert_eq!(second.duplicates, 2);

        assert_eq!(store.list_month("2024-12").unwrap().len(), 2);
    }

    #[test]
    fn test_description_distinguishes_rows() {
        let store = temp_store();
        let a = entry("2024-12-02", "Coffee at Espresso House", "-45.00", "Dining");
        let b = entry("2024-12-02", "Coffee at Wayne's", "-45.00", "Dining");

        assert_eq!(store.append(&a).unwrap(), AppendOutcome::Appended);
        assert_eq!(store.append(&b).unwrap(), AppendOutcome::Appended);
        assert_eq!(store.list_month("2024-12").unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_check_normalizes_identity() {
        let store = temp_store();
        let first = entry("2024-12-02", "ICA  SUPERMARKET", "-452.30", "Groceries");
        let again = entry("02.12.2024", "ICA SUPERMARKET", "-452,30", "Groceries");

        assert_eq!(store.append(&first).unwrap(), AppendOutcome::Appended);
        assert_eq!(store.append(&again).unwrap(), AppendOutcome::Duplicate);
    }

    #[test]
    fn test_batch_order_preserved() {
        let store = temp_store();
        let batch = vec![
            entry("2024-12-05", "First", "-1.00", "Fees"),
            entry("2024-12-05", "Second", "-2.00", "Fees"),
            entry("2024-12-05", "Third", "-3.00", "Fees"),
        ];
        store.append_batch(&batch).unwrap();

        let rows = store.list_month("2024-12").unwrap();
        let order: Vec<&str> = rows.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(order, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_months_get_separate_sheets() {
        let store = temp_store();
        store.append(&entry("2024-11-30", "Rent", "-9500.00", "Housing")).unwrap();
        store.append(&entry("2024-12-01", "Rent", "-9500.00", "Housing")).unwrap();

        assert_eq!(store.list_month("2024-11").unwrap().len(), 1);
        assert_eq!(store.list_month("2024-12").unwrap().len(), 1);
    }

    #[test]
    fn test_list_missing_month_is_empty() {
        let store = temp_store();
        assert!(store.list_month("2019-01").unwrap().is_empty());
    }

    #[test]
    fn test_sheet_has_header_row() {
        let store = temp_store();
        store.append(&entry("2024-12-02", "Rent", "-9500.00", "Housing")).unwrap();

        let raw = std::fs::read_to_string(store.dir().join("2024-12.csv")).unwrap();
        let first_line = raw.lines().next().unwrap();
        assert!(first_line.starts_with("Date,Description,Amount,Category"));
    }

    #[test]
    fn test_blank_category_defaults_uncategorized() {
        let store = temp_store();
        store.append(&entry("2024-12-02", "Mystery", "-5.00", "")).unwrap();
        let rows = store.list_month("2024-12").unwrap();
        assert_eq!(rows[0].category, "Uncategorized");
    }

    #[test]
    fn test_monthly_sheet_name() {
        assert_eq!(monthly_sheet_name("2024-12-02"), "2024-12");
        assert_eq!(monthly_sheet_name("02.12.2024"), "2024-12");
        // Unparseable falls back to the current month
        let now = Utc::now().format("%Y-%m").to_string();
        assert_eq!(monthly_sheet_name("garbage"), now);
    }
}
