// 📥 Statement Ingest - Uploaded file → normalized preview rows
// CSV statements (Swedbank-style exports) are parsed and normalized here.
// Nothing is persisted: the output is a preview the client reviews and
// later commits through the ledger.

use anyhow::{bail, Result};
use chrono::Utc;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::normalize::{normalize_amount, normalize_date, normalize_merchant, normalize_text, parse_amount};
use crate::suggest;

// ============================================================================
// FILE TYPE DETECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
    Pdf,
}

/// Detect the upload type from filename, then content type. CSV is the
/// default when neither says otherwise.
pub fn detect_kind(filename: &str, content_type: &str) -> FileKind {
    let lower = filename.to_lowercase();
    if lower.ends_with(".csv") {
        return FileKind::Csv;
    }
    if lower.ends_with(".xlsx") || lower.ends_with(".xlsm") {
        return FileKind::Xlsx;
    }
    if lower.ends_with(".pdf") {
        return FileKind::Pdf;
    }
    let ct = content_type.to_lowercase();
    if ct.contains("csv") {
        return FileKind::Csv;
    }
    if ct.contains("spreadsheet") {
        return FileKind::Xlsx;
    }
    if ct.contains("pdf") {
        return FileKind::Pdf;
    }
    FileKind::Csv
}

// ============================================================================
// STATEMENT METADATA
// ============================================================================

/// Header lines some exports carry above the transaction table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_holder: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_period: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

fn capture(text: &str, pattern: &str) -> Option<String> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().trim_end_matches('.').to_string())
}

/// Scrape account metadata out of the raw statement text.
pub fn extract_metadata(text: &str) -> StatementMetadata {
    StatementMetadata {
        account_holder: capture(text, r"Account Holder:\s*(.+)"),
        account_type: capture(text, r"Account Type:\s*(.+)"),
        account_number: capture(text, r"Account Number:\s*(.+)"),
        reporting_period: capture(text, r"Reporting Period:\s*(.+)"),
        currency: capture(text, r"Currency:\s*([A-Za-z]{3})").map(|c| c.to_uppercase()),
    }
}

// ============================================================================
// CSV PARSING
// ============================================================================

/// One row as read from the file, before normalization.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub source_row: usize,
}

/// Column positions found by header detection.
#[derive(Debug, Clone, Default)]
struct ColumnMap {
    date: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
    currency: Option<usize>,
}

impl ColumnMap {
    fn is_complete(&self) -> bool {
        self.date.is_some() && self.description.is_some() && self.amount.is_some()
    }
}

/// Swedbank export header aliases, matched case-insensitively.
const HEADER_ALIASES: &[(&str, &[&str])] = &[
    ("date", &["bokföringsdag", "transaktionsdag", "date"]),
    ("description", &["beskrivning", "description"]),
    ("amount", &["belopp", "amount"]),
    ("currency", &["valuta", "currency"]),
];

fn map_headers(cells: &[String]) -> ColumnMap {
    let mut mapping = ColumnMap::default();
    for (idx, cell) in cells.iter().enumerate() {
        let header = normalize_text(cell).to_lowercase();
        for (key, aliases) in HEADER_ALIASES {
            if aliases.contains(&header.as_str()) {
                match *key {
                    "date" => mapping.date.get_or_insert(idx),
                    "description" => mapping.description.get_or_insert(idx),
                    "amount" => mapping.amount.get_or_insert(idx),
                    "currency" => mapping.currency.get_or_insert(idx),
                    _ => continue,
                };
            }
        }
    }
    mapping
}

/// Scan the first rows for the header line. Returns the header row index
/// and its column map, or (0, empty) when no header is recognized.
fn find_header(rows: &[Vec<String>]) -> (usize, ColumnMap) {
    for (idx, row) in rows.iter().take(20).enumerate() {
        let mapping = map_headers(row);
        if mapping.is_complete() {
            tracing::info!(row = idx, "statement header found");
            return (idx, mapping);
        }
    }
    tracing::warn!("no statement header row found, assuming positional columns");
    (0, ColumnMap::default())
}

/// Pick the delimiter that dominates the first lines. Metadata preambles
/// often carry no delimiter at all, so a first-line-only sniff is not enough.
fn sniff_delimiter(text: &str) -> u8 {
    let mut commas = 0;
    let mut semicolons = 0;
    let mut tabs = 0;
    for line in text.lines().take(10) {
        commas += line.matches(',').count();
        semicolons += line.matches(';').count();
        tabs += line.matches('\t').count();
    }
    if semicolons > commas && semicolons > tabs {
        b';'
    } else if tabs > commas && tabs > semicolons {
        b'\t'
    } else {
        b','
    }
}

fn cell(row: &[String], idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| row.get(i))
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
}

/// Parse CSV bytes into raw rows plus scraped metadata.
pub fn parse_csv(data: &[u8]) -> Result<(Vec<RawRow>, StatementMetadata)> {
    let text = String::from_utf8_lossy(data);
    let text = text.trim_start_matches('\u{feff}');

    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        if cells.iter().any(|c| !c.trim().is_empty()) {
            rows.push(cells);
        }
    }
    if rows.is_empty() {
        return Ok((Vec::new(), extract_metadata(text)));
    }

    let (header_idx, mapping) = find_header(&rows);
    let start_idx = if mapping.is_complete() { header_idx + 1 } else { header_idx };

    let mut raw = Vec::new();
    for (idx, row) in rows.iter().enumerate().skip(start_idx) {
        let (date, description, amount, currency) = if mapping.is_complete() {
            (
                cell(row, mapping.date),
                cell(row, mapping.description),
                cell(row, mapping.amount),
                cell(row, mapping.currency),
            )
        } else {
            // Positional fallback: date, description, amount, currency
            (
                cell(row, Some(0)),
                cell(row, Some(1)),
                cell(row, Some(2)),
                cell(row, Some(3)),
            )
        };
        raw.push(RawRow {
            date,
            description,
            amount,
            currency,
            source_row: idx + 1,
        });
    }

    Ok((raw, extract_metadata(text)))
}

// ============================================================================
// PREVIEW OUTPUT
// ============================================================================

/// One normalized transaction in an ingest preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewTransaction {
    pub date: String,
    pub description: String,
    /// Canonical amount string, two decimals, sign preserved
    pub amount: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    pub merchant_raw: String,
    pub merchant_normalized: String,

    pub category_suggested: String,
    pub machine_pillar: String,
    pub integrity_filter: String,
    pub root_trigger: String,
    pub notes: String,

    pub needs_review: bool,
    pub source_row: usize,
}

/// Full preview for one uploaded statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementPreview {
    pub batch_id: String,
    pub file_hash: String,
    pub metadata: StatementMetadata,
    pub transactions: Vec<PreviewTransaction>,
}

/// Parse an uploaded statement into a normalized, categorized preview.
///
/// Rows with an unparseable date or amount are dropped with a warning;
/// partial statements are better than rejected ones. Only CSV is wired up;
/// Excel and PDF uploads are rejected with a clear error.
pub fn parse_statement(data: &[u8], filename: &str, content_type: &str) -> Result<StatementPreview> {
    let kind = detect_kind(filename, content_type);
    tracing::info!(filename, content_type, ?kind, "parsing statement");

    if kind != FileKind::Csv {
        bail!("Only CSV statements are supported (got {:?})", kind);
    }

    let (raw_rows, metadata) = parse_csv(data)?;
    tracing::info!(rows = raw_rows.len(), "raw transactions extracted");

    let file_hash = format!("{:x}", Sha256::digest(data));
    let batch_id = format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S"), &file_hash[..8]);
    let statement_currency = metadata.currency.clone();

    let mut transactions = Vec::new();
    for row in &raw_rows {
        let date = match row.date.as_deref().and_then(normalize_date) {
            Some(d) => d,
            None => {
                tracing::warn!(source_row = row.source_row, raw = ?row.date, "dropping row: invalid date");
                continue;
            }
        };
        let amount = match row.amount.as_deref().and_then(normalize_amount) {
            Some(a) => a,
            None => {
                tracing::warn!(source_row = row.source_row, raw = ?row.amount, "dropping row: invalid amount");
                continue;
            }
        };

        let description = row
            .description
            .as_deref()
            .map(normalize_text)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let suggestion = suggest::suggest(&description, parse_amount(&amount));

        transactions.push(PreviewTransaction {
            date,
            description: description.clone(),
            amount,
            currency: row.currency.clone().or_else(|| statement_currency.clone()),
            merchant_raw: description.clone(),
            merchant_normalized: normalize_merchant(&description),
            category_suggested: suggestion.category,
            machine_pillar: suggestion.machine_pillar,
            integrity_filter: "Planned".to_string(),
            root_trigger: String::new(),
            notes: String::new(),
            needs_review: suggestion.needs_review,
            source_row: row.source_row,
        });
    }

    tracing::info!(normalized = transactions.len(), "statement normalized");

    Ok(StatementPreview {
        batch_id,
        file_hash,
        metadata,
        transactions,
    })
}

// ============================================================================
// TESTS
// ============================================================================
