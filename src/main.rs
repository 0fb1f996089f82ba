// Finance Proxy - Operator CLI
// Parse a statement locally, or push it straight into the ledger without
// going through the HTTP server.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::Path;

use finance_proxy::{
    normalize_category, parse_statement, LedgerStore, NewEntry, ProxyConfig, WorkbookLedgerStore,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("preview"), Some(path)) => run_preview(Path::new(path)),
        (Some("commit"), Some(path)) => run_commit(Path::new(path)),
        _ => {
            eprintln!("Usage: finance-proxy <preview|commit> <statement.csv>");
            std::process::exit(2);
        }
    }
}

fn load_statement(path: &Path) -> Result<finance_proxy::StatementPreview> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if data.is_empty() {
        bail!("{} is empty", path.display());
    }
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("statement.csv");
    parse_statement(&data, filename, "")
}

fn run_preview(path: &Path) -> Result<()> {
    let preview = load_statement(path)?;
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}

fn run_commit(path: &Path) -> Result<()> {
    println!("📥 Committing statement to ledger");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let preview = load_statement(path)?;
    println!("✓ Parsed {} transactions from {}", preview.transactions.len(), path.display());

    let needs_review = preview.transactions.iter().filter(|t| t.needs_review).count();
    if needs_review > 0 {
        println!("⚠ {needs_review} rows are Uncategorized (committed as-is, review later)");
    }

    let entries: Vec<NewEntry> = preview
        .transactions
        .iter()
        .map(|t| NewEntry {
            date: t.date.clone(),
            description: t.description.clone(),
            amount: t.amount.clone(),
            category: normalize_category(Some(&t.category_suggested)),
            machine_pillar: t.machine_pillar.clone(),
            integrity_filter: t.integrity_filter.clone(),
            root_trigger: t.root_trigger.clone(),
            notes: t.notes.clone(),
        })
        .collect();

    let config = ProxyConfig::from_env();
    let store = WorkbookLedgerStore::new(&config.ledger_dir);
    let report = store.append_batch(&entries)?;

    println!("\n✓ Appended {} rows, skipped {} duplicates", report.appended, report.duplicates);
    println!("✓ Ledger workbook: {:?}", config.ledger_dir);
    Ok(())
}
