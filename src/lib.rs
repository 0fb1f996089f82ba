// Finance Proxy - Core Library
// Statement ingest, category suggestion, ledger append, audit summary,
// and the chat bridge. Shared by the CLI and the API server.

pub mod agent;
pub mod audit;
pub mod categories;
pub mod config;
pub mod ingest;
pub mod ledger;
pub mod normalize;
pub mod suggest;

// Re-export commonly used types
pub use agent::{ReasoningClient, FALLBACK_REPLY};
pub use audit::{summarize, AuditSection, AuditSummary};
pub use categories::{
    derive_pillar, match_fixed_category, normalize_category, FIXED_CATEGORIES, INTEGRITY_FILTERS,
    MACHINE_PILLARS, ROOT_TRIGGERS, UNCATEGORIZED,
};
pub use config::ProxyConfig;
pub use ingest::{parse_statement, PreviewTransaction, StatementMetadata, StatementPreview};
pub use ledger::{
    monthly_sheet_name, AppendOutcome, BatchReport, LedgerRow, LedgerStore, NewEntry,
    WorkbookLedgerStore, LEDGER_HEADERS,
};
pub use suggest::{suggest_heuristic, SuggestionMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
