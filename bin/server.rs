// Finance Proxy - Web Server
// REST API with Axum: statement preview/commit, categories, audit
// summary, and the chat bridge to the hosted reasoning engine.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use finance_proxy::{
    derive_pillar, normalize_category, parse_statement, suggest, summarize, LedgerStore,
    PreviewTransaction, ProxyConfig, ReasoningClient, StatementMetadata, SuggestionMode,
    WorkbookLedgerStore, FIXED_CATEGORIES, INTEGRITY_FILTERS, MACHINE_PILLARS, ROOT_TRIGGERS,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<WorkbookLedgerStore>,
    client: Arc<ReasoningClient>,
    config: Arc<ProxyConfig>,
}

/// Error body in the shape the frontend expects: `{"detail": "..."}`
fn error_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Deserialize)]
struct PreviewParams {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct PreviewResponse {
    batch_id: String,
    file_hash: String,
    metadata: StatementMetadata,
    transactions: Vec<PreviewTransaction>,
    truncated: bool,
    needs_review_count: usize,
    total_transactions: usize,
}

/// One reviewed row as the client sends it back for commit.
#[derive(Deserialize)]
struct TransactionApproval {
    date: String,
    description: String,
    amount: f64,

    #[serde(default)]
    category_approved: Option<String>,
    #[serde(default)]
    category_suggested: Option<String>,

    #[serde(default)]
    machine_pillar: Option<String>,
    #[serde(default)]
    integrity_filter: Option<String>,
    #[serde(default)]
    root_trigger: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Deserialize)]
struct CommitRequest {
    #[serde(default)]
    transactions: Vec<TransactionApproval>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// POST /chat - Forward one message to the reasoning engine
async fn chat(State(state): State<AppState>, Json(payload): Json<ChatRequest>) -> Response {
    let message = payload.message.trim();
    if message.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message cannot be empty");
    }

    // Upstream failures degrade to the fallback reply inside chat()
    let reply = state.client.chat(message).await;
    Json(ChatResponse { reply }).into_response()
}

/// GET /categories - Fixed taxonomy lists
async fn list_categories() -> impl IntoResponse {
    Json(json!({
        "categories": FIXED_CATEGORIES,
        "machine_pillars": MACHINE_PILLARS,
        "integrity_filters": INTEGRITY_FILTERS,
        "root_triggers": ROOT_TRIGGERS,
    }))
}

/// GET /audit/summary - Aggregate the current month's ledger
async fn audit_summary(State(state): State<AppState>) -> Response {
    let month = Utc::now().format("%Y-%m").to_string();
    match state.store.list_month(&month) {
        Ok(rows) => Json(summarize(&rows)).into_response(),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "failed to fetch ledger data");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch ledger data")
        }
    }
}

/// POST /ingest/preview - Parse an uploaded statement into review rows
async fn ingest_preview(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
    mut multipart: Multipart,
) -> Response {
    let mut filename = String::new();
    let mut content_type = String::new();
    let mut data: Option<Vec<u8>> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let is_file = field.name() == Some("file") || field.file_name().is_some();
                if !is_file {
                    continue;
                }
                filename = field.file_name().unwrap_or_default().to_string();
                content_type = field.content_type().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        data = Some(bytes.to_vec());
                        break;
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "failed to read upload");
                        return error_response(StatusCode::BAD_REQUEST, "Failed to read uploaded file");
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "malformed multipart body");
                return error_response(StatusCode::BAD_REQUEST, "Malformed multipart body");
            }
        }
    }

    let data = match data {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return error_response(StatusCode::BAD_REQUEST, "Uploaded file is empty"),
    };

    let mut preview = match parse_statement(&data, &filename, &content_type) {
        Ok(preview) => preview,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "failed to parse statement");
            return error_response(StatusCode::BAD_REQUEST, "Failed to parse statement file");
        }
    };

    if state.config.suggestion_mode == SuggestionMode::Model {
        suggest::apply_model_suggestions(&state.client, &mut preview.transactions).await;
    }

    let total_transactions = preview.transactions.len();
    let limit = params.limit.unwrap_or(500).clamp(1, 5000);
    let truncated = total_transactions > limit;
    if truncated {
        preview.transactions.truncate(limit);
    }
    let needs_review_count = preview.transactions.iter().filter(|t| t.needs_review).count();

    Json(PreviewResponse {
        batch_id: preview.batch_id,
        file_hash: preview.file_hash,
        metadata: preview.metadata,
        transactions: preview.transactions,
        truncated,
        needs_review_count,
        total_transactions,
    })
    .into_response()
}

/// POST /ingest/commit - Row-wise idempotent append to the ledger
async fn ingest_commit(State(state): State<AppState>, Json(payload): Json<CommitRequest>) -> Response {
    if payload.transactions.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No transactions provided");
    }

    let entries: Vec<finance_proxy::NewEntry> = payload
        .transactions
        .into_iter()
        .map(|item| {
            let category = normalize_category(
                item.category_approved
                    .as_deref()
                    .or(item.category_suggested.as_deref()),
            );
            let machine_pillar = item
                .machine_pillar
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| derive_pillar(&category).to_string());
            finance_proxy::NewEntry {
                date: item.date,
                description: item.description,
                amount: format!("{:.2}", item.amount),
                category,
                machine_pillar,
                integrity_filter: item.integrity_filter.unwrap_or_default(),
                root_trigger: item.root_trigger.unwrap_or_default(),
                notes: item.notes.unwrap_or_default(),
            }
        })
        .collect();

    match state.store.append_batch(&entries) {
        Ok(report) => Json(json!({
            "appended": report.appended,
            "duplicates": report.duplicates,
        }))
        .into_response(),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "commit failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to write transactions to ledger",
            )
        }
    }
}

/// Request log middleware
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;
    tracing::info!(%method, %uri, status = %response.status().as_u16(), "request");
    response
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    println!("🌐 Finance Proxy - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Arc::new(ProxyConfig::from_env());

    if let Err(err) = std::fs::create_dir_all(&config.ledger_dir) {
        eprintln!("❌ Could not create ledger dir {:?}: {err}", config.ledger_dir);
        std::process::exit(1);
    }
    println!("✓ Ledger workbook: {:?}", config.ledger_dir);

    if config.engine_url.is_none() {
        println!("⚠ REASONING_ENGINE_URL not set - chat will answer with the fallback reply");
    }

    let state = AppState {
        store: Arc::new(WorkbookLedgerStore::new(&config.ledger_dir)),
        client: Arc::new(ReasoningClient::new(
            config.engine_url.clone(),
            config.engine_key.clone(),
        )),
        config: config.clone(),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .route("/categories", get(list_categories))
        .route("/audit/summary", get(audit_summary))
        .route("/ingest/preview", post(ingest_preview))
        .route("/ingest/commit", post(ingest_commit))
        .with_state(state)
        .layer(middleware::from_fn(log_requests))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(CorsLayer::permissive());

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://{addr}");
    println!("   Preview: POST http://{addr}/ingest/preview");
    println!("   Chat:    POST http://{addr}/chat");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
