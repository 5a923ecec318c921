//! Review panel HTTP server.
//!
//! Exposes the review session over a JSON API suitable for a browser-hosted
//! panel. One server instance carries one reviewer session: the session
//! state machine is synchronous and single-actor, so all mutation is
//! serialized through a single lock.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/catalog` | All expanded document records |
//! | `GET`  | `/session` | Current selection, versions, pairs, status |
//! | `POST` | `/session/batch` | Activate a batch |
//! | `POST` | `/session/doc-type` | Switch the document type |
//! | `POST` | `/session/comparison` | Choose a version pair |
//! | `POST` | `/session/review` | Save a decision; appends an audit entry |
//! | `GET`  | `/documents/{doc_type}/{batch}/{version}/view` | Inline HTML view |
//! | `GET`  | `/audit/export` | CSV export; persists to storage as a side effect |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "unknown batch: 'B999'" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `access_error` (502),
//! `internal` (500). Validation failures never mutate session state; a
//! failed render for one document degrades to an inline placeholder rather
//! than an error response.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! panels served from elsewhere.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::audit;
use crate::catalog;
use crate::config::Config;
use crate::error::Error;
use crate::models::{
    AuditEntry, ComparisonSelection, Decision, DocType, DocumentRecord, ReviewStatus,
};
use crate::session::ReviewSession;
use crate::storage::{MemoryStore, ObjectStore, S3Store};
use crate::viewer::{self, EmbedStrategy};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    session: Arc<RwLock<ReviewSession>>,
    store: Arc<dyn ObjectStore>,
    strategies: Arc<Vec<Box<dyn EmbedStrategy>>>,
}

/// Start the review panel server.
///
/// Loads the catalog (fatal on error — no partial catalog is served),
/// constructs the session with its default selections, and binds to the
/// address configured in `[server].bind`. Without a `[storage]` section the
/// panel runs against an in-memory store, which is only useful for trials.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let records = catalog::load_catalog(config)?;
    let session = ReviewSession::new(records);

    let store: Arc<dyn ObjectStore> = match &config.storage {
        Some(storage) => Arc::new(S3Store::from_env(storage.clone())?),
        None => {
            tracing::warn!("no [storage] configured; using an in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    let strategies = Arc::new(viewer::build_strategies(
        &config.viewer.strategies,
        config.viewer.url_ttl_secs,
    ));

    let state = AppState {
        session: Arc::new(RwLock::new(session)),
        store,
        strategies,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/catalog", get(handle_catalog))
        .route("/session", get(handle_session))
        .route("/session/batch", post(handle_select_batch))
        .route("/session/doc-type", post(handle_select_doc_type))
        .route("/session/comparison", post(handle_select_comparison))
        .route("/session/review", post(handle_record_decision))
        .route(
            "/documents/{doc_type}/{batch}/{version}/view",
            get(handle_document_view),
        )
        .route("/audit/export", get(handle_audit_export))
        .layer(cors)
        .with_state(state);

    let bind_addr = config.server.bind.clone();
    println!("Review panel listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Access(_) => (StatusCode::BAD_GATEWAY, "access_error"),
            Error::DataSource { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /catalog ============

#[derive(Serialize)]
struct CatalogResponse {
    records: Vec<DocumentRecord>,
}

async fn handle_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let session = state.session.read().await;
    Json(CatalogResponse {
        records: session.catalog().to_vec(),
    })
}

// ============ GET /session and selection mutations ============

/// Snapshot of the session rendered for the panel.
#[derive(Serialize)]
struct SessionView {
    batches: Vec<String>,
    batch: Option<String>,
    doc_type: DocType,
    versions: Vec<u32>,
    pairs: Vec<(u32, u32)>,
    selection: Option<ComparisonSelection>,
    status: ReviewStatus,
    audit_entries: usize,
}

fn session_view(session: &ReviewSession) -> SessionView {
    let status = match session.active_batch() {
        Some(batch) => session.status(batch, session.active_doc_type()),
        None => ReviewStatus::NotReviewed,
    };
    SessionView {
        batches: session.batches(),
        batch: session.active_batch().map(str::to_string),
        doc_type: session.active_doc_type(),
        versions: session.available_versions(),
        pairs: session.comparison_pairs(),
        selection: session.selection().cloned(),
        status,
        audit_entries: session.entries().len(),
    }
}

async fn handle_session(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.session.read().await;
    Json(session_view(&session))
}

#[derive(Deserialize)]
struct SelectBatchRequest {
    batch: String,
}

async fn handle_select_batch(
    State(state): State<AppState>,
    Json(req): Json<SelectBatchRequest>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.write().await;
    session.select_batch(&req.batch)?;
    Ok(Json(session_view(&session)))
}

#[derive(Deserialize)]
struct SelectDocTypeRequest {
    doc_type: DocType,
}

async fn handle_select_doc_type(
    State(state): State<AppState>,
    Json(req): Json<SelectDocTypeRequest>,
) -> Json<SessionView> {
    let mut session = state.session.write().await;
    session.select_doc_type(req.doc_type);
    Json(session_view(&session))
}

#[derive(Deserialize)]
struct SelectComparisonRequest {
    version_a: u32,
    version_b: u32,
}

async fn handle_select_comparison(
    State(state): State<AppState>,
    Json(req): Json<SelectComparisonRequest>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.write().await;
    session.select_comparison(req.version_a, req.version_b)?;
    Ok(Json(session_view(&session)))
}

// ============ POST /session/review ============

#[derive(Deserialize)]
struct ReviewRequest {
    /// One of `Accept`, `Reject`, `Request More Information`. Defaults to
    /// `Accept` when unspecified.
    #[serde(default)]
    decision: Option<String>,
    #[serde(default)]
    notes: String,
}

async fn handle_record_decision(
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<AuditEntry>, AppError> {
    let decision = match req.decision.as_deref() {
        Some(raw) => Decision::from_str(raw)?,
        None => Decision::default(),
    };
    let mut session = state.session.write().await;
    let entry = session.record_decision(decision, &req.notes)?.clone();
    Ok(Json(entry))
}

// ============ GET /documents/{doc_type}/{batch}/{version}/view ============

async fn handle_document_view(
    State(state): State<AppState>,
    Path((doc_type, batch, version)): Path<(String, String, u32)>,
) -> Result<Response, AppError> {
    let doc_type = DocType::from_str(&doc_type)?;

    let storage_key = {
        let session = state.session.read().await;
        session
            .find_record(&batch, doc_type, version)
            .map(|r| r.storage_key.clone())
            .ok_or_else(|| {
                not_found(format!(
                    "no catalog entry for {}/{} version {}",
                    batch, doc_type, version
                ))
            })?
    };

    let view = viewer::render_with_fallback(&state.strategies, state.store.as_ref(), &storage_key).await;
    let strategy = view.strategy.clone().unwrap_or_else(|| "none".to_string());

    Ok(([("x-render-strategy", strategy)], Html(view.html)).into_response())
}

// ============ GET /audit/export ============

async fn handle_audit_export(State(state): State<AppState>) -> Response {
    let entries: Vec<AuditEntry> = {
        let session = state.session.read().await;
        session.entries().to_vec()
    };

    let csv = audit::export_and_persist(
        state.store.as_ref(),
        &entries,
        Utc::now().date_naive(),
    )
    .await;

    (
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    )
        .into_response()
}
