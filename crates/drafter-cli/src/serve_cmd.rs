use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;

use drafter_core::plan::{Complexity, Plan, generate};
use drafter_db::config::DbConfig;
use drafter_db::pool::ping;
use drafter_db::queries::documents;

/// Collection that `/api/ideas` reads and writes.
const IDEAS_COLLECTION: &str = "idea";

/// The diagnostics endpoint caps the reported collection list.
const MAX_REPORTED_COLLECTIONS: usize = 10;

/// The diagnostics endpoint truncates store error text to this many characters.
const MAX_ERROR_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    idea: String,
    #[serde(default = "default_industry")]
    industry: String,
    #[serde(default = "default_complexity")]
    complexity: String,
}

fn default_industry() -> String {
    "tech".to_string()
}

fn default_complexity() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ListIdeasParams {
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    pub backend: &'static str,
    pub store: String,
    pub database_url_set: bool,
    pub database_name_set: bool,
    pub collections: Vec<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/hello", get(api_hello))
        .route("/api/plan", post(draft_plan))
        .route("/api/ideas", post(create_idea).get(list_ideas))
        .route("/test", get(diagnostics))
        .layer(CorsLayer::permissive())
        .with_state(pool)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, bind: &str, port: u16) -> Result<()> {
    let app = build_router(pool);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("drafter serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("drafter serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello from the drafter backend!" }))
}

async fn api_hello() -> Json<Value> {
    Json(json!({ "message": "Hello from the backend API!" }))
}

/// Draft a plan. Pure computation; unknown complexity labels fall back to
/// medium, so this handler cannot fail.
async fn draft_plan(Json(req): Json<PlanRequest>) -> Json<Plan> {
    let complexity: Complexity = req.complexity.parse().unwrap_or_default();
    Json(generate(&req.idea, &req.industry, complexity))
}

async fn create_idea(
    State(pool): State<PgPool>,
    Json(idea): Json<Map<String, Value>>,
) -> Result<axum::response::Response, AppError> {
    let document = documents::insert_document(&pool, IDEAS_COLLECTION, &Value::Object(idea))
        .await
        .map_err(AppError::internal)?;

    Ok(Json(json!({ "id": document.id })).into_response())
}

async fn list_ideas(
    State(pool): State<PgPool>,
    Query(params): Query<ListIdeasParams>,
) -> Result<axum::response::Response, AppError> {
    // A negative limit reads as zero rows, not a store error.
    let docs = documents::list_documents(&pool, IDEAS_COLLECTION, params.limit.max(0))
        .await
        .map_err(AppError::internal)?;

    let ideas: Vec<Value> = docs.into_iter().map(|doc| scrub_payload(doc.payload)).collect();
    Ok(Json(ideas).into_response())
}

/// Report backend liveness, store reachability, and which database env vars
/// are set. Never fails; store errors are folded into the report.
async fn diagnostics(State(pool): State<PgPool>) -> Json<DiagnosticsResponse> {
    let (store, collections) = match ping(&pool).await {
        Ok(()) => match documents::list_collections(&pool).await {
            Ok(all) => {
                let collections: Vec<String> =
                    all.into_iter().take(MAX_REPORTED_COLLECTIONS).collect();
                ("connected".to_string(), collections)
            }
            Err(err) => (
                format!("connected, listing failed: {}", truncate_error(&err)),
                Vec::new(),
            ),
        },
        Err(err) => (format!("unreachable: {}", truncate_error(&err)), Vec::new()),
    };

    Json(DiagnosticsResponse {
        backend: "running",
        store,
        database_url_set: env_is_set(DbConfig::URL_ENV),
        database_name_set: env_is_set(DbConfig::NAME_ENV),
        collections,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Keys dropped from payloads on the way out. The store keeps its id and
/// timestamps in columns; a client-supplied copy of these keys is removed
/// so listed ideas match what was submitted.
const SCRUBBED_KEYS: [&str; 3] = ["_id", "created_at", "updated_at"];

fn scrub_payload(mut payload: Value) -> Value {
    if let Some(map) = payload.as_object_mut() {
        for key in SCRUBBED_KEYS {
            map.remove(key);
        }
    }
    payload
}

/// Set and non-empty. Values are never disclosed.
fn env_is_set(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| !v.is_empty())
}

/// First `MAX_ERROR_CHARS` characters of the full error chain.
fn truncate_error(err: &anyhow::Error) -> String {
    format!("{err:#}").chars().take(MAX_ERROR_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
