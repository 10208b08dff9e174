// REST API with Axum
//
// JSON endpoints under /api plus the static web dashboard at /.
// Every handler locks the shared connection for exactly one service call.

pub mod accounts;
pub mod categories;
pub mod reports;
pub mod transactions;

use crate::db::{self, SharedConnection};
use crate::entities::TransactionKind;
use crate::error::{Result, TrackerError};
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Json, Query},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, MethodRouter},
    Extension, Router,
};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: SharedConnection,

    /// Fixed "today" for report windows; None means the local clock
    pub pinned_today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        AppState {
            db: db::share(conn),
            pinned_today: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.pinned_today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.pinned_today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Run one service call against the shared connection
    pub fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        db::with_connection(&self.db, op)
    }
}

// ============================================================================
// Responses & errors
// ============================================================================

/// Body of every write response and every error
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
            id: None,
        }
    }

    pub fn created(message: impl Into<String>, id: i64) -> Self {
        MessageResponse {
            message: message.into(),
            id: Some(id),
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = match &self {
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::NotFound { .. } => StatusCode::NOT_FOUND,
            TrackerError::Storage(_) | TrackerError::LockPoisoned => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "storage failure");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        (status, Json(MessageResponse::new(self.to_string()))).into_response()
    }
}

/// Unwrap a JSON body, turning extractor rejections into validation errors
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| TrackerError::validation(rejection.body_text()))
}

pub(crate) fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| TrackerError::validation(rejection.body_text()))
}

/// `?id=<id>` on PUT / DELETE / duplicate
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<i64>,
}

impl IdQuery {
    pub fn require(query: std::result::Result<Query<IdQuery>, QueryRejection>) -> Result<i64> {
        query_params(query)?
            .id
            .ok_or_else(|| TrackerError::validation("Missing required query parameter: id"))
    }
}

/// Parse an optional `YYYY-MM-DD` query value
pub(crate) fn optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| crate::entities::parse_date(field, v))
        .transpose()
}

/// 405 handler advertising the verbs a resource supports
fn method_not_allowed(allow: &'static str) -> MethodRouter<AppState> {
    MethodRouter::new().fallback(move |method: axum::http::Method| async move {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, allow)],
            Json(MessageResponse::new(format!("Method {} Not Allowed", method))),
        )
    })
}

const CRUD_VERBS: &str = "GET, POST, PUT, DELETE";
const READ_ONLY: &str = "GET";
const POST_ONLY: &str = "POST";

// ============================================================================
// Router
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(MessageResponse::new("OK"))
}

/// GET / - Serve the web dashboard
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../../web/index.html"))
}

fn transaction_routes(kind: TransactionKind) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            method_not_allowed(CRUD_VERBS)
                .get(transactions::list_transactions)
                .post(transactions::create_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/duplicate",
            method_not_allowed(POST_ONLY).post(transactions::duplicate_transaction),
        )
        .layer(Extension(kind))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", method_not_allowed(READ_ONLY).get(health_check))
        .route(
            "/accounts",
            method_not_allowed(CRUD_VERBS)
                .get(accounts::list_accounts)
                .post(accounts::create_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route(
            "/accounts/duplicate",
            method_not_allowed(POST_ONLY).post(accounts::duplicate_account),
        )
        .route(
            "/categories",
            method_not_allowed(CRUD_VERBS)
                .get(categories::list_categories)
                .post(categories::create_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .nest("/income", transaction_routes(TransactionKind::Income))
        .nest("/expenses", transaction_routes(TransactionKind::Expense))
        .nest("/reports", reports::routes())
}

/// Full application: API, dashboard page and static assets
pub fn app(state: AppState, web_dir: &Path) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes())
        .nest_service("/static", ServeDir::new(web_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
