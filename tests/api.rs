// HTTP surface tests: drive the router in-process with tower's oneshot
#![cfg(feature = "server")]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use finance_tracker::api::{api_routes, AppState};
use finance_tracker::setup_database;
use rusqlite::Connection;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app(today: NaiveDate) -> Router {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    let state = AppState::new(conn).with_today(today);
    Router::new().nest("/api", api_routes()).with_state(state)
}

fn default_app() -> Router {
    test_app(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, uri: &str, body: Value) -> i64 {
    let (status, value) = send(app, Method::POST, uri, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", value);
    value["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = default_app();
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "OK");
}

#[tokio::test]
async fn test_create_then_list_account() {
    let app = default_app();
    let id = create(
        &app,
        "/api/accounts",
        json!({"name": "Checking", "type": "bank", "initial_balance": "250.5"}),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/accounts", None).await;
    assert_eq!(status, StatusCode::OK);
    let accounts = body.as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["id"], id);
    assert_eq!(accounts[0]["type"], "bank");
    assert_eq!(accounts[0]["initial_balance"], 250.5);
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let app = default_app();
    let (status, body) = send(&app, Method::POST, "/api/expenses", Some(json!({"description": "Lunch"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing required fields: amount, category_id, account_id, date"
    );
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = default_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/accounts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_method_advertises_allow() {
    let app = default_app();
    let request = Request::builder()
        .method(Method::PATCH)
        .uri("/api/accounts")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        response.headers().get(header::ALLOW).unwrap(),
        "GET, POST, PUT, DELETE"
    );

    let (status, body) = send(&app, Method::POST, "/api/reports/dashboard", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], "Method POST Not Allowed");
}

#[tokio::test]
async fn test_update_requires_id() {
    let app = default_app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/categories",
        Some(json!({"name": "Food", "kind": "expense"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required query parameter: id");
}

#[tokio::test]
async fn test_categories_filtered_by_kind() {
    let app = default_app();
    create(&app, "/api/categories", json!({"name": "Salary", "kind": "income"})).await;
    create(&app, "/api/categories", json!({"name": "Food", "kind": "expense"})).await;

    let (status, body) = send(&app, Method::GET, "/api/categories?kind=income", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Salary"]);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let app = default_app();
    let id = create(
        &app,
        "/api/income",
        json!({"description": "Salary", "amount": 1000, "category_id": 1, "account_id": 1, "date": "2025-03-01"}),
    )
    .await;

    let uri = format!("/api/income?id={}", id);
    let (first, _) = send(&app, Method::DELETE, &uri, None).await;
    let (second, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/income", None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_transaction() {
    let app = default_app();
    let id = create(
        &app,
        "/api/expenses",
        json!({"description": "Rent", "amount": 800, "category_id": 1, "account_id": 1, "date": "2025-03-05"}),
    )
    .await;

    let (status, body) = send(&app, Method::POST, &format!("/api/expenses/duplicate?id={}", id), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(body["id"].as_i64().unwrap(), id);

    let (_, list) = send(&app, Method::GET, "/api/expenses", None).await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::POST, "/api/expenses/duplicate?id=999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_statement_requires_both_dates() {
    let app = default_app();
    let (status, body) = send(&app, Method::GET, "/api/reports/statement?startDate=2025-03-01", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "startDate and endDate are required");
}

#[tokio::test]
async fn test_statement_merges_income_and_expenses() {
    let app = default_app();
    create(
        &app,
        "/api/income",
        json!({"description": "Salary", "amount": 1000, "category_id": 1, "account_id": 1, "date": "2025-03-01"}),
    )
    .await;
    create(
        &app,
        "/api/expenses",
        json!({"description": "Groceries", "amount": 50, "category_id": 2, "account_id": 1, "date": "2025-03-10"}),
    )
    .await;
    create(
        &app,
        "/api/expenses",
        json!({"description": "Old", "amount": 5, "category_id": 2, "account_id": 1, "date": "2025-01-10"}),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/reports/statement?startDate=2025-03-01&endDate=2025-03-31",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["description"], "Groceries");
    assert_eq!(rows[0]["kind"], "expense");
    assert_eq!(rows[1]["kind"], "income");
}

#[tokio::test]
async fn test_dashboard_uses_pinned_today() {
    let app = default_app();
    let account_id = create(
        &app,
        "/api/accounts",
        json!({"name": "Wallet", "type": "cash", "initial_balance": 100}),
    )
    .await;
    create(
        &app,
        "/api/income",
        json!({"description": "Salary", "amount": 1000, "category_id": 1, "account_id": account_id, "date": "2025-03-01"}),
    )
    .await;
    create(
        &app,
        "/api/expenses",
        json!({"description": "Dinner", "amount": 40, "category_id": 2, "account_id": account_id, "date": "2025-02-20"}),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/reports/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_balance"], 1060.0);
    assert_eq!(body["month_income"], 1000.0);
    assert_eq!(body["month_expense"], 0.0);
    assert_eq!(body["last_expense"]["description"], "Dinner");
    assert_eq!(body["expense_series"]["points"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_invalid_month_rejected() {
    let app = default_app();
    let (status, _) = send(&app, Method::GET, "/api/reports/monthly?month=13", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_account() {
    let app = default_app();
    let id = create(
        &app,
        "/api/accounts",
        json!({"name": "Savings", "type": "bank", "initial_balance": 300}),
    )
    .await;

    let (status, body) = send(&app, Method::POST, &format!("/api/accounts/duplicate?id={}", id), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(body["id"].as_i64().unwrap(), id);

    let (_, list) = send(&app, Method::GET, "/api/accounts", None).await;
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Savings", "Savings (Copy)"]);

    let (status, _) = send(&app, Method::POST, "/api/accounts/duplicate?id=999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, &format!("/api/accounts/duplicate?id={}", id), None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

fn app_with_state() -> (Router, AppState) {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    let state = AppState::new(conn);
    let app = Router::new().nest("/api", api_routes()).with_state(state.clone());
    (app, state)
}

#[tokio::test]
async fn test_storage_failure_returns_500_with_message() {
    let (app, state) = app_with_state();
    state
        .db
        .lock()
        .unwrap()
        .execute_batch("DROP TABLE expenses")
        .unwrap();

    let (status, body) = send(&app, Method::GET, "/api/expenses", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("no such table: expenses"));
}

#[tokio::test]
async fn test_poisoned_connection_returns_500() {
    let (app, state) = app_with_state();
    let db = state.db.clone();
    let _ = std::thread::spawn(move || {
        let _guard = db.lock().unwrap();
        panic!("holder panicked");
    })
    .join();
    assert!(state.db.is_poisoned());

    let (status, body) = send(&app, Method::GET, "/api/accounts", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "database connection is unavailable");
}

#[tokio::test]
async fn test_index_page_served() {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    let app = finance_tracker::api::app(AppState::new(conn), std::path::Path::new("web"));

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("/static/app.js"));
    assert!(html.contains(r#"id="page-reports""#));
    assert!(!html.contains("<dialog"));
}
