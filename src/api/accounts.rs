// /api/accounts handlers

use super::{json_body, AppState, IdQuery, MessageResponse};
use crate::entities::account::{self, Account, AccountInput};
use crate::error::Result;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Json, Query, State},
    http::StatusCode,
};

/// GET /api/accounts - All accounts ordered by name
pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>> {
    let accounts = state.run(account::get_all_accounts)?;
    tracing::debug!(count = accounts.len(), "listed accounts");
    Ok(Json(accounts))
}

/// POST /api/accounts
pub async fn create_account(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AccountInput>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let new_account = json_body(payload)?.validate()?;
    let id = state.run(|conn| account::insert_account(conn, &new_account))?;

    tracing::info!(id, name = %new_account.name, "account created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created("Account created", id)),
    ))
}

/// PUT /api/accounts?id=<id>
pub async fn update_account(
    State(state): State<AppState>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
    payload: std::result::Result<Json<AccountInput>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let id = IdQuery::require(query)?;
    let fields = json_body(payload)?.validate()?;
    let changed = state.run(|conn| account::update_account(conn, id, &fields))?;

    tracing::info!(id, changed, "account updated");
    Ok(Json(MessageResponse::new("Account updated")))
}

/// DELETE /api/accounts?id=<id> - Idempotent; referencing income/expenses are kept
pub async fn delete_account(
    State(state): State<AppState>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>> {
    let id = IdQuery::require(query)?;
    let removed = state.run(|conn| account::delete_account(conn, id))?;

    tracing::info!(id, removed, "account deleted");
    Ok(Json(MessageResponse::new("Account deleted")))
}

/// POST /api/accounts/duplicate?id=<id> - Copy an account under a "(Copy)" name
pub async fn duplicate_account(
    State(state): State<AppState>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let source_id = IdQuery::require(query)?;
    let id = state.run(|conn| account::duplicate_account(conn, source_id))?;

    tracing::info!(source_id, id, "account duplicated");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created("Account duplicated", id)),
    ))
}
